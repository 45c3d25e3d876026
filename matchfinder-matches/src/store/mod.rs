//! Persistence for matches and their participants.
//!
//! Every service operation runs inside [`MatchStore::transaction`]: the
//! closure's reads and writes commit together or not at all. Backends must
//! enforce `(match_id, user_id)` uniqueness themselves and report a
//! violation as a unique-violation database error.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{run_migrations, PgStore, MIGRATIONS};

use matchfinder_shared::clients::db::create_pool;
use matchfinder_shared::errors::AppResult;

use crate::config::{AppConfig, StorageBackend};
use crate::models::{Match, NewMatch, NewParticipant, Participant};

/// Operations available inside a transaction.
pub trait MatchTx {
    fn insert_match(&mut self, new_match: &NewMatch) -> AppResult<Match>;

    /// All matches by `(date, time, id)` ascending.
    fn list_matches(&mut self) -> AppResult<Vec<Match>>;

    /// Loads a match and holds it against concurrent writers until the
    /// transaction ends.
    fn lock_match(&mut self, match_id: i64) -> AppResult<Option<Match>>;

    fn find_participant(&mut self, match_id: i64, user_id: &str) -> AppResult<Option<Participant>>;

    /// Participants of one match in join order.
    fn list_participants(&mut self, parent: &Match) -> AppResult<Vec<Participant>>;

    fn insert_participant(&mut self, new_participant: &NewParticipant) -> AppResult<Participant>;

    fn delete_participant(&mut self, participant_id: i64) -> AppResult<()>;

    fn set_joined_players(&mut self, match_id: i64, joined_players: i64) -> AppResult<Match>;

    fn delete_match(&mut self, match_id: i64) -> AppResult<()>;
}

pub trait MatchStore: Send + Sync {
    fn transaction<R>(&self, f: impl FnOnce(&mut dyn MatchTx) -> AppResult<R>) -> AppResult<R>;
}

/// The store handle carried in application state.
pub enum Store {
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl Store {
    /// Builds the backend selected by configuration, running pending
    /// migrations for Postgres when enabled.
    pub fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        match config.storage {
            StorageBackend::Postgres => {
                let pool = create_pool(&config.database_url, config.db_pool_size)?;
                if config.run_migrations {
                    run_migrations(&pool)?;
                }
                Ok(Self::Postgres(PgStore::new(pool)))
            }
            StorageBackend::Memory => {
                tracing::warn!("using in-memory storage; data is lost on restart");
                Ok(Self::Memory(MemoryStore::new()))
            }
        }
    }
}

impl MatchStore for Store {
    fn transaction<R>(&self, f: impl FnOnce(&mut dyn MatchTx) -> AppResult<R>) -> AppResult<R> {
        match self {
            Store::Postgres(store) => store.transaction(f),
            Store::Memory(store) => store.transaction(f),
        }
    }
}
