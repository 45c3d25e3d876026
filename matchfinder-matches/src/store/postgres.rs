use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use matchfinder_shared::clients::db::DbPool;
use matchfinder_shared::errors::{AppError, AppResult};

use super::{MatchStore, MatchTx};
use crate::models::{Match, NewMatch, NewParticipant, Participant};
use crate::schema::{match_participants, matches};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let mut pooled = pool.get()?;
    let conn: &mut PgConnection = &mut pooled;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("failed to run migrations: {e}"))?;
    tracing::info!(count = applied.len(), "database migrations applied");
    Ok(())
}

/// Postgres-backed store. The match row is taken `FOR UPDATE` so
/// check-then-act sequences on one match are serialized, and the
/// `uq_match_participant` index settles any duplicate join that slips past.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl MatchStore for PgStore {
    fn transaction<R>(&self, f: impl FnOnce(&mut dyn MatchTx) -> AppResult<R>) -> AppResult<R> {
        let mut pooled = self
            .pool
            .get()
            .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;
        let conn: &mut PgConnection = &mut pooled;

        conn.transaction::<R, AppError, _>(|conn| f(&mut PgTx { conn }))
    }
}

struct PgTx<'a> {
    conn: &'a mut PgConnection,
}

impl MatchTx for PgTx<'_> {
    fn insert_match(&mut self, new_match: &NewMatch) -> AppResult<Match> {
        let created = diesel::insert_into(matches::table)
            .values(new_match)
            .returning(Match::as_returning())
            .get_result(self.conn)?;
        Ok(created)
    }

    fn list_matches(&mut self) -> AppResult<Vec<Match>> {
        let all = matches::table
            .order((matches::date.asc(), matches::time.asc(), matches::id.asc()))
            .select(Match::as_select())
            .load(self.conn)?;
        Ok(all)
    }

    fn lock_match(&mut self, match_id: i64) -> AppResult<Option<Match>> {
        let found = matches::table
            .find(match_id)
            .select(Match::as_select())
            .for_update()
            .first(self.conn)
            .optional()?;
        Ok(found)
    }

    fn find_participant(&mut self, match_id: i64, user_id: &str) -> AppResult<Option<Participant>> {
        let found = match_participants::table
            .filter(match_participants::match_id.eq(match_id))
            .filter(match_participants::user_id.eq(user_id))
            .select(Participant::as_select())
            .first(self.conn)
            .optional()?;
        Ok(found)
    }

    fn list_participants(&mut self, parent: &Match) -> AppResult<Vec<Participant>> {
        let participants = Participant::belonging_to(parent)
            .order(match_participants::id.asc())
            .select(Participant::as_select())
            .load(self.conn)?;
        Ok(participants)
    }

    fn insert_participant(&mut self, new_participant: &NewParticipant) -> AppResult<Participant> {
        let created = diesel::insert_into(match_participants::table)
            .values(new_participant)
            .returning(Participant::as_returning())
            .get_result(self.conn)?;
        Ok(created)
    }

    fn delete_participant(&mut self, participant_id: i64) -> AppResult<()> {
        diesel::delete(match_participants::table.find(participant_id)).execute(self.conn)?;
        Ok(())
    }

    fn set_joined_players(&mut self, match_id: i64, joined_players: i64) -> AppResult<Match> {
        let updated = diesel::update(matches::table.find(match_id))
            .set(matches::joined_players.eq(joined_players))
            .returning(Match::as_returning())
            .get_result(self.conn)?;
        Ok(updated)
    }

    fn delete_match(&mut self, match_id: i64) -> AppResult<()> {
        diesel::delete(matches::table.find(match_id)).execute(self.conn)?;
        Ok(())
    }
}
