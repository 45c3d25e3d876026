use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use chrono::Utc;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use matchfinder_shared::errors::{AppError, AppResult};

use super::{MatchStore, MatchTx};
use crate::models::{Match, NewMatch, NewParticipant, Participant};

/// Process-local store for development and tests.
///
/// One mutex guards the whole dataset for the duration of a transaction, so
/// transactions are fully serialized. A failed transaction restores the
/// snapshot taken when it began. Constraint failures are reported with the
/// same diesel error kinds Postgres would produce.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default, Clone)]
struct MemoryState {
    last_match_id: i64,
    last_participant_id: i64,
    matches: BTreeMap<i64, Match>,
    participants: BTreeMap<i64, Participant>,
    participant_keys: HashSet<(i64, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchStore for MemoryStore {
    fn transaction<R>(&self, f: impl FnOnce(&mut dyn MatchTx) -> AppResult<R>) -> AppResult<R> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| AppError::internal("memory store lock poisoned"))?;
        let snapshot = guard.clone();

        let result = f(&mut MemoryTx { state: &mut *guard });
        if result.is_err() {
            *guard = snapshot;
        }
        result
    }
}

struct MemoryTx<'a> {
    state: &'a mut MemoryState,
}

fn constraint_error(kind: DatabaseErrorKind, message: &str) -> AppError {
    AppError::Database(DieselError::DatabaseError(kind, Box::new(message.to_string())))
}

impl MatchTx for MemoryTx<'_> {
    fn insert_match(&mut self, new_match: &NewMatch) -> AppResult<Match> {
        self.state.last_match_id += 1;
        let created = Match {
            id: self.state.last_match_id,
            date: new_match.date,
            time: new_match.time,
            location: new_match.location.clone(),
            max_players: new_match.max_players,
            joined_players: 0,
            organizer_user_id: new_match.organizer_user_id.clone(),
            organizer_first_name: new_match.organizer_first_name.clone(),
            organizer_last_name: new_match.organizer_last_name.clone(),
        };
        self.state.matches.insert(created.id, created.clone());
        Ok(created)
    }

    fn list_matches(&mut self) -> AppResult<Vec<Match>> {
        let mut all: Vec<Match> = self.state.matches.values().cloned().collect();
        all.sort_by(|a, b| (a.date, a.time, a.id).cmp(&(b.date, b.time, b.id)));
        Ok(all)
    }

    fn lock_match(&mut self, match_id: i64) -> AppResult<Option<Match>> {
        Ok(self.state.matches.get(&match_id).cloned())
    }

    fn find_participant(&mut self, match_id: i64, user_id: &str) -> AppResult<Option<Participant>> {
        Ok(self
            .state
            .participants
            .values()
            .find(|p| p.match_id == match_id && p.user_id == user_id)
            .cloned())
    }

    fn list_participants(&mut self, parent: &Match) -> AppResult<Vec<Participant>> {
        Ok(self
            .state
            .participants
            .values()
            .filter(|p| p.match_id == parent.id)
            .cloned()
            .collect())
    }

    fn insert_participant(&mut self, new_participant: &NewParticipant) -> AppResult<Participant> {
        if !self.state.matches.contains_key(&new_participant.match_id) {
            return Err(constraint_error(
                DatabaseErrorKind::ForeignKeyViolation,
                "match_participants.match_id references a missing match",
            ));
        }

        let key = (new_participant.match_id, new_participant.user_id.clone());
        if !self.state.participant_keys.insert(key) {
            return Err(constraint_error(
                DatabaseErrorKind::UniqueViolation,
                "duplicate key value violates unique constraint \"uq_match_participant\"",
            ));
        }

        self.state.last_participant_id += 1;
        let created = Participant {
            id: self.state.last_participant_id,
            match_id: new_participant.match_id,
            user_id: new_participant.user_id.clone(),
            first_name: new_participant.first_name.clone(),
            last_name: new_participant.last_name.clone(),
            joined_at: Utc::now(),
        };
        self.state.participants.insert(created.id, created.clone());
        Ok(created)
    }

    fn delete_participant(&mut self, participant_id: i64) -> AppResult<()> {
        if let Some(removed) = self.state.participants.remove(&participant_id) {
            self.state
                .participant_keys
                .remove(&(removed.match_id, removed.user_id));
        }
        Ok(())
    }

    fn set_joined_players(&mut self, match_id: i64, joined_players: i64) -> AppResult<Match> {
        let found = self
            .state
            .matches
            .get_mut(&match_id)
            .ok_or_else(|| AppError::Database(DieselError::NotFound))?;
        found.joined_players = joined_players;
        Ok(found.clone())
    }

    fn delete_match(&mut self, match_id: i64) -> AppResult<()> {
        if self.state.participants.values().any(|p| p.match_id == match_id) {
            return Err(constraint_error(
                DatabaseErrorKind::ForeignKeyViolation,
                "match_participants.match_id still references this match",
            ));
        }
        self.state.matches.remove(&match_id);
        Ok(())
    }
}
