//! Match lifecycle rules.
//!
//! A match moves between `active(n)` states for `0 <= n <= max_players`:
//! join takes `n` to `n + 1`, leave takes it back, and delete is only legal
//! at `n == 0` by the organizer. Each function is one store transaction.

use metrics::counter;

use matchfinder_shared::errors::{AppError, AppResult, ErrorCode};
use matchfinder_shared::types::CallerIdentity;

use crate::models::{CreateMatchRequest, Match, NewMatch, NewParticipant, Participant};
use crate::store::{MatchStore, MatchTx};

fn match_not_found() -> AppError {
    AppError::new(ErrorCode::MatchNotFound, "Match not found")
}

fn already_joined() -> AppError {
    AppError::new(ErrorCode::AlreadyJoined, "You already joined this match")
}

fn has_players() -> AppError {
    AppError::new(ErrorCode::MatchHasPlayers, "Cannot delete a match with joined players")
}

fn locked_match(tx: &mut dyn MatchTx, match_id: i64) -> AppResult<Match> {
    tx.lock_match(match_id)?.ok_or_else(match_not_found)
}

pub fn create_match<S: MatchStore>(
    store: &S,
    req: CreateMatchRequest,
    organizer: &CallerIdentity,
) -> AppResult<Match> {
    let new_match = NewMatch::from_request(req, organizer);
    let created = store.transaction(|tx| tx.insert_match(&new_match))?;

    counter!("matches_created_total").increment(1);
    tracing::info!(
        match_id = created.id,
        organizer = %organizer.user_id,
        max_players = created.max_players,
        "match created"
    );

    Ok(created)
}

pub fn list_matches<S: MatchStore>(store: &S) -> AppResult<Vec<Match>> {
    store.transaction(|tx| tx.list_matches())
}

pub fn list_participants<S: MatchStore>(store: &S, match_id: i64) -> AppResult<Vec<Participant>> {
    store.transaction(|tx| {
        let found = tx.lock_match(match_id)?.ok_or_else(match_not_found)?;
        tx.list_participants(&found)
    })
}

/// Capacity is checked before the duplicate check, so a full match reports
/// full even to a caller who is already in it.
pub fn join_match<S: MatchStore>(store: &S, match_id: i64, caller: &CallerIdentity) -> AppResult<Match> {
    let updated = store.transaction(|tx| {
        let current = locked_match(tx, match_id)?;

        if current.is_full() {
            return Err(AppError::new(ErrorCode::MatchFull, "Match is full"));
        }

        if tx.find_participant(match_id, &caller.user_id)?.is_some() {
            return Err(already_joined());
        }

        tx.insert_participant(&NewParticipant::new(match_id, caller))
            .map_err(|e| if e.is_unique_violation() { already_joined() } else { e })?;

        tx.set_joined_players(match_id, current.joined_players + 1)
    })?;

    counter!("match_joins_total").increment(1);
    tracing::info!(
        match_id,
        user_id = %caller.user_id,
        joined_players = updated.joined_players,
        max_players = updated.max_players,
        "player joined match"
    );

    Ok(updated)
}

pub fn leave_match<S: MatchStore>(store: &S, match_id: i64, caller: &CallerIdentity) -> AppResult<Match> {
    let updated = store.transaction(|tx| {
        let current = locked_match(tx, match_id)?;

        let participant = tx
            .find_participant(match_id, &caller.user_id)?
            .ok_or_else(|| AppError::new(ErrorCode::NotJoined, "You have not joined this match"))?;

        tx.delete_participant(participant.id)?;
        tx.set_joined_players(match_id, (current.joined_players - 1).max(0))
    })?;

    counter!("match_leaves_total").increment(1);
    tracing::info!(
        match_id,
        user_id = %caller.user_id,
        joined_players = updated.joined_players,
        "player left match"
    );

    Ok(updated)
}

pub fn delete_match<S: MatchStore>(store: &S, match_id: i64, caller: &CallerIdentity) -> AppResult<()> {
    store.transaction(|tx| {
        let current = locked_match(tx, match_id)?;

        if !current.is_organized_by(&caller.user_id) {
            return Err(AppError::new(
                ErrorCode::NotOrganizer,
                "Only the organizer can delete this match",
            ));
        }

        if current.joined_players != 0 {
            return Err(has_players());
        }

        tx.delete_match(match_id)
            .map_err(|e| if e.is_foreign_key_violation() { has_players() } else { e })
    })?;

    counter!("matches_deleted_total").increment(1);
    tracing::info!(match_id, organizer = %caller.user_id, "match deleted");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{NaiveDate, NaiveTime};

    fn request(max_players: i64) -> CreateMatchRequest {
        CreateMatchRequest {
            date: NaiveDate::from_ymd_opt(2025, 10, 4).unwrap(),
            time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            location: "Retiro".into(),
            max_players,
        }
    }

    fn user(id: &str) -> CallerIdentity {
        CallerIdentity::new(id, "First", "Last")
    }

    fn setup(max_players: i64) -> (MemoryStore, Match) {
        let store = MemoryStore::new();
        let created = create_match(&store, request(max_players), &user("org1")).unwrap();
        (store, created)
    }

    #[test]
    fn create_starts_empty_with_organizer() {
        let (_, created) = setup(10);
        assert_eq!(created.joined_players, 0);
        assert_eq!(created.organizer_user_id, "org1");
        assert_eq!(created.organizer_first_name, "First");
    }

    #[test]
    fn zero_capacity_is_accepted_but_unjoinable() {
        let (store, created) = setup(0);
        assert_eq!(created.max_players, 0);
        let err = join_match(&store, created.id, &user("u1")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MatchFull);
    }

    #[test]
    fn join_then_full() {
        let (store, created) = setup(1);
        let joined = join_match(&store, created.id, &user("user1")).unwrap();
        assert_eq!(joined.joined_players, 1);

        let err = join_match(&store, created.id, &user("user2")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MatchFull);
        assert_eq!(err.to_string(), "Match is full");
    }

    #[test]
    fn double_join_conflicts() {
        let (store, created) = setup(3);
        join_match(&store, created.id, &user("u2")).unwrap();
        let err = join_match(&store, created.id, &user("u2")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyJoined);
        assert_eq!(err.to_string(), "You already joined this match");

        let listed = list_matches(&store).unwrap();
        assert_eq!(listed[0].joined_players, 1);
    }

    #[test]
    fn leave_without_join_conflicts() {
        let (store, created) = setup(3);
        let err = leave_match(&store, created.id, &user("u2")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotJoined);
        assert_eq!(err.to_string(), "You have not joined this match");
    }

    #[test]
    fn leave_is_not_idempotent() {
        let (store, created) = setup(3);
        join_match(&store, created.id, &user("u2")).unwrap();
        let left = leave_match(&store, created.id, &user("u2")).unwrap();
        assert_eq!(left.joined_players, 0);

        let err = leave_match(&store, created.id, &user("u2")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotJoined);
    }

    #[test]
    fn unknown_match_is_not_found() {
        let store = MemoryStore::new();
        for err in [
            join_match(&store, 99999, &user("u1")).unwrap_err(),
            leave_match(&store, 99999, &user("u1")).unwrap_err(),
            delete_match(&store, 99999, &user("u1")).unwrap_err(),
            list_participants(&store, 99999).unwrap_err(),
        ] {
            assert_eq!(err.code(), ErrorCode::MatchNotFound);
        }
    }

    #[test]
    fn delete_rules() {
        let (store, created) = setup(5);

        let err = delete_match(&store, created.id, &user("u2")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotOrganizer);

        join_match(&store, created.id, &user("u2")).unwrap();
        let err = delete_match(&store, created.id, &user("org1")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MatchHasPlayers);

        // Non-organizer is refused before the emptiness check.
        let err = delete_match(&store, created.id, &user("u2")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotOrganizer);

        leave_match(&store, created.id, &user("u2")).unwrap();
        delete_match(&store, created.id, &user("org1")).unwrap();
        assert!(list_matches(&store).unwrap().is_empty());

        let err = join_match(&store, created.id, &user("u2")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MatchNotFound);
    }

    #[test]
    fn participants_in_join_order() {
        let (store, created) = setup(5);
        join_match(&store, created.id, &CallerIdentity::new("user1", "Alice", "Smith")).unwrap();
        join_match(&store, created.id, &CallerIdentity::new("user2", "Bob", "Jones")).unwrap();
        join_match(&store, created.id, &CallerIdentity::new("user3", "Charlie", "Brown")).unwrap();
        leave_match(&store, created.id, &user("user2")).unwrap();

        let participants = list_participants(&store, created.id).unwrap();
        let ids: Vec<_> = participants.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(ids, vec!["user1", "user3"]);
        assert_eq!(participants[0].first_name, "Alice");
    }

    #[test]
    fn counter_stays_within_bounds() {
        let (store, created) = setup(2);
        let users = ["a", "b", "c", "a", "b", "d"];
        for (step, id) in users.iter().enumerate() {
            let _ = join_match(&store, created.id, &user(id));
            if step % 2 == 1 {
                let _ = leave_match(&store, created.id, &user(id));
            }
            let current = &list_matches(&store).unwrap()[0];
            assert!(current.joined_players >= 0);
            assert!(current.joined_players <= current.max_players);
            let participants = list_participants(&store, created.id).unwrap();
            assert_eq!(participants.len() as i64, current.joined_players);
        }
    }

    /// Store whose transactions hide existing participants from lookups and
    /// report every match as empty, so only the storage constraints stand
    /// between the caller and a duplicate row or an orphaned participant.
    struct StaleReads<'a>(&'a MemoryStore);

    struct StaleTx<'a> {
        inner: &'a mut dyn MatchTx,
    }

    impl MatchStore for StaleReads<'_> {
        fn transaction<R>(&self, f: impl FnOnce(&mut dyn MatchTx) -> AppResult<R>) -> AppResult<R> {
            self.0.transaction(|tx| f(&mut StaleTx { inner: tx }))
        }
    }

    impl MatchTx for StaleTx<'_> {
        fn insert_match(&mut self, new_match: &NewMatch) -> AppResult<Match> {
            self.inner.insert_match(new_match)
        }

        fn list_matches(&mut self) -> AppResult<Vec<Match>> {
            self.inner.list_matches()
        }

        fn lock_match(&mut self, match_id: i64) -> AppResult<Option<Match>> {
            Ok(self.inner.lock_match(match_id)?.map(|m| Match { joined_players: 0, ..m }))
        }

        fn find_participant(&mut self, _match_id: i64, _user_id: &str) -> AppResult<Option<Participant>> {
            Ok(None)
        }

        fn list_participants(&mut self, parent: &Match) -> AppResult<Vec<Participant>> {
            self.inner.list_participants(parent)
        }

        fn insert_participant(&mut self, new_participant: &NewParticipant) -> AppResult<Participant> {
            self.inner.insert_participant(new_participant)
        }

        fn delete_participant(&mut self, participant_id: i64) -> AppResult<()> {
            self.inner.delete_participant(participant_id)
        }

        fn set_joined_players(&mut self, match_id: i64, joined_players: i64) -> AppResult<Match> {
            self.inner.set_joined_players(match_id, joined_players)
        }

        fn delete_match(&mut self, match_id: i64) -> AppResult<()> {
            self.inner.delete_match(match_id)
        }
    }

    #[test]
    fn unique_violation_on_join_becomes_already_joined() {
        let (store, created) = setup(5);
        join_match(&store, created.id, &user("u2")).unwrap();

        let err = join_match(&StaleReads(&store), created.id, &user("u2")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyJoined);
        assert_eq!(err.to_string(), "You already joined this match");

        let current = &list_matches(&store).unwrap()[0];
        assert_eq!(current.joined_players, 1);
        assert_eq!(list_participants(&store, created.id).unwrap().len(), 1);
    }

    #[test]
    fn foreign_key_violation_on_delete_becomes_has_players() {
        let (store, created) = setup(5);
        join_match(&store, created.id, &user("u2")).unwrap();

        let err = delete_match(&StaleReads(&store), created.id, &user("org1")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MatchHasPlayers);
        assert_eq!(err.to_string(), "Cannot delete a match with joined players");
        assert_eq!(list_matches(&store).unwrap().len(), 1);
    }

    #[test]
    fn concurrent_joins_respect_capacity_and_uniqueness() {
        let (store, created) = setup(5);

        let results: Vec<AppResult<Match>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..20)
                .map(|i| {
                    let store = &store;
                    // Ten users, each submitting twice.
                    let caller = user(&format!("user{}", i % 10));
                    s.spawn(move || join_match(store, created.id, &caller))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 5);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(matches!(err.code(), ErrorCode::MatchFull | ErrorCode::AlreadyJoined));
        }

        let current = &list_matches(&store).unwrap()[0];
        assert_eq!(current.joined_players, 5);
        let participants = list_participants(&store, created.id).unwrap();
        let mut ids: Vec<_> = participants.iter().map(|p| p.user_id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);
    }
}
