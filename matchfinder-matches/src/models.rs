use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use matchfinder_shared::types::CallerIdentity;

use crate::schema::{match_participants, matches};

// --- Match ---

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = matches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Match {
    pub id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub max_players: i64,
    pub joined_players: i64,
    pub organizer_user_id: String,
    pub organizer_first_name: String,
    pub organizer_last_name: String,
}

impl Match {
    pub fn is_full(&self) -> bool {
        self.joined_players >= self.max_players
    }

    pub fn is_organized_by(&self, user_id: &str) -> bool {
        self.organizer_user_id == user_id
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatch {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub max_players: i64,
    pub organizer_user_id: String,
    pub organizer_first_name: String,
    pub organizer_last_name: String,
}

impl NewMatch {
    pub fn from_request(req: CreateMatchRequest, organizer: &CallerIdentity) -> Self {
        Self {
            date: req.date,
            time: req.time,
            location: req.location,
            max_players: req.max_players,
            organizer_user_id: organizer.user_id.clone(),
            organizer_first_name: organizer.first_name.clone(),
            organizer_last_name: organizer.last_name.clone(),
        }
    }
}

/// Body of `POST /matches`. Neither `location` nor `max_players` is bounded;
/// zero capacity yields a match nobody can join.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMatchRequest {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub max_players: i64,
}

// --- Participant ---

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(table_name = match_participants)]
#[diesel(belongs_to(Match))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Participant {
    pub id: i64,
    pub match_id: i64,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = match_participants)]
pub struct NewParticipant {
    pub match_id: i64,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewParticipant {
    pub fn new(match_id: i64, caller: &CallerIdentity) -> Self {
        Self {
            match_id,
            user_id: caller.user_id.clone(),
            first_name: caller.first_name.clone(),
            last_name: caller.last_name.clone(),
        }
    }
}
