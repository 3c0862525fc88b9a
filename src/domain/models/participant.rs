use super::InvalidEnumValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParticipationStatus {
    Confirmed,
    Cancelled,
}

impl ParticipationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipationStatus::Confirmed => "CONFIRMED",
            ParticipationStatus::Cancelled => "CANCELLED",
        }
    }
}

impl TryFrom<String> for ParticipationStatus {
    type Error = InvalidEnumValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "CONFIRMED" => Ok(ParticipationStatus::Confirmed),
            "CANCELLED" => Ok(ParticipationStatus::Cancelled),
            _ => Err(InvalidEnumValue(value)),
        }
    }
}

/// One row per (event, user) pair. Confirm/cancel cycles flip the status
/// and restamp the timestamps on the same row instead of inserting
/// duplicates; a unique index backs this up.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EventParticipant {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    #[sqlx(try_from = "String")]
    pub status: ParticipationStatus,
    pub confirmed_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl EventParticipant {
    pub fn new(event_id: String, user_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            user_id,
            status: ParticipationStatus::Confirmed,
            confirmed_at: Utc::now(),
            cancelled_at: None,
        }
    }
}

#[derive(Debug, FromRow, Clone)]
pub struct ParticipantCount {
    pub event_id: String,
    pub count: i64,
}
