use super::participant::ParticipationStatus;
use super::InvalidEnumValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Active,
    Past,
    Rejected,
    Pending,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Active => "ACTIVE",
            EventStatus::Past => "PAST",
            EventStatus::Rejected => "REJECTED",
            EventStatus::Pending => "PENDING",
        }
    }

    /// REJECTED and PENDING never change on their own; leaving them
    /// takes an explicit moderation action.
    pub fn is_sticky(&self) -> bool {
        matches!(self, EventStatus::Rejected | EventStatus::Pending)
    }
}

impl TryFrom<String> for EventStatus {
    type Error = InvalidEnumValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "ACTIVE" => Ok(EventStatus::Active),
            "PAST" => Ok(EventStatus::Past),
            "REJECTED" => Ok(EventStatus::Rejected),
            "PENDING" => Ok(EventStatus::Pending),
            _ => Err(InvalidEnumValue(value)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub short_description: Option<String>,
    pub full_description: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub image_data: Option<String>,
    pub image_content_type: Option<String>,
    pub payment_info: Option<String>,
    pub max_participants: Option<i64>,
    #[sqlx(try_from = "String")]
    pub status: EventStatus,
    pub created_by: String,
}

impl Event {
    pub fn new(draft: &EventDraft, status: EventStatus, created_by: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: draft.title.clone(),
            short_description: draft.short_description.clone(),
            full_description: draft.full_description.clone(),
            start_at: draft.start_at,
            end_at: draft.end_at,
            image_data: None,
            image_content_type: None,
            payment_info: draft.payment_info.clone(),
            max_participants: draft.max_participants,
            status,
            created_by,
        }
    }

    pub fn image_url(&self) -> Option<String> {
        self.image_data.as_ref().map(|_| format!("/events/{}/image", self.id))
    }
}

/// Validated service-level input for create/update, already parsed
/// out of the wire payload.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub title: String,
    pub short_description: Option<String>,
    pub full_description: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub image_base64: Option<String>,
    pub image_type: Option<String>,
    pub payment_info: Option<String>,
    pub max_participants: Option<i64>,
    pub participant_ids: Vec<String>,
    pub status: Option<EventStatus>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    pub id: String,
    pub title: String,
    pub short_description: Option<String>,
    pub full_description: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub image_url: Option<String>,
    pub payment_info: Option<String>,
    pub max_participants: Option<i64>,
    pub status: EventStatus,
    pub created_by: String,
    pub created_by_full_name: Option<String>,
    pub participants_count: i64,
    pub participation_status: Option<ParticipationStatus>,
    pub average_rating: Option<f64>,
    pub ratings_count: i64,
}
