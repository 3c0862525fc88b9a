use crate::domain::models::event::{EventDraft, EventStatus};
use crate::domain::models::user::{UserRole, UserStatus};
use crate::error::AppError;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

/// Frontends send both zoned RFC 3339 stamps and bare local stamps like
/// `2025-06-01T18:00`; the latter are taken as UTC.
fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(AppError::Validation(format!("Некорректная дата в поле {}", field)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub title: String,
    pub short_description: Option<String>,
    pub full_description: String,
    pub start_at: String,
    pub end_at: String,
    pub image_base64: Option<String>,
    pub image_type: Option<String>,
    pub payment_info: Option<String>,
    pub max_participants: Option<i64>,
    pub participant_ids: Option<Vec<String>>,
    pub status: Option<EventStatus>,
    pub created_by: Option<String>,
}

impl EventPayload {
    pub fn to_draft(&self) -> Result<EventDraft, AppError> {
        Ok(EventDraft {
            title: self.title.clone(),
            short_description: self.short_description.clone(),
            full_description: self.full_description.clone(),
            start_at: parse_datetime(&self.start_at, "startAt")?,
            end_at: parse_datetime(&self.end_at, "endAt")?,
            image_base64: self.image_base64.clone(),
            image_type: self.image_type.clone(),
            payment_info: self.payment_info.clone(),
            max_participants: self.max_participants,
            participant_ids: self.participant_ids.clone().unwrap_or_default(),
            status: self.status,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub user_id: Option<String>,
    pub score: i32,
    pub comment: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    pub tab: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdQuery {
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredUserQuery {
    pub user_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorQuery {
    pub creator_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUsersQuery {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub query: Option<String>,
    pub registered_from: Option<DateTime<Utc>>,
    pub registered_to: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserRequest {
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminResetPasswordRequest {
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct AdminEventsQuery {
    pub status: Option<EventStatus>,
}
