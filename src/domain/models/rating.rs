use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EventRating {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EventRating {
    pub fn new(event_id: String, user_id: String, score: i32, comment: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            user_id,
            score,
            comment,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, FromRow, Clone)]
pub struct RatingAggregate {
    pub event_id: String,
    pub average: f64,
    pub count: i64,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    pub user_id: String,
    pub user_name: Option<String>,
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RatingsResponse {
    pub average: Option<f64>,
    pub count: i64,
    pub ratings: Vec<RatingView>,
}
