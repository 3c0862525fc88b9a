use super::user::UserProfile;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: UserProfile,
    pub tokens: AuthTokens,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct EmailVerificationToken {
    pub id: String,
    pub user_id: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl EmailVerificationToken {
    pub fn new(user_id: String, ttl_hours: i64) -> Self {
        let code: String = (0..6)
            .map(|_| rand::thread_rng().gen_range(0..=9).to_string())
            .collect();

        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            code,
            expires_at: Utc::now() + Duration::hours(ttl_hours),
            consumed_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PasswordResetToken {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl PasswordResetToken {
    pub fn new(user_id: String, ttl_hours: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            token: Uuid::new_v4().to_string(),
            expires_at: Utc::now() + Duration::hours(ttl_hours),
            consumed_at: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
