use crate::domain::models::{
    auth::{EmailVerificationToken, PasswordResetToken},
    event::{Event, EventStatus},
    participant::{EventParticipant, ParticipantCount},
    rating::{EventRating, RatingAggregate},
    user::User,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError>;
    async fn exists_admin(&self) -> Result<bool, AppError>;
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn update(&self, user: &User) -> Result<User, AppError>;
}

#[async_trait]
pub trait VerificationTokenRepository: Send + Sync {
    async fn create(&self, token: &EmailVerificationToken) -> Result<(), AppError>;
    async fn find_by_code(&self, code: &str) -> Result<Option<EmailVerificationToken>, AppError>;
    async fn mark_consumed(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError>;
    /// Supersedes every unconsumed token of the user, optionally sparing one.
    async fn close_active(&self, user_id: &str, except: Option<&str>) -> Result<(), AppError>;
}

#[async_trait]
pub trait ResetTokenRepository: Send + Sync {
    async fn create(&self, token: &PasswordResetToken) -> Result<(), AppError>;
    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordResetToken>, AppError>;
    async fn mark_consumed(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError>;
    async fn close_active(&self, user_id: &str, except: Option<&str>) -> Result<(), AppError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError>;
    async fn list(&self) -> Result<Vec<Event>, AppError>;
    async fn list_by_status(&self, status: EventStatus) -> Result<Vec<Event>, AppError>;
    async fn update(&self, event: &Event) -> Result<Event, AppError>;
    async fn update_status(&self, id: &str, status: EventStatus) -> Result<(), AppError>;
}

#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Confirms participation inside one transaction: the capacity check and
    /// the row upsert either both see the same confirmed count or fail,
    /// so two concurrent confirms cannot both squeeze past the gate.
    async fn confirm(
        &self,
        event_id: &str,
        user_id: &str,
        capacity: Option<i64>,
    ) -> Result<EventParticipant, AppError>;
    async fn find_by_event_and_user(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<EventParticipant>, AppError>;
    async fn update(&self, participant: &EventParticipant) -> Result<EventParticipant, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<EventParticipant>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<EventParticipant>, AppError>;
    async fn count_confirmed(&self, event_id: &str) -> Result<i64, AppError>;
    async fn counts_confirmed(&self) -> Result<Vec<ParticipantCount>, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait RatingRepository: Send + Sync {
    async fn create(&self, rating: &EventRating) -> Result<EventRating, AppError>;
    async fn find_by_event_and_user(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<EventRating>, AppError>;
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<EventRating>, AppError>;
    async fn aggregate(&self, event_id: &str) -> Result<Option<RatingAggregate>, AppError>;
    async fn aggregates(&self) -> Result<Vec<RatingAggregate>, AppError>;
}

#[async_trait]
pub trait MailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), AppError>;
}
