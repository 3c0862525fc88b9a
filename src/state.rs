use crate::config::Config;
use crate::domain::ports::{
    EventRepository, MailService, ParticipantRepository, RatingRepository, ResetTokenRepository,
    UserRepository, VerificationTokenRepository,
};
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::event_service::EventService;
use crate::domain::services::notifier::Notifier;
use crate::domain::services::token_service::TokenService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub verification_token_repo: Arc<dyn VerificationTokenRepository>,
    pub reset_token_repo: Arc<dyn ResetTokenRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub participant_repo: Arc<dyn ParticipantRepository>,
    pub rating_repo: Arc<dyn RatingRepository>,
    pub mail_service: Arc<dyn MailService>,
    pub token_service: Arc<TokenService>,
    pub notifier: Arc<Notifier>,
    pub auth_service: Arc<AuthService>,
    pub event_service: Arc<EventService>,
}
