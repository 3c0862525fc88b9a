pub mod auth_service;
pub mod event_service;
pub mod export;
pub mod notifier;
pub mod token_service;
pub mod validation;
