pub mod auth;
pub mod event;
pub mod participant;
pub mod rating;
pub mod user;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid enum value: {0}")]
pub struct InvalidEnumValue(pub String);
