pub mod admin_events;
pub mod admin_users;
pub mod auth;
pub mod events;
pub mod health;
