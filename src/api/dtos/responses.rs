use crate::domain::models::user::UserProfile;
use serde::Serialize;

#[derive(Serialize)]
pub struct RegistrationResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserProfile,
}
