use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub mail_from: String,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub admin_email: String,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@afisha.local".to_string()),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_minutes: env::var("ACCESS_TOKEN_MINUTES").unwrap_or_else(|_| "15".to_string()).parse().expect("ACCESS_TOKEN_MINUTES must be a number"),
            refresh_token_days: env::var("REFRESH_TOKEN_DAYS").unwrap_or_else(|_| "14".to_string()).parse().expect("REFRESH_TOKEN_DAYS must be a number"),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@afisha.local".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "Admin123!".to_string()),
        }
    }
}
