use crate::config::Config;
use crate::domain::models::{
    auth::{AuthTokens, Claims},
    user::User,
};
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_minutes: i64,
    refresh_token_days: i64,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_token_minutes: config.access_token_minutes,
            refresh_token_days: config.refresh_token_days,
        }
    }

    pub fn issue_pair(&self, user: &User) -> Result<AuthTokens, AppError> {
        let access_token =
            self.build_token(user, Duration::minutes(self.access_token_minutes), TOKEN_TYPE_ACCESS)?;
        let refresh_token =
            self.build_token(user, Duration::days(self.refresh_token_days), TOKEN_TYPE_REFRESH)?;

        Ok(AuthTokens { access_token, refresh_token })
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AppError::Unauthorized("Неверный токен".to_string()))?;
        Ok(data.claims)
    }

    pub fn access_token_minutes(&self) -> i64 {
        self.access_token_minutes
    }

    pub fn refresh_token_days(&self) -> i64 {
        self.refresh_token_days
    }

    fn build_token(&self, user: &User, ttl: Duration, token_type: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            token_type: token_type.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + ttl).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("JWT encoding failed: {}", e);
            AppError::Internal
        })
    }
}
