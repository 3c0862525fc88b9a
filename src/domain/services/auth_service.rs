use crate::domain::models::{
    auth::{AuthResult, EmailVerificationToken, PasswordResetToken},
    user::{User, UserProfile, UserRole, UserStatus},
};
use crate::domain::ports::{ResetTokenRepository, UserRepository, VerificationTokenRepository};
use crate::domain::services::notifier::Notifier;
use crate::domain::services::token_service::{TokenService, TOKEN_TYPE_REFRESH};
use crate::domain::services::validation;
use crate::error::AppError;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand::rngs::OsRng;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

const TOKEN_TTL_HOURS: i64 = 24;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AppError::Internal)?
        .to_string())
}

fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(password_hash).map_err(|_| AppError::Internal)?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    verification_tokens: Arc<dyn VerificationTokenRepository>,
    reset_tokens: Arc<dyn ResetTokenRepository>,
    token_service: Arc<TokenService>,
    notifier: Arc<Notifier>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        verification_tokens: Arc<dyn VerificationTokenRepository>,
        reset_tokens: Arc<dyn ResetTokenRepository>,
        token_service: Arc<TokenService>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self { users, verification_tokens, reset_tokens, token_service, notifier }
    }

    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<UserProfile, AppError> {
        let mut errors = BTreeMap::new();
        if let Some(msg) = validation::full_name_error(full_name) {
            errors.insert("fullName".to_string(), msg.to_string());
        }
        if let Some(msg) = validation::password_error(password) {
            errors.insert("password".to_string(), msg.to_string());
        }
        if password != confirm_password {
            errors.insert("confirmPassword".to_string(), "Пароли не совпадают".to_string());
        }
        if let Some((_, first)) = errors.first_key_value() {
            let message = first.clone();
            return Err(AppError::ValidationFields(message, errors));
        }

        if self.users.exists_by_email(email).await? {
            return Err(AppError::Validation("Пользователь с таким email уже существует".to_string()));
        }

        let user = User::new(full_name.to_string(), email.to_string(), hash_password(password)?);
        let user = self.users.create(&user).await?;

        self.verification_tokens.close_active(&user.id, None).await?;
        let token = EmailVerificationToken::new(user.id.clone(), TOKEN_TTL_HOURS);
        self.verification_tokens.create(&token).await?;

        info!("Registered user {} ({})", user.id, user.email);
        self.notifier.verification_code(&user.email, &token.code).await;

        Ok(user.to_profile())
    }

    pub async fn verify_email(&self, email: &str, code: &str) -> Result<AuthResult, AppError> {
        let mut user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Validation("Пользователь не найден".to_string()))?;

        let token = self
            .verification_tokens
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::Validation("Неверный код".to_string()))?;

        if token.user_id != user.id {
            return Err(AppError::Validation("Неверный код".to_string()));
        }
        if token.consumed_at.is_some() {
            return Err(AppError::Validation("Код уже использован".to_string()));
        }
        let now = Utc::now();
        if token.is_expired(now) {
            return Err(AppError::Validation("Срок действия кода истёк".to_string()));
        }

        self.verification_tokens.mark_consumed(&token.id, now).await?;
        self.verification_tokens.close_active(&user.id, Some(&token.id)).await?;

        user.email_verified = true;
        user.email_verified_at = Some(now);
        let user = self.users.update(&user).await?;

        info!("Email verified for user {}", user.id);
        self.notifier.welcome(&user.email, &user.full_name).await;

        let tokens = self.token_service.issue_pair(&user)?;
        Ok(AuthResult { user: user.to_profile(), tokens })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Validation("Неверные учетные данные".to_string()))?;

        if user.status == UserStatus::Deleted {
            return Err(AppError::Validation("Учетная запись удалена".to_string()));
        }
        if !user.email_verified {
            return Err(AppError::Validation("Email не подтвержден".to_string()));
        }
        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Validation("Неверные учетные данные".to_string()));
        }

        info!("User logged in: {}", user.id);
        let tokens = self.token_service.issue_pair(&user)?;
        Ok(AuthResult { user: user.to_profile(), tokens })
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResult, AppError> {
        let claims = self.token_service.decode(refresh_token)?;
        if claims.token_type != TOKEN_TYPE_REFRESH {
            return Err(AppError::Unauthorized("Неверный токен обновления".to_string()));
        }

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Пользователь не найден".to_string()))?;

        if user.status == UserStatus::Deleted {
            return Err(AppError::Unauthorized("Учетная запись удалена".to_string()));
        }
        if !user.email_verified {
            return Err(AppError::Unauthorized("Email не подтвержден".to_string()));
        }

        info!("Token refreshed for user: {}", user.id);
        let tokens = self.token_service.issue_pair(&user)?;
        Ok(AuthResult { user: user.to_profile(), tokens })
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Validation("Пользователь не найден".to_string()))?;

        self.reset_tokens.close_active(&user.id, None).await?;
        let token = PasswordResetToken::new(user.id.clone(), TOKEN_TTL_HOURS);
        self.reset_tokens.create(&token).await?;

        info!("Password reset requested for user {}", user.id);
        self.notifier.reset_link(&user.email, &token.token).await;
        Ok(())
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AppError> {
        let mut errors = BTreeMap::new();
        if let Some(msg) = validation::password_error(new_password) {
            errors.insert("password".to_string(), msg.to_string());
        }
        if new_password != confirm_password {
            errors.insert("confirmPassword".to_string(), "Пароли не совпадают".to_string());
        }
        if let Some((_, first)) = errors.first_key_value() {
            let message = first.clone();
            return Err(AppError::ValidationFields(message, errors));
        }

        let reset = self
            .reset_tokens
            .find_by_token(token)
            .await?
            .ok_or_else(|| AppError::Validation("Неверная ссылка".to_string()))?;

        if reset.consumed_at.is_some() {
            return Err(AppError::Validation("Ссылка уже использована".to_string()));
        }
        let now = Utc::now();
        if reset.is_expired(now) {
            return Err(AppError::Validation("Срок действия ссылки истёк".to_string()));
        }

        let mut user = self
            .users
            .find_by_id(&reset.user_id)
            .await?
            .ok_or_else(|| AppError::Validation("Пользователь не найден".to_string()))?;

        user.password_hash = hash_password(new_password)?;
        user.must_change_password = false;
        let user = self.users.update(&user).await?;

        self.reset_tokens.mark_consumed(&reset.id, now).await?;
        self.reset_tokens.close_active(&user.id, Some(&reset.id)).await?;

        info!("Password reset completed for user {}", user.id);
        self.notifier.password_changed(&user.email).await;
        Ok(())
    }

    /// Bootstrap guard: the moderation surface is unusable without at least
    /// one ADMIN account, so one is created with the configured default
    /// credential when none exists.
    pub async fn seed_admin_if_missing(&self, email: &str, password: &str) -> Result<(), AppError> {
        if self.users.exists_admin().await? {
            return Ok(());
        }

        let mut admin = User::new("Администратор".to_string(), email.to_string(), hash_password(password)?);
        admin.role = UserRole::Admin;
        admin.email_verified = true;
        admin.email_verified_at = Some(Utc::now());
        self.users.create(&admin).await?;

        info!("Seeded default admin account {}", email);
        Ok(())
    }
}
