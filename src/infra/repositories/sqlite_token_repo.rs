use crate::domain::{
    models::auth::{EmailVerificationToken, PasswordResetToken},
    ports::{ResetTokenRepository, VerificationTokenRepository},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteVerificationTokenRepo {
    pool: SqlitePool,
}

impl SqliteVerificationTokenRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationTokenRepository for SqliteVerificationTokenRepo {
    async fn create(&self, token: &EmailVerificationToken) -> Result<(), AppError> {
        sqlx::query("INSERT INTO email_verification_tokens (id, user_id, code, expires_at, consumed_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&token.id).bind(&token.user_id).bind(&token.code).bind(token.expires_at).bind(token.consumed_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<EmailVerificationToken>, AppError> {
        sqlx::query_as::<_, EmailVerificationToken>("SELECT * FROM email_verification_tokens WHERE code = ?")
            .bind(code).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_consumed(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE email_verification_tokens SET consumed_at = ? WHERE id = ?")
            .bind(at).bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn close_active(&self, user_id: &str, except: Option<&str>) -> Result<(), AppError> {
        sqlx::query("UPDATE email_verification_tokens SET consumed_at = ? WHERE user_id = ? AND consumed_at IS NULL AND id != ?")
            .bind(Utc::now()).bind(user_id).bind(except.unwrap_or(""))
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
}

pub struct SqliteResetTokenRepo {
    pool: SqlitePool,
}

impl SqliteResetTokenRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResetTokenRepository for SqliteResetTokenRepo {
    async fn create(&self, token: &PasswordResetToken) -> Result<(), AppError> {
        sqlx::query("INSERT INTO password_reset_tokens (id, user_id, token, expires_at, consumed_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&token.id).bind(&token.user_id).bind(&token.token).bind(token.expires_at).bind(token.consumed_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordResetToken>, AppError> {
        sqlx::query_as::<_, PasswordResetToken>("SELECT * FROM password_reset_tokens WHERE token = ?")
            .bind(token).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_consumed(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE password_reset_tokens SET consumed_at = ? WHERE id = ?")
            .bind(at).bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn close_active(&self, user_id: &str, except: Option<&str>) -> Result<(), AppError> {
        sqlx::query("UPDATE password_reset_tokens SET consumed_at = ? WHERE user_id = ? AND consumed_at IS NULL AND id != ?")
            .bind(Utc::now()).bind(user_id).bind(except.unwrap_or(""))
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
}
