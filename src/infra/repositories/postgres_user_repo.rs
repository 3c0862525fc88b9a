use crate::domain::{models::user::User, ports::UserRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{PgPool, Row};

pub struct PostgresUserRepo {
    pool: PgPool,
}

impl PostgresUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepo {
    async fn create(&self, user: &User) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, full_name, email, password_hash, role, status, registered_at, email_verified, email_verified_at, must_change_password)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *"
        )
            .bind(&user.id).bind(&user.full_name).bind(&user.email).bind(&user.password_hash)
            .bind(user.role.as_str()).bind(user.status.as_str()).bind(user.registered_at)
            .bind(user.email_verified).bind(user.email_verified_at).bind(user.must_change_password)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email).fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn exists_admin(&self) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM users WHERE role = 'ADMIN'")
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY registered_at ASC")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET full_name=$1, email=$2, password_hash=$3, role=$4, status=$5, email_verified=$6, email_verified_at=$7, must_change_password=$8
             WHERE id=$9
             RETURNING *"
        )
            .bind(&user.full_name).bind(&user.email).bind(&user.password_hash)
            .bind(user.role.as_str()).bind(user.status.as_str())
            .bind(user.email_verified).bind(user.email_verified_at).bind(user.must_change_password)
            .bind(&user.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
}
