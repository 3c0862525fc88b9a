use crate::domain::{
    models::rating::{EventRating, RatingAggregate},
    ports::RatingRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteRatingRepo {
    pool: SqlitePool,
}

impl SqliteRatingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RatingRepository for SqliteRatingRepo {
    async fn create(&self, rating: &EventRating) -> Result<EventRating, AppError> {
        sqlx::query_as::<_, EventRating>(
            "INSERT INTO event_ratings (id, event_id, user_id, score, comment, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&rating.id).bind(&rating.event_id).bind(&rating.user_id)
            .bind(rating.score).bind(&rating.comment).bind(rating.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_event_and_user(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<EventRating>, AppError> {
        sqlx::query_as::<_, EventRating>("SELECT * FROM event_ratings WHERE event_id = ? AND user_id = ?")
            .bind(event_id).bind(user_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<EventRating>, AppError> {
        sqlx::query_as::<_, EventRating>("SELECT * FROM event_ratings WHERE event_id = ? ORDER BY created_at DESC")
            .bind(event_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn aggregate(&self, event_id: &str) -> Result<Option<RatingAggregate>, AppError> {
        sqlx::query_as::<_, RatingAggregate>(
            "SELECT event_id, AVG(score) as average, COUNT(*) as count FROM event_ratings WHERE event_id = ? GROUP BY event_id"
        )
            .bind(event_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn aggregates(&self) -> Result<Vec<RatingAggregate>, AppError> {
        sqlx::query_as::<_, RatingAggregate>(
            "SELECT event_id, AVG(score) as average, COUNT(*) as count FROM event_ratings GROUP BY event_id"
        )
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
