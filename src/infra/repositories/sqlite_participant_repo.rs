use crate::domain::{
    models::participant::{EventParticipant, ParticipantCount},
    ports::ParticipantRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

pub struct SqliteParticipantRepo {
    pool: SqlitePool,
}

impl SqliteParticipantRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantRepository for SqliteParticipantRepo {
    async fn confirm(
        &self,
        event_id: &str,
        user_id: &str,
        capacity: Option<i64>,
    ) -> Result<EventParticipant, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        if let Some(max) = capacity {
            let row = sqlx::query("SELECT COUNT(*) as count FROM event_participants WHERE event_id = ? AND status = 'CONFIRMED'")
                .bind(event_id).fetch_one(&mut *tx).await.map_err(AppError::Database)?;
            if row.get::<i64, _>("count") >= max {
                return Err(AppError::Validation("Достигнут максимальный лимит участников".into()));
            }
        }

        let existing = sqlx::query_as::<_, EventParticipant>("SELECT * FROM event_participants WHERE event_id = ? AND user_id = ?")
            .bind(event_id).bind(user_id).fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let saved = match existing {
            Some(participant) => {
                sqlx::query_as::<_, EventParticipant>(
                    "UPDATE event_participants SET status = 'CONFIRMED', confirmed_at = ?, cancelled_at = NULL WHERE id = ? RETURNING *"
                )
                    .bind(Utc::now()).bind(&participant.id)
                    .fetch_one(&mut *tx).await.map_err(AppError::Database)?
            }
            None => {
                let participant = EventParticipant::new(event_id.to_string(), user_id.to_string());
                sqlx::query_as::<_, EventParticipant>(
                    "INSERT INTO event_participants (id, event_id, user_id, status, confirmed_at, cancelled_at)
                     VALUES (?, ?, ?, ?, ?, ?)
                     RETURNING *"
                )
                    .bind(&participant.id).bind(&participant.event_id).bind(&participant.user_id)
                    .bind(participant.status.as_str()).bind(participant.confirmed_at).bind(participant.cancelled_at)
                    .fetch_one(&mut *tx).await.map_err(AppError::Database)?
            }
        };

        tx.commit().await.map_err(AppError::Database)?;
        Ok(saved)
    }

    async fn find_by_event_and_user(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<Option<EventParticipant>, AppError> {
        sqlx::query_as::<_, EventParticipant>("SELECT * FROM event_participants WHERE event_id = ? AND user_id = ?")
            .bind(event_id).bind(user_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, participant: &EventParticipant) -> Result<EventParticipant, AppError> {
        sqlx::query_as::<_, EventParticipant>(
            "UPDATE event_participants SET status = ?, confirmed_at = ?, cancelled_at = ? WHERE id = ? RETURNING *"
        )
            .bind(participant.status.as_str()).bind(participant.confirmed_at).bind(participant.cancelled_at)
            .bind(&participant.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<EventParticipant>, AppError> {
        sqlx::query_as::<_, EventParticipant>("SELECT * FROM event_participants WHERE event_id = ? ORDER BY confirmed_at ASC")
            .bind(event_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<EventParticipant>, AppError> {
        sqlx::query_as::<_, EventParticipant>("SELECT * FROM event_participants WHERE user_id = ?")
            .bind(user_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn count_confirmed(&self, event_id: &str) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM event_participants WHERE event_id = ? AND status = 'CONFIRMED'")
            .bind(event_id).fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn counts_confirmed(&self) -> Result<Vec<ParticipantCount>, AppError> {
        sqlx::query_as::<_, ParticipantCount>(
            "SELECT event_id, COUNT(*) as count FROM event_participants WHERE status = 'CONFIRMED' GROUP BY event_id"
        )
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM event_participants WHERE id = ?")
            .bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Участие не найдено".into()));
        }
        Ok(())
    }
}
