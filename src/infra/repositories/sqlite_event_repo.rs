use crate::domain::{
    models::event::{Event, EventStatus},
    ports::EventRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteEventRepo {
    pool: SqlitePool,
}

impl SqliteEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, title, short_description, full_description, start_at, end_at, image_data, image_content_type, payment_info, max_participants, status, created_by)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&event.id).bind(&event.title).bind(&event.short_description).bind(&event.full_description)
            .bind(event.start_at).bind(event.end_at).bind(&event.image_data).bind(&event.image_content_type)
            .bind(&event.payment_info).bind(event.max_participants).bind(event.status.as_str()).bind(&event.created_by)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY start_at ASC")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_status(&self, status: EventStatus) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE status = ? ORDER BY start_at ASC")
            .bind(status.as_str()).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            "UPDATE events SET title=?, short_description=?, full_description=?, start_at=?, end_at=?, image_data=?, image_content_type=?, payment_info=?, max_participants=?, status=?
             WHERE id=?
             RETURNING *"
        )
            .bind(&event.title).bind(&event.short_description).bind(&event.full_description)
            .bind(event.start_at).bind(event.end_at).bind(&event.image_data).bind(&event.image_content_type)
            .bind(&event.payment_info).bind(event.max_participants).bind(event.status.as_str())
            .bind(&event.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_status(&self, id: &str, status: EventStatus) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE events SET status = ? WHERE id = ?")
            .bind(status.as_str()).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Событие не найдено".into()));
        }
        Ok(())
    }
}
