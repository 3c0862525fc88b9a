use crate::domain::{
    models::event::{Event, EventStatus},
    ports::EventRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, title, short_description, full_description, start_at, end_at, image_data, image_content_type, payment_info, max_participants, status, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING *"
        )
            .bind(&event.id).bind(&event.title).bind(&event.short_description).bind(&event.full_description)
            .bind(event.start_at).bind(event.end_at).bind(&event.image_data).bind(&event.image_content_type)
            .bind(&event.payment_info).bind(event.max_participants).bind(event.status.as_str()).bind(&event.created_by)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY start_at ASC")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_status(&self, status: EventStatus) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE status = $1 ORDER BY start_at ASC")
            .bind(status.as_str()).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            "UPDATE events SET title=$1, short_description=$2, full_description=$3, start_at=$4, end_at=$5, image_data=$6, image_content_type=$7, payment_info=$8, max_participants=$9, status=$10
             WHERE id=$11
             RETURNING *"
        )
            .bind(&event.title).bind(&event.short_description).bind(&event.full_description)
            .bind(event.start_at).bind(event.end_at).bind(&event.image_data).bind(&event.image_content_type)
            .bind(&event.payment_info).bind(event.max_participants).bind(event.status.as_str())
            .bind(&event.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_status(&self, id: &str, status: EventStatus) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE events SET status = $1 WHERE id = $2")
            .bind(status.as_str()).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Событие не найдено".into()));
        }
        Ok(())
    }
}
