use crate::api::dtos::requests::{AdminEventsQuery, EventPayload};
use crate::api::extractors::auth::AdminUser;
use crate::domain::models::participant::EventParticipant;
use crate::domain::models::user::UserRole;
use crate::domain::services::export::{self, EventRow};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::info;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<AdminEventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let events = match query.status {
        Some(status) => state.event_repo.list_by_status(status).await?,
        None => state.event_repo.list().await?,
    };

    let counts: HashMap<String, i64> = state
        .participant_repo
        .counts_confirmed()
        .await?
        .into_iter()
        .map(|c| (c.event_id, c.count))
        .collect();

    let items: Vec<_> = events
        .into_iter()
        .map(|event| {
            serde_json::json!({
                "id": event.id,
                "title": event.title,
                "status": event.status,
                "startAt": event.start_at,
                "endAt": event.end_at,
                "participants": counts.get(&event.id).copied().unwrap_or(0),
            })
        })
        .collect();

    Ok(Json(items))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_service.get_event(&id).await?;
    let participants = state.participant_repo.list_by_event(&event.id).await?;
    Ok(Json(serde_json::json!({ "event": event, "participants": participants })))
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(payload): Json<EventPayload>,
) -> Result<impl IntoResponse, AppError> {
    let creator_id = match &payload.created_by {
        Some(id) => id.clone(),
        None => resolve_admin_creator(&state).await?,
    };

    let draft = payload.to_draft()?;
    let event = state.event_service.create_event(&draft, &creator_id).await?;

    // The roster becomes exactly the requested set; an omitted list means
    // nobody, including the auto-enrolled creator.
    let desired = payload.participant_ids.clone().unwrap_or_default();
    let participants = sync_participants(&state, &event.id, &desired).await?;

    Ok(Json(serde_json::json!({ "event": event, "participants": participants })))
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<EventPayload>,
) -> Result<impl IntoResponse, AppError> {
    let draft = payload.to_draft()?;
    let event = state.event_service.update_event(&id, &draft).await?;

    let desired = payload.participant_ids.clone().unwrap_or_default();
    let participants = sync_participants(&state, &event.id, &desired).await?;

    Ok(Json(serde_json::json!({ "event": event, "participants": participants })))
}

pub async fn approve_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.event_service.approve_event(&id).await?;
    Ok(Json(serde_json::json!({ "status": "approved" })))
}

pub async fn reject_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.event_service.reject_event(&id).await?;
    Ok(Json(serde_json::json!({ "status": "rejected" })))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    // Moderation delete keeps the row: the event is rejected, never dropped.
    state.event_service.reject_event(&id).await?;
    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

pub async fn export_events_csv(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let rows = event_rows(&state).await?;
    let csv = export::events_csv(&rows);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, "attachment; filename=events.csv".to_string()),
        ],
        csv,
    ))
}

pub async fn export_events_xlsx(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let rows = event_rows(&state).await?;
    let bytes = export::events_xlsx(&rows)?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, "attachment; filename=events.xlsx".to_string()),
        ],
        bytes,
    ))
}

pub async fn export_participants_csv(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state.event_service.participant_export_rows(&id).await?;
    let csv = export::participants_csv(&rows);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=participants-{}.csv", id),
            ),
        ],
        csv,
    ))
}

pub async fn export_participants_xlsx(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state.event_service.participant_export_rows(&id).await?;
    let bytes = export::participants_xlsx(&rows)?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=participants-{}.xlsx", id),
            ),
        ],
        bytes,
    ))
}

async fn event_rows(state: &AppState) -> Result<Vec<EventRow>, AppError> {
    let counts: HashMap<String, i64> = state
        .participant_repo
        .counts_confirmed()
        .await?
        .into_iter()
        .map(|c| (c.event_id, c.count))
        .collect();

    Ok(state
        .event_repo
        .list()
        .await?
        .into_iter()
        .map(|event| EventRow {
            participants_count: counts.get(&event.id).copied().unwrap_or(0),
            id: event.id,
            title: event.title,
            status: event.status.as_str().to_string(),
            start_at: event.start_at,
            end_at: event.end_at,
        })
        .collect())
}

async fn resolve_admin_creator(state: &AppState) -> Result<String, AppError> {
    state
        .user_repo
        .list()
        .await?
        .into_iter()
        .find(|user| user.role == UserRole::Admin)
        .map(|user| user.id)
        .ok_or_else(|| AppError::Validation("Создайте администратора".to_string()))
}

/// Brings the roster to exactly the requested set: confirms missing
/// members, drops everyone else.
async fn sync_participants(
    state: &AppState,
    event_id: &str,
    desired: &[String],
) -> Result<Vec<EventParticipant>, AppError> {
    let desired: BTreeSet<&str> = desired.iter().map(|s| s.as_str()).collect();
    let existing = state.participant_repo.list_by_event(event_id).await?;

    for participant in &existing {
        if !desired.contains(participant.user_id.as_str()) {
            state.participant_repo.delete(&participant.id).await?;
        }
    }

    let current: BTreeSet<&str> = existing.iter().map(|p| p.user_id.as_str()).collect();
    for user_id in desired {
        if !current.contains(user_id) {
            state.participant_repo.confirm(event_id, user_id, None).await?;
        }
    }

    info!("Synced participant roster for event {}", event_id);
    state.participant_repo.list_by_event(event_id).await
}
