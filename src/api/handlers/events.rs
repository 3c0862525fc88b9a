use crate::api::dtos::requests::{
    CreatorQuery, EventPayload, ListEventsQuery, RatingRequest, RequiredUserQuery, UserIdQuery,
};
use crate::api::extractors::auth::AdminUser;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;
use tracing::info;

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let tab = query.tab.as_deref().unwrap_or("my");
    let events = state.event_service.list_events(tab, query.user_id.as_deref()).await?;
    Ok(Json(events))
}

pub async fn user_events(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let events = state.event_service.list_events("my", Some(&user_id)).await?;
    Ok(Json(events))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<UserIdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let dto = state.event_service.get_event_details(&id, query.user_id.as_deref()).await?;
    Ok(Json(dto))
}

pub async fn get_event_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_service.get_event(&id).await?;
    let data = event
        .image_data
        .ok_or_else(|| AppError::NotFound("Изображение не найдено".to_string()))?;

    let bytes = general_purpose::STANDARD
        .decode(data.as_bytes())
        .map_err(|_| AppError::Internal)?;
    let content_type = event.image_content_type.unwrap_or_else(|| "image/jpeg".to_string());

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

pub async fn participation_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<UserIdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let status = state.event_service.participation_status(&id, query.user_id.as_deref()).await?;
    Ok(Json(status))
}

pub async fn confirm_participation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<RequiredUserQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.event_service.confirm_participation(&id, &query.user_id).await?;
    Ok(Json(serde_json::json!({ "message": "Участие подтверждено" })))
}

pub async fn cancel_participation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<RequiredUserQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.event_service.cancel_participation(&id, &query.user_id).await?;
    Ok(Json(serde_json::json!({ "message": "Участие отменено" })))
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CreatorQuery>,
    Json(payload): Json<EventPayload>,
) -> Result<impl IntoResponse, AppError> {
    let draft = payload.to_draft()?;
    let event = state.event_service.create_event(&draft, &query.creator_id).await?;
    Ok(Json(event))
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<EventPayload>,
) -> Result<impl IntoResponse, AppError> {
    let draft = payload.to_draft()?;
    state.event_service.update_event(&id, &draft).await?;
    Ok(Json(serde_json::json!({ "message": "Обновлено" })))
}

pub async fn reject_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.event_service.reject_event(&id).await?;
    Ok(Json(serde_json::json!({ "status": "rejected" })))
}

pub async fn rate_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<UserIdQuery>,
    Json(payload): Json<RatingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let author_id = payload
        .user_id
        .or(query.user_id)
        .ok_or_else(|| AppError::Validation("userId is required".to_string()))?;

    state.event_service.add_rating(&id, &author_id, payload.score, payload.comment).await?;
    Ok(Json(serde_json::json!({ "message": "Оценка сохранена" })))
}

pub async fn get_ratings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ratings = state.event_service.get_ratings(&id).await?;
    Ok(Json(ratings))
}

pub async fn export_participants(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let lines = state.event_service.export_participants(&id).await?;
    info!("Exported {} participant lines for event {}", lines.len(), id);
    Ok(Json(lines))
}
