use crate::api::dtos::requests::{AdminResetPasswordRequest, AdminUpdateUserRequest, AdminUsersQuery};
use crate::api::extractors::auth::AdminUser;
use crate::domain::models::user::UserStatus;
use crate::domain::services::auth_service::hash_password;
use crate::domain::services::validation;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::info;

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<AdminUsersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let needle = query.query.as_deref().unwrap_or("").to_lowercase();

    let users: Vec<_> = state
        .user_repo
        .list()
        .await?
        .into_iter()
        .filter(|user| {
            query.role.is_none_or(|role| user.role == role)
                && query.status.is_none_or(|status| user.status == status)
                && (needle.is_empty() || user.full_name.to_lowercase().contains(&needle))
                && query.registered_from.is_none_or(|from| user.registered_at > from)
                && query.registered_to.is_none_or(|to| user.registered_at < to)
        })
        .collect();

    Ok(Json(users))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut user = state
        .user_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Пользователь не найден".to_string()))?;

    if let Some(full_name) = payload.full_name {
        user.full_name = full_name;
    }
    if let Some(role) = payload.role {
        user.role = role;
    }
    if let Some(status) = payload.status {
        user.status = status;
    }

    let updated = state.user_repo.update(&user).await?;
    info!("Admin updated user {}", updated.id);
    Ok(Json(updated))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<AdminResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut user = state
        .user_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Пользователь не найден".to_string()))?;

    validation::validate_password(&payload.new_password)?;

    user.password_hash = hash_password(&payload.new_password)?;
    user.must_change_password = true;
    let user = state.user_repo.update(&user).await?;

    info!("Admin reset password for user {}", user.id);
    state.notifier.password_reset_by_admin(&user.email).await;

    Ok(Json(serde_json::json!({ "message": "Пароль обновлен администратором" })))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut user = state
        .user_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Пользователь не найден".to_string()))?;

    user.status = UserStatus::Deleted;
    state.user_repo.update(&user).await?;

    info!("Admin soft-deleted user {}", id);
    Ok(Json(serde_json::json!({ "status": "deleted" })))
}
