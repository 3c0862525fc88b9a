use crate::api::dtos::requests::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, VerifyEmailRequest,
};
use crate::api::dtos::responses::{LoginResponse, RegistrationResponse};
use crate::domain::models::auth::AuthTokens;
use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;
use time::Duration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .auth_service
        .register(&payload.full_name, &payload.email, &payload.password, &payload.confirm_password)
        .await?;

    Ok(Json(RegistrationResponse {
        message: "Регистрация создана. Проверьте почту для подтверждения.".to_string(),
        user,
    }))
}

pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.auth_service.verify_email(&payload.email, &payload.code).await?;

    set_auth_cookies(&state, &cookies, &result.tokens);
    Ok(Json(LoginResponse { message: "Email подтвержден".to_string(), user: result.user }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.auth_service.login(&payload.email, &payload.password).await?;

    set_auth_cookies(&state, &cookies, &result.tokens);
    Ok(Json(LoginResponse { message: "Успешный вход".to_string(), user: result.user }))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    let refresh_cookie = cookies
        .get("refresh_token")
        .ok_or_else(|| AppError::Validation("Отсутствует refresh токен".to_string()))?;

    let result = state.auth_service.refresh(refresh_cookie.value()).await?;

    set_auth_cookies(&state, &cookies, &result.tokens);
    Ok(Json(LoginResponse { message: "Токены обновлены".to_string(), user: result.user }))
}

pub async fn logout(cookies: Cookies) -> Result<impl IntoResponse, AppError> {
    cookies.remove(Cookie::build(("access_token", "")).path("/").into());
    cookies.remove(Cookie::build(("refresh_token", "")).path("/").into());

    Ok(Json(serde_json::json!({ "message": "Сессия завершена" })))
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.request_password_reset(&payload.email).await?;
    Ok(Json(serde_json::json!({ "message": "Письмо отправлено" })))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .reset_password(&payload.token, &payload.password, &payload.confirm_password)
        .await?;
    Ok(Json(serde_json::json!({ "message": "Пароль обновлен" })))
}

fn set_auth_cookies(state: &AppState, cookies: &Cookies, tokens: &AuthTokens) {
    let mut access = Cookie::new("access_token", tokens.access_token.clone());
    access.set_http_only(true);
    access.set_same_site(SameSite::Lax);
    access.set_path("/");
    access.set_max_age(Duration::minutes(state.token_service.access_token_minutes()));
    cookies.add(access);

    let mut refresh = Cookie::new("refresh_token", tokens.refresh_token.clone());
    refresh.set_http_only(true);
    refresh.set_same_site(SameSite::Lax);
    refresh.set_path("/");
    refresh.set_max_age(Duration::days(state.token_service.refresh_token_days()));
    cookies.add(refresh);
}
