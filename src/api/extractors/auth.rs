use crate::domain::models::auth::Claims;
use crate::domain::services::token_service::TOKEN_TYPE_ACCESS;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::Span;

/// The single authorization gate for the moderation surface: a verified
/// ADMIN role claim inside the signed access token, taken from the auth
/// cookie or a bearer header.
pub struct AdminUser(pub Claims);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let cookie_token = parts
            .extensions
            .get::<Cookies>()
            .and_then(|cookies| cookies.get("access_token").map(|c| c.value().to_string()));

        let bearer_token = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|t| t.to_string());

        let token = cookie_token
            .or(bearer_token)
            .ok_or_else(|| AppError::Unauthorized("Требуется авторизация".to_string()))?;

        let claims = app_state.token_service.decode(&token)?;
        if claims.token_type != TOKEN_TYPE_ACCESS {
            return Err(AppError::Unauthorized("Неверный токен".to_string()));
        }
        if claims.role != "ADMIN" {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Span::current().record("user_id", &claims.sub);

        Ok(AdminUser(claims))
    }
}
