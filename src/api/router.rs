use axum::{
    body::Body,
    extract::Request,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;

use crate::api::handlers::{admin_events, admin_users, auth, events, health};
use crate::state::AppState;
use tower_cookies::CookieManagerLayer;
use tower_http::{classify::ServerErrorsFailureClass, trace::TraceLayer};
use tracing::{error, info, info_span, Span};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))

        // Events
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/{id}", get(events::get_event).put(events::update_event))
        .route("/events/{id}/image", get(events::get_event_image))
        .route("/events/{id}/status", get(events::participation_status))
        .route("/events/{id}/confirm", post(events::confirm_participation))
        .route("/events/{id}/cancel", post(events::cancel_participation))
        .route("/events/{id}/reject", post(events::reject_event))
        .route("/events/{id}/rate", post(events::rate_event))
        .route("/events/{id}/ratings", get(events::get_ratings).post(events::rate_event))
        .route("/events/{id}/export", get(events::export_participants))
        .route("/users/{user_id}/events", get(events::user_events))

        // Admin: users
        .route("/admin/users", get(admin_users::list_users))
        .route("/admin/users/{id}", patch(admin_users::update_user).delete(admin_users::delete_user))
        .route("/admin/users/{id}/reset-password", post(admin_users::reset_password))

        // Admin: events & exports
        .route("/admin/events", get(admin_events::list_events).post(admin_events::create_event))
        .route("/admin/events/export/csv", get(admin_events::export_events_csv))
        .route("/admin/events/export/xlsx", get(admin_events::export_events_xlsx))
        .route("/admin/events/{id}", get(admin_events::get_event).put(admin_events::update_event).delete(admin_events::delete_event))
        .route("/admin/events/{id}/approve", post(admin_events::approve_event))
        .route("/admin/events/{id}/reject", post(admin_events::reject_event))
        .route("/admin/events/{id}/export/csv", get(admin_events::export_participants_csv))
        .route("/admin/events/{id}/export/xlsx", get(admin_events::export_participants_xlsx))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
