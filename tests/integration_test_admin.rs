mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_bytes, event_payload, parse_body, TestApp};
use serde_json::json;
use sqlx::Row;

#[tokio::test]
async fn test_admin_surface_requires_admin_claim() {
    let app = TestApp::new().await;
    app.register_and_verify("Иванов Иван", "user@example.com", "Passw0rd!").await;
    let user_token = app.login("user@example.com", "Passw0rd!").await.access_token;

    let res = app.request("GET", "/admin/users", None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.request("GET", "/admin/users", None, Some(&user_token)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let admin_token = app.admin_token().await;
    let res = app.request("GET", "/admin/users", None, Some(&admin_token)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_user_filters() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    app.register_and_verify("Иванов Иван", "ivanov@example.com", "Passw0rd!").await;
    app.register_and_verify("Петров Пётр", "petrov@example.com", "Passw0rd!").await;

    let res = app.request("GET", "/admin/users?role=USER", None, Some(&token)).await;
    let list = parse_body(res).await;
    assert_eq!(list.as_array().unwrap().len(), 2);

    let res = app.request("GET", "/admin/users?role=ADMIN", None, Some(&token)).await;
    let list = parse_body(res).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["email"], common::ADMIN_EMAIL);

    // Case-insensitive name substring ("иванов", percent-encoded).
    let res = app
        .request(
            "GET",
            "/admin/users?query=%D0%B8%D0%B2%D0%B0%D0%BD%D0%BE%D0%B2",
            None,
            Some(&token),
        )
        .await;
    let list = parse_body(res).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["fullName"], "Иванов Иван");

    // Nothing registered before yesterday.
    let to = (Utc::now() - Duration::days(1)).to_rfc3339();
    let res = app
        .request("GET", &format!("/admin/users?registeredTo={}", urlencode(&to)), None, Some(&token))
        .await;
    let list = parse_body(res).await;
    assert!(list.as_array().unwrap().is_empty());

    // Password hashes never leave the service.
    let res = app.request("GET", "/admin/users", None, Some(&token)).await;
    let list = parse_body(res).await;
    assert!(list[0].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_admin_updates_user_fields() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let user_id = app.register_and_verify("Иванов Иван", "ivanov@example.com", "Passw0rd!").await;

    let res = app
        .request(
            "PATCH",
            &format!("/admin/users/{}", user_id),
            Some(json!({ "fullName": "Сидоров Сидор", "role": "ADMIN" })),
            Some(&token),
        )
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["fullName"], "Сидоров Сидор");
    assert_eq!(body["role"], "ADMIN");
}

#[tokio::test]
async fn test_admin_forced_password_reset() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let user_id = app.register_and_verify("Иванов Иван", "ivanov@example.com", "Passw0rd!").await;

    // Policy still applies to admin-set passwords.
    let res = app
        .request(
            "POST",
            &format!("/admin/users/{}/reset-password", user_id),
            Some(json!({ "newPassword": "weak" })),
            Some(&token),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .request(
            "POST",
            &format!("/admin/users/{}/reset-password", user_id),
            Some(json!({ "newPassword": "Forced1!pass" })),
            Some(&token),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let row = sqlx::query("SELECT must_change_password FROM users WHERE id = ?")
        .bind(&user_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert!(row.get::<bool, _>("must_change_password"));

    app.login("ivanov@example.com", "Forced1!pass").await;

    let mails = app.mails.lock().unwrap().clone();
    assert!(mails
        .iter()
        .any(|m| m.recipient == "ivanov@example.com" && m.body.contains("сброшен администратором")));
}

#[tokio::test]
async fn test_admin_soft_delete_blocks_login() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let user_id = app.register_and_verify("Иванов Иван", "ivanov@example.com", "Passw0rd!").await;

    let res = app
        .request("DELETE", &format!("/admin/users/{}", user_id), None, Some(&token))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    // The row survives with DELETED status.
    let row = sqlx::query("SELECT status FROM users WHERE id = ?")
        .bind(&user_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(row.get::<String, _>("status"), "DELETED");

    let res = app
        .request(
            "POST",
            "/auth/login",
            Some(json!({ "email": "ivanov@example.com", "password": "Passw0rd!" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(res).await;
    assert_eq!(body["message"], "Учетная запись удалена");
}

#[tokio::test]
async fn test_admin_event_listing_filters_by_status() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let user_id = app.register_and_verify("Иванов Иван", "ivanov@example.com", "Passw0rd!").await;

    // One PENDING user submission, one ACTIVE admin event.
    app.request("POST", &format!("/events?creatorId={}", user_id), Some(event_payload("Пикник", 2, 2)), None)
        .await;
    app.request("POST", "/admin/events", Some(event_payload("Концерт", 2, 2)), Some(&token))
        .await;

    let res = app.request("GET", "/admin/events", None, Some(&token)).await;
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 2);

    let res = app.request("GET", "/admin/events?status=PENDING", None, Some(&token)).await;
    let list = parse_body(res).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "Пикник");
}

#[tokio::test]
async fn test_admin_event_detail_includes_roster() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let user_id = app.register_and_verify("Иванов Иван", "ivanov@example.com", "Passw0rd!").await;

    let res = app
        .request(
            "POST",
            "/admin/events",
            Some({
                let mut p = event_payload("Концерт", 2, 2);
                p["participantIds"] = json!([user_id]);
                p
            }),
            Some(&token),
        )
        .await;
    let event_id = parse_body(res).await["event"]["id"].as_str().unwrap().to_string();

    let res = app.request("GET", &format!("/admin/events/{}", event_id), None, Some(&token)).await;
    let body = parse_body(res).await;
    assert_eq!(body["event"]["title"], "Концерт");
    assert_eq!(body["participants"].as_array().unwrap().len(), 1);
    assert_eq!(body["participants"][0]["userId"], user_id);
    assert_eq!(body["participants"][0]["status"], "CONFIRMED");
}

#[tokio::test]
async fn test_moderation_approve_publishes_pending_event() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let user_id = app.register_and_verify("Иванов Иван", "ivanov@example.com", "Passw0rd!").await;

    let res = app
        .request("POST", &format!("/events?creatorId={}", user_id), Some(event_payload("Пикник", 2, 2)), None)
        .await;
    let event_id = parse_body(res).await["id"].as_str().unwrap().to_string();

    let res = app
        .request("POST", &format!("/admin/events/{}/approve", event_id), None, Some(&token))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.request("GET", "/events?tab=active", None, None).await;
    let list = parse_body(res).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "Пикник");
}

#[tokio::test]
async fn test_admin_delete_rejects_event() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let res = app
        .request("POST", "/admin/events", Some(event_payload("Концерт", 2, 2)), Some(&token))
        .await;
    let event_id = parse_body(res).await["event"]["id"].as_str().unwrap().to_string();

    let res = app
        .request("DELETE", &format!("/admin/events/{}", event_id), None, Some(&token))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.request("GET", &format!("/events/{}", event_id), None, None).await;
    assert_eq!(parse_body(res).await["status"], "REJECTED");
}

#[tokio::test]
async fn test_roster_sync_to_requested_set() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let user_a = app.register_and_verify("Иванов Иван", "a@example.com", "Passw0rd!").await;
    let user_b = app.register_and_verify("Петров Пётр", "b@example.com", "Passw0rd!").await;

    let res = app
        .request(
            "POST",
            "/admin/events",
            Some({
                let mut p = event_payload("Концерт", 2, 2);
                p["participantIds"] = json!([user_a]);
                p
            }),
            Some(&token),
        )
        .await;
    let body = parse_body(res).await;
    let event_id = body["event"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["participants"].as_array().unwrap().len(), 1);

    // Re-sync to user B only: A is dropped, B is added.
    let res = app
        .request(
            "PUT",
            &format!("/admin/events/{}", event_id),
            Some({
                let mut p = event_payload("Концерт", 2, 2);
                p["imageBase64"] = json!(null);
                p["participantIds"] = json!([user_b]);
                p
            }),
            Some(&token),
        )
        .await;
    let body = parse_body(res).await;
    let roster = body["participants"].as_array().unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0]["userId"], user_b);
}

#[tokio::test]
async fn test_participant_csv_export() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let user_id = app.register_and_verify("Иванов Иван", "ivanov@example.com", "Passw0rd!").await;

    let res = app
        .request(
            "POST",
            "/admin/events",
            Some({
                let mut p = event_payload("Концерт", 2, 2);
                p["participantIds"] = json!([user_id]);
                p
            }),
            Some(&token),
        )
        .await;
    let event_id = parse_body(res).await["event"]["id"].as_str().unwrap().to_string();

    let res = app
        .request("GET", &format!("/admin/events/{}/export/csv", event_id), None, Some(&token))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-type"].to_str().unwrap().starts_with("text/csv"));
    let csv = String::from_utf8(body_bytes(res).await).unwrap();
    assert_eq!(csv, "fullName;email\nИванов Иван;ivanov@example.com\n");

    // The public export surface returns the same lines as JSON.
    let res = app.request("GET", &format!("/events/{}/export", event_id), None, None).await;
    let lines = parse_body(res).await;
    assert_eq!(lines, json!(["Иванов Иван;ivanov@example.com"]));
}

#[tokio::test]
async fn test_xlsx_exports_are_zip_containers() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let user_id = app.register_and_verify("Иванов Иван", "ivanov@example.com", "Passw0rd!").await;

    let res = app
        .request(
            "POST",
            "/admin/events",
            Some({
                let mut p = event_payload("Концерт", 2, 2);
                p["participantIds"] = json!([user_id]);
                p
            }),
            Some(&token),
        )
        .await;
    let event_id = parse_body(res).await["event"]["id"].as_str().unwrap().to_string();

    let res = app
        .request("GET", &format!("/admin/events/{}/export/xlsx", event_id), None, Some(&token))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-type"].to_str().unwrap().contains("spreadsheetml"));
    let bytes = body_bytes(res).await;
    assert_eq!(&bytes[0..2], b"PK");

    let res = app.request("GET", "/admin/events/export/xlsx", None, Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = body_bytes(res).await;
    assert_eq!(&bytes[0..2], b"PK");
}

#[tokio::test]
async fn test_events_csv_export() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    app.request("POST", "/admin/events", Some(event_payload("Концерт", 2, 2)), Some(&token))
        .await;

    let res = app.request("GET", "/admin/events/export/csv", None, Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let csv = String::from_utf8(body_bytes(res).await).unwrap();
    assert!(csv.starts_with("id;title;status;startAt;endAt;participants\n"));
    assert!(csv.contains("Концерт;ACTIVE;"));
}

fn urlencode(value: &str) -> String {
    value.replace('+', "%2B").replace(':', "%3A")
}
