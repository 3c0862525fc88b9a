mod common;

use axum::http::StatusCode;
use common::{event_payload, parse_body, TestApp};
use serde_json::json;

/// Active admin event with an empty roster plus one confirmed user; the
/// event is then aged into the PAST window.
async fn past_event_with_participant(app: &TestApp) -> (String, String) {
    let token = app.admin_token().await;
    let res = app
        .request("POST", "/admin/events", Some(event_payload("Лекция", 2, 2)), Some(&token))
        .await;
    let event_id = parse_body(res).await["event"]["id"].as_str().unwrap().to_string();

    let user_id = app.register_and_verify("Иванов Иван", "rater@example.com", "Passw0rd!").await;
    let res = app
        .request("POST", &format!("/events/{}/confirm?userId={}", event_id, user_id), None, None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    app.age_event(&event_id).await;
    (event_id, user_id)
}

#[tokio::test]
async fn test_rating_requires_past_event() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let res = app
        .request("POST", "/admin/events", Some(event_payload("Лекция", 2, 2)), Some(&token))
        .await;
    let event_id = parse_body(res).await["event"]["id"].as_str().unwrap().to_string();
    let user_id = app.register_and_verify("Иванов Иван", "rater@example.com", "Passw0rd!").await;
    app.request("POST", &format!("/events/{}/confirm?userId={}", event_id, user_id), None, None)
        .await;

    let res = app
        .request(
            "POST",
            &format!("/events/{}/rate", event_id),
            Some(json!({ "userId": user_id, "score": 4, "comment": null })),
            None,
        )
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(res).await;
    assert_eq!(body["message"], "Оценивать можно только прошедшие события");
}

#[tokio::test]
async fn test_rating_requires_confirmed_participation() {
    let app = TestApp::new().await;
    let (event_id, _) = past_event_with_participant(&app).await;
    let outsider = app.register_and_verify("Петров Пётр", "other@example.com", "Passw0rd!").await;

    let res = app
        .request(
            "POST",
            &format!("/events/{}/rate", event_id),
            Some(json!({ "userId": outsider, "score": 4 })),
            None,
        )
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(res).await;
    assert!(body["message"].as_str().unwrap().contains("подтвержденным участником"));
}

#[tokio::test]
async fn test_cancelled_participant_cannot_rate() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let res = app
        .request("POST", "/admin/events", Some(event_payload("Лекция", 2, 2)), Some(&token))
        .await;
    let event_id = parse_body(res).await["event"]["id"].as_str().unwrap().to_string();
    let user_id = app.register_and_verify("Иванов Иван", "rater@example.com", "Passw0rd!").await;

    app.request("POST", &format!("/events/{}/confirm?userId={}", event_id, user_id), None, None)
        .await;
    app.request("POST", &format!("/events/{}/cancel?userId={}", event_id, user_id), None, None)
        .await;
    app.age_event(&event_id).await;

    let res = app
        .request(
            "POST",
            &format!("/events/{}/rate", event_id),
            Some(json!({ "userId": user_id, "score": 4 })),
            None,
        )
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rating_score_bounds() {
    let app = TestApp::new().await;
    let (event_id, user_id) = past_event_with_participant(&app).await;

    for score in [0, 6, -1] {
        let res = app
            .request(
                "POST",
                &format!("/events/{}/rate", event_id),
                Some(json!({ "userId": user_id, "score": score })),
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "score {} must be rejected", score);
        let body = parse_body(res).await;
        assert_eq!(body["message"], "Оценка 1-5");
    }
}

#[tokio::test]
async fn test_rating_success_feeds_aggregate() {
    let app = TestApp::new().await;
    let (event_id, user_id) = past_event_with_participant(&app).await;

    let res = app
        .request(
            "POST",
            &format!("/events/{}/rate", event_id),
            Some(json!({ "userId": user_id, "score": 3, "comment": "Хорошо" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.request("GET", &format!("/events/{}", event_id), None, None).await;
    let body = parse_body(res).await;
    assert_eq!(body["averageRating"], 3.0);
    assert_eq!(body["ratingsCount"], 1);

    let res = app.request("GET", &format!("/events/{}/ratings", event_id), None, None).await;
    let body = parse_body(res).await;
    assert_eq!(body["average"], 3.0);
    assert_eq!(body["count"], 1);
    assert_eq!(body["ratings"][0]["score"], 3);
    assert_eq!(body["ratings"][0]["comment"], "Хорошо");
    assert_eq!(body["ratings"][0]["userName"], "Иванов Иван");
}

#[tokio::test]
async fn test_average_over_multiple_raters() {
    let app = TestApp::new().await;
    let (event_id, user_a) = past_event_with_participant(&app).await;

    // Second confirmed participant, enrolled while the event window is
    // shifted back to ACTIVE, then aged again.
    let user_b = app.register_and_verify("Петров Пётр", "b@example.com", "Passw0rd!").await;
    sqlx::query("UPDATE events SET start_at = ?, end_at = ?, status = 'ACTIVE' WHERE id = ?")
        .bind(chrono::Utc::now() + chrono::Duration::hours(2))
        .bind(chrono::Utc::now() + chrono::Duration::hours(4))
        .bind(&event_id)
        .execute(&app.pool)
        .await
        .unwrap();
    app.request("POST", &format!("/events/{}/confirm?userId={}", event_id, user_b), None, None)
        .await;
    app.age_event(&event_id).await;

    app.request(
        "POST",
        &format!("/events/{}/rate", event_id),
        Some(json!({ "userId": user_a, "score": 2 })),
        None,
    )
    .await;
    app.request(
        "POST",
        &format!("/events/{}/rate", event_id),
        Some(json!({ "userId": user_b, "score": 5 })),
        None,
    )
    .await;

    let res = app.request("GET", &format!("/events/{}/ratings", event_id), None, None).await;
    let body = parse_body(res).await;
    assert_eq!(body["average"], 3.5);
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn test_duplicate_rating_rejected() {
    let app = TestApp::new().await;
    let (event_id, user_id) = past_event_with_participant(&app).await;

    let res = app
        .request(
            "POST",
            &format!("/events/{}/rate", event_id),
            Some(json!({ "userId": user_id, "score": 4 })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .request(
            "POST",
            &format!("/events/{}/rate", event_id),
            Some(json!({ "userId": user_id, "score": 5 })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(res).await;
    assert_eq!(body["message"], "Вы уже оценили это событие");
}

#[tokio::test]
async fn test_rating_requires_author_id() {
    let app = TestApp::new().await;
    let (event_id, _) = past_event_with_participant(&app).await;

    let res = app
        .request("POST", &format!("/events/{}/rate", event_id), Some(json!({ "score": 4 })), None)
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(res).await;
    assert_eq!(body["message"], "userId is required");
}
