use afisha_backend::{
    api::router::create_router,
    config::Config,
    domain::ports::MailService,
    domain::services::auth_service::AuthService,
    domain::services::event_service::EventService,
    domain::services::notifier::Notifier,
    domain::services::token_service::TokenService,
    error::AppError,
    infra::repositories::{
        sqlite_event_repo::SqliteEventRepo,
        sqlite_participant_repo::SqliteParticipantRepo,
        sqlite_rating_repo::SqliteRatingRepo,
        sqlite_token_repo::{SqliteResetTokenRepo, SqliteVerificationTokenRepo},
        sqlite_user_repo::SqliteUserRepo,
    },
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tera::Tera;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@afisha.local";
pub const ADMIN_PASSWORD: &str = "Admin123!";

#[derive(Clone, Debug)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

pub struct MockMailService {
    pub sent: Arc<Mutex<Vec<SentMail>>>,
}

#[async_trait]
impl MailService for MockMailService {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub struct AuthHeaders {
    pub access_token: String,
    pub refresh_token: String,
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub mails: Arc<Mutex<Vec<SentMail>>>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let mut tera = Tera::default();
        tera.add_raw_template("verification_code.html", "Ваш код: {{ code }}").unwrap();
        tera.add_raw_template("password_reset.html", "token={{ token }}").unwrap();
        let templates = Arc::new(tera);

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            mail_from: "no-reply@afisha.local".to_string(),
            jwt_secret: "integration-test-secret".to_string(),
            access_token_minutes: 15,
            refresh_token_days: 14,
            admin_email: ADMIN_EMAIL.to_string(),
            admin_password: ADMIN_PASSWORD.to_string(),
        };

        let mails = Arc::new(Mutex::new(Vec::new()));
        let mail_service = Arc::new(MockMailService { sent: mails.clone() });
        let notifier = Arc::new(Notifier::new(mail_service.clone(), templates));
        let token_service = Arc::new(TokenService::new(&config));

        let user_repo = Arc::new(SqliteUserRepo::new(pool.clone()));
        let verification_token_repo = Arc::new(SqliteVerificationTokenRepo::new(pool.clone()));
        let reset_token_repo = Arc::new(SqliteResetTokenRepo::new(pool.clone()));
        let event_repo = Arc::new(SqliteEventRepo::new(pool.clone()));
        let participant_repo = Arc::new(SqliteParticipantRepo::new(pool.clone()));
        let rating_repo = Arc::new(SqliteRatingRepo::new(pool.clone()));

        let auth_service = Arc::new(AuthService::new(
            user_repo.clone(),
            verification_token_repo.clone(),
            reset_token_repo.clone(),
            token_service.clone(),
            notifier.clone(),
        ));
        let event_service = Arc::new(EventService::new(
            event_repo.clone(),
            participant_repo.clone(),
            rating_repo.clone(),
            user_repo.clone(),
            notifier.clone(),
        ));

        let state = Arc::new(AppState {
            config,
            user_repo,
            verification_token_repo,
            reset_token_repo,
            event_repo,
            participant_repo,
            rating_repo,
            mail_service,
            token_service,
            notifier,
            auth_service,
            event_service,
        });

        state
            .auth_service
            .seed_admin_if_missing(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .expect("Failed to seed test admin");

        let router = create_router(state.clone());

        Self { router, pool, db_filename, state, mails }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn register(&self, full_name: &str, email: &str, password: &str) -> axum::response::Response {
        self.request(
            "POST",
            "/auth/register",
            Some(json!({
                "fullName": full_name,
                "email": email,
                "password": password,
                "confirmPassword": password
            })),
            None,
        )
        .await
    }

    pub async fn verification_code(&self, email: &str) -> String {
        let row = sqlx::query(
            "SELECT t.code as code FROM email_verification_tokens t
             JOIN users u ON u.id = t.user_id
             WHERE LOWER(u.email) = LOWER(?) AND t.consumed_at IS NULL
             ORDER BY t.expires_at DESC LIMIT 1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .expect("No verification code found");
        row.get::<String, _>("code")
    }

    /// Registers, verifies the email with the issued code and returns the
    /// new user's id.
    pub async fn register_and_verify(&self, full_name: &str, email: &str, password: &str) -> String {
        let res = self.register(full_name, email, password).await;
        assert!(res.status().is_success(), "Registration failed: {}", res.status());
        let body = parse_body(res).await;
        let user_id = body["user"]["id"].as_str().unwrap().to_string();

        let code = self.verification_code(email).await;
        let res = self
            .request("POST", "/auth/verify-email", Some(json!({ "email": email, "code": code })), None)
            .await;
        assert!(res.status().is_success(), "Verification failed: {}", res.status());

        user_id
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthHeaders {
        let res = self
            .request("POST", "/auth/login", Some(json!({ "email": email, "password": password })), None)
            .await;

        if !res.status().is_success() {
            panic!("Login failed in test helper: status {}", res.status());
        }

        let cookies: Vec<String> = res
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|h| h.to_str().unwrap().to_string())
            .collect();

        AuthHeaders {
            access_token: cookie_value(&cookies, "access_token"),
            refresh_token: cookie_value(&cookies, "refresh_token"),
        }
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.access_token
    }

    /// Admin id as seeded at bootstrap.
    pub async fn admin_id(&self) -> String {
        let row = sqlx::query("SELECT id FROM users WHERE email = ?")
            .bind(ADMIN_EMAIL)
            .fetch_one(&self.pool)
            .await
            .unwrap();
        row.get::<String, _>("id")
    }

    /// Pushes an event's window into the past so reads derive PAST.
    pub async fn age_event(&self, event_id: &str) {
        sqlx::query("UPDATE events SET start_at = ?, end_at = ? WHERE id = ?")
            .bind(Utc::now() - Duration::hours(5))
            .bind(Utc::now() - Duration::hours(2))
            .bind(event_id)
            .execute(&self.pool)
            .await
            .unwrap();
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
    }
}

fn cookie_value(cookies: &[String], name: &str) -> String {
    let prefix = format!("{}=", name);
    let cookie = cookies
        .iter()
        .find(|c| c.starts_with(&prefix))
        .unwrap_or_else(|| panic!("No {} cookie returned", name));
    let rest = &cookie[prefix.len()..];
    rest.split(';').next().unwrap().to_string()
}

pub async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Valid event payload starting `start_in_hours` from now.
pub fn event_payload(title: &str, start_in_hours: i64, duration_hours: i64) -> Value {
    let image = general_purpose::STANDARD.encode(b"fake-image-bytes");
    json!({
        "title": title,
        "shortDescription": "Коротко",
        "fullDescription": "Полное описание события",
        "startAt": (Utc::now() + Duration::hours(start_in_hours)).to_rfc3339(),
        "endAt": (Utc::now() + Duration::hours(start_in_hours + duration_hours)).to_rfc3339(),
        "imageBase64": image,
        "imageType": "image/png",
        "paymentInfo": null,
        "maxParticipants": null
    })
}
