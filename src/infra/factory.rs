use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, PgPool, SqlitePool};
use tera::Tera;
use tracing::log::LevelFilter;
use tracing::{error, info};

use crate::config::Config;
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::event_service::EventService;
use crate::domain::services::notifier::Notifier;
use crate::domain::services::token_service::TokenService;
use crate::infra::email::http_mail_service::HttpMailService;
use crate::infra::repositories::{
    postgres_event_repo::PostgresEventRepo, postgres_participant_repo::PostgresParticipantRepo,
    postgres_rating_repo::PostgresRatingRepo,
    postgres_token_repo::{PostgresResetTokenRepo, PostgresVerificationTokenRepo},
    postgres_user_repo::PostgresUserRepo, sqlite_event_repo::SqliteEventRepo,
    sqlite_participant_repo::SqliteParticipantRepo, sqlite_rating_repo::SqliteRatingRepo,
    sqlite_token_repo::{SqliteResetTokenRepo, SqliteVerificationTokenRepo},
    sqlite_user_repo::SqliteUserRepo,
};
use crate::state::AppState;

pub fn load_templates() -> Tera {
    let mut tera = Tera::default();
    tera.add_raw_template("verification_code.html", include_str!("../../templates/verification_code.html"))
        .expect("Failed to load verification template");
    tera.add_raw_template("password_reset.html", include_str!("../../templates/password_reset.html"))
        .expect("Failed to load password reset template");
    tera
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;
    let mail_service = Arc::new(HttpMailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
        config.mail_from.clone(),
    ));

    let templates = Arc::new(load_templates());
    let notifier = Arc::new(Notifier::new(mail_service.clone(), templates));
    let token_service = Arc::new(TokenService::new(config));

    let state = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        let user_repo = Arc::new(PostgresUserRepo::new(pool.clone()));
        let verification_token_repo = Arc::new(PostgresVerificationTokenRepo::new(pool.clone()));
        let reset_token_repo = Arc::new(PostgresResetTokenRepo::new(pool.clone()));
        let event_repo = Arc::new(PostgresEventRepo::new(pool.clone()));
        let participant_repo = Arc::new(PostgresParticipantRepo::new(pool.clone()));
        let rating_repo = Arc::new(PostgresRatingRepo::new(pool.clone()));

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

        AppState {
            config: config.clone(),
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
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

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

        AppState {
            config: config.clone(),
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
        }
    };

    if let Err(e) = state
        .auth_service
        .seed_admin_if_missing(&state.config.admin_email, &state.config.admin_password)
        .await
    {
        error!("Failed to seed admin account: {:?}", e);
    }

    state
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
