use gatekeeper::{
    build_router,
    session::{
        repository::{InMemorySessionRepository, PostgresSessionRepository, SessionRepository},
        start_cleanup_task,
    },
    user::{InMemoryUserRepository, PostgresUserRepository, UserRepository},
    AppConfig, AppError, AppState,
};
use sqlx::postgres::PgPoolOptions;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Repositories = (
    Arc<dyn UserRepository + Send + Sync>,
    Arc<dyn SessionRepository + Send + Sync>,
);

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatekeeper=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    info!("Starting gatekeeper auth server");

    let config = AppConfig::from_env()?;
    let (user_repository, session_repository) = repositories(&config).await?;

    tokio::spawn(start_cleanup_task(
        Arc::clone(&session_repository),
        config.cleanup.clone(),
    ));

    let app_state = AppState::new(user_repository, session_repository, config.session.clone());
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| AppError::Config(format!("cannot bind {}: {}", config.bind_addr, e)))?;
    info!(bind_addr = %config.bind_addr, "Server listening");

    axum::serve(listener, app).await.map_err(|e| {
        error!(error = %e, "HTTP server failed");
        AppError::Internal
    })
}

/// Postgres when `DATABASE_URL` is set, otherwise in-memory stores
async fn repositories(config: &AppConfig) -> Result<Repositories, AppError> {
    let Some(database_url) = &config.database_url else {
        warn!("DATABASE_URL not set, users and sessions are kept in memory");
        return Ok((
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemorySessionRepository::new()),
        ));
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;
    info!("Database migrations applied");

    Ok((
        Arc::new(PostgresUserRepository::new(pool.clone())),
        Arc::new(PostgresSessionRepository::new(pool)),
    ))
}
