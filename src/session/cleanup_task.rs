use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, instrument};

use super::repository::SessionRepository;
use crate::shared::AppError;

/// Configuration for the expired-session cleanup task
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often to run the cleanup task
    pub cleanup_interval: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(30 * 60), // 30 minutes
        }
    }
}

/// Starts the background task that periodically deletes expired sessions
#[instrument(skip(session_repository))]
pub async fn start_cleanup_task(
    session_repository: Arc<dyn SessionRepository + Send + Sync>,
    config: CleanupConfig,
) {
    info!(
        cleanup_interval_secs = config.cleanup_interval.as_secs(),
        "Starting session cleanup background task"
    );

    let mut cleanup_interval = interval(config.cleanup_interval);

    loop {
        cleanup_interval.tick().await;

        match cleanup_expired_sessions(&session_repository).await {
            Ok(removed_count) => {
                info!(removed_count = removed_count, "Session cleanup completed");
            }
            Err(e) => {
                error!(error = %e, "Session cleanup task failed");
            }
        }
    }
}

/// Runs a single cleanup pass
pub async fn cleanup_expired_sessions(
    session_repository: &Arc<dyn SessionRepository + Send + Sync>,
) -> Result<u64, AppError> {
    session_repository.delete_expired_sessions(Utc::now()).await
}
