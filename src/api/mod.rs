mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::contracts::SequenceBackend;

pub use handlers::{
    AppState, ErrorResponse, MaxSequenceResponse, StatsResponse, SubmitJobResponse, CALLER_HEADER,
};

/// Creates the API router.
pub fn create_router<B: SequenceBackend + 'static>(state: Arc<AppState<B>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/health/ready", get(handlers::health_ready::<B>))
        .route("/stats", get(handlers::get_stats::<B>))
        .route("/metrics", get(handlers::metrics::<B>))
        .route(
            "/server/max_job_sequence_id",
            get(handlers::get_max_sequence::<B>)
                .put(handlers::set_max_sequence::<B>)
                .delete(handlers::unset_max_sequence::<B>),
        )
        .route("/jobs", post(handlers::submit_job::<B>))
        .with_state(state)
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 15001,
        }
    }
}

impl ServerConfig {
    /// Reads `JOBSEQ_HOST` and `JOBSEQ_PORT` (defaults: 0.0.0.0:15001).
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            host: std::env::var("JOBSEQ_HOST").unwrap_or(default.host),
            port: std::env::var("JOBSEQ_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(default.port),
        }
    }
}

/// Starts the HTTP server.
pub async fn start_server<B, F>(
    config: ServerConfig,
    state: Arc<AppState<B>>,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    B: SequenceBackend + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let router = create_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
