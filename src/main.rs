use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use jobseq::api::{start_server, AppState, ServerConfig};
use jobseq::audit::{FileAuditLog, TracingAuditSink};
use jobseq::contracts::AuditSink;
use jobseq::gateway::{ConfigGateway, ManagerList};
use jobseq::sequence::{IssuerConfig, SequenceStore};
use jobseq::storage::BackendKind;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobseq=info".parse()?))
        .init();

    tracing::info!("jobseq starting...");

    let data_dir = std::env::var("JOBSEQ_DATA_DIR").unwrap_or_else(|_| "./data".into());
    let backend_kind = BackendKind::from_env();
    let backend = backend_kind.open(&data_dir)?;
    tracing::info!(backend = ?backend_kind, "Opened sequence state at {}", data_dir);

    let server_name = std::env::var("JOBSEQ_SERVER_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "localhost".into());

    let audit: Arc<dyn AuditSink> = match std::env::var("JOBSEQ_AUDIT_LOG") {
        Ok(path) => {
            tracing::info!("Writing audit records to {}", path);
            Arc::new(FileAuditLog::open(path, server_name.as_str())?)
        }
        Err(_) => Arc::new(TracingAuditSink),
    };

    let store = Arc::new(SequenceStore::open(
        backend,
        audit,
        IssuerConfig::from_env(),
    )?);

    let managers = ManagerList::from_env();
    if managers.is_empty() {
        tracing::warn!("No managers configured; max_job_sequence_id cannot be changed");
    }

    let state = Arc::new(AppState::new(
        ConfigGateway::new(store, Arc::new(managers)),
        server_name,
    ));

    start_server(ServerConfig::from_env(), state, shutdown_signal()).await?;

    tracing::info!("jobseq stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
