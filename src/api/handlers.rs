use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::contracts::{
    CallerIdentity, ConfigError, SequenceBackend, SequenceError, SequenceIssuer, StorageError,
};
use crate::gateway::ConfigGateway;
use crate::sequence::{Candidate, JobId};

/// Header carrying the caller as `user@host`.
pub const CALLER_HEADER: &str = "x-caller-identity";

/// Application state shared across handlers.
pub struct AppState<B: SequenceBackend> {
    pub gateway: ConfigGateway<B>,
    /// Suffix of issued job identifiers.
    pub server_name: String,
    pub start_time: Instant,
}

impl<B: SequenceBackend> AppState<B> {
    pub fn new(gateway: ConfigGateway<B>, server_name: impl Into<String>) -> Self {
        Self {
            gateway,
            server_name: server_name.into(),
            start_time: Instant::now(),
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    Config(ConfigError),
    Sequence(SequenceError),
    Storage(StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            ApiError::Config(ConfigError::Unauthorized) => {
                (StatusCode::FORBIDDEN, "UNAUTHORIZED_REQUEST")
            }
            ApiError::Config(ConfigError::MalformedValue) => {
                (StatusCode::BAD_REQUEST, "ILLEGAL_VALUE")
            }
            ApiError::Config(ConfigError::OutOfRange) => (StatusCode::BAD_REQUEST, "OUT_OF_RANGE"),
            ApiError::Config(ConfigError::Storage(_)) | ApiError::Storage(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
            ApiError::Sequence(SequenceError::AllocationFailed(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "ALLOCATION_FAILED")
            }
        };
        let error = match self {
            ApiError::Config(e) => e.to_string(),
            ApiError::Sequence(e) => e.to_string(),
            ApiError::Storage(e) => e.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                error,
                code: code.into(),
            }),
        )
            .into_response()
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        ApiError::Config(e)
    }
}

impl From<SequenceError> for ApiError {
    fn from(e: SequenceError) -> Self {
        ApiError::Sequence(e)
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Storage(e)
    }
}

/// Reads the caller from `x-caller-identity`. A missing or unparseable
/// header is an unauthorized request.
fn caller_identity<B: SequenceBackend>(
    state: &AppState<B>,
    headers: &HeaderMap,
) -> Result<CallerIdentity, ApiError> {
    headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| {
            let err = ConfigError::Unauthorized;
            state.gateway.store().metrics().record_config_rejection(&err);
            ApiError::Config(err)
        })
}

/// Response carrying the attribute value.
#[derive(Debug, Serialize, Deserialize)]
pub struct MaxSequenceResponse {
    pub max_job_sequence_id: u64,
}

/// Request body for setting the attribute. `value` may be any JSON value;
/// non-numeric values are rejected by validation.
#[derive(Debug, Deserialize)]
pub struct SetMaxSequenceRequest {
    pub value: serde_json::Value,
}

/// GET /server/max_job_sequence_id
pub async fn get_max_sequence<B: SequenceBackend>(
    State(state): State<Arc<AppState<B>>>,
) -> Result<Json<MaxSequenceResponse>, ApiError> {
    Ok(Json(MaxSequenceResponse {
        max_job_sequence_id: state.gateway.get_max_sequence_value()?,
    }))
}

/// PUT /server/max_job_sequence_id
/// The body is only interpreted after the caller is authorized; an
/// undecodable body is an illegal value, not a transport error.
pub async fn set_max_sequence<B: SequenceBackend>(
    State(state): State<Arc<AppState<B>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MaxSequenceResponse>, ApiError> {
    let caller = caller_identity(&state, &headers)?;
    let candidate = serde_json::from_slice::<SetMaxSequenceRequest>(&body)
        .map(|request| Candidate::from(request.value))
        .unwrap_or(Candidate::Unrepresentable);

    let value = state.gateway.set_max_sequence_value(candidate, &caller)?;
    Ok(Json(MaxSequenceResponse {
        max_job_sequence_id: value.get(),
    }))
}

/// DELETE /server/max_job_sequence_id
pub async fn unset_max_sequence<B: SequenceBackend>(
    State(state): State<Arc<AppState<B>>>,
    headers: HeaderMap,
) -> Result<Json<MaxSequenceResponse>, ApiError> {
    let caller = caller_identity(&state, &headers)?;
    state.gateway.unset_max_sequence_value(&caller)?;
    Ok(Json(MaxSequenceResponse {
        max_job_sequence_id: state.gateway.get_max_sequence_value()?,
    }))
}

/// Response for job submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitJobResponse {
    pub job_id: String,
    pub sequence: u64,
    pub wrapped: bool,
}

/// POST /jobs
/// Allocates the next sequence number and returns the job identifier.
pub async fn submit_job<B: SequenceBackend>(
    State(state): State<Arc<AppState<B>>>,
) -> Result<(StatusCode, Json<SubmitJobResponse>), ApiError> {
    let allocation = state.gateway.store().allocate_next()?;
    let job_id = JobId::new(allocation.id, state.server_name.as_str());
    Ok((
        StatusCode::CREATED,
        Json(SubmitJobResponse {
            job_id: job_id.to_string(),
            sequence: allocation.id,
            wrapped: allocation.wrapped,
        }),
    ))
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy"
    }))
}

/// GET /health/ready
/// Ready while the sequence state is reachable.
pub async fn health_ready<B: SequenceBackend>(
    State(state): State<Arc<AppState<B>>>,
) -> impl IntoResponse {
    match state.gateway.store().snapshot() {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready" })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "not_ready", "error": e.to_string() })),
        ),
    }
}

/// Response for stats endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub uptime_secs: f64,
    pub backend: String,
    pub max_sequence_value: u64,
    pub current_value: u64,
    pub reserved_through: u64,
    pub allocations_total: u64,
    pub wraps_total: u64,
    pub allocation_failures_total: u64,
    pub config_changes_total: u64,
}

/// GET /stats
pub async fn get_stats<B: SequenceBackend>(
    State(state): State<Arc<AppState<B>>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let store = state.gateway.store();
    let snapshot = store.snapshot()?;
    let metrics = store.metrics();

    Ok(Json(StatsResponse {
        uptime_secs: state.start_time.elapsed().as_secs_f64(),
        backend: store.backend().describe().into(),
        max_sequence_value: snapshot.max_sequence_value,
        current_value: snapshot.current_value,
        reserved_through: snapshot.reserved_through,
        allocations_total: metrics.allocations_total.load(Ordering::Relaxed),
        wraps_total: metrics.wraps_total.load(Ordering::Relaxed),
        allocation_failures_total: metrics.allocation_failures_total.load(Ordering::Relaxed),
        config_changes_total: metrics.config_changes_total.load(Ordering::Relaxed),
    }))
}

/// GET /metrics
/// Prometheus text exposition format.
pub async fn metrics<B: SequenceBackend>(
    State(state): State<Arc<AppState<B>>>,
) -> impl IntoResponse {
    let store = state.gateway.store();
    let mut body = store.metrics().format_prometheus();

    if let Ok(snapshot) = store.snapshot() {
        use std::fmt::Write;
        let _ = writeln!(
            body,
            "\n# HELP jobseq_max_sequence_value Configured max_job_sequence_id"
        );
        let _ = writeln!(body, "# TYPE jobseq_max_sequence_value gauge");
        let _ = writeln!(body, "jobseq_max_sequence_value {}", snapshot.max_sequence_value);
        let _ = writeln!(body, "# HELP jobseq_current_value Last issued job sequence number");
        let _ = writeln!(body, "# TYPE jobseq_current_value gauge");
        let _ = writeln!(body, "jobseq_current_value {}", snapshot.current_value);
    }

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}
