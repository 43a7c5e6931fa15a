//! HTTP API for health checks, status, and transaction builds

use crate::chain::HorizonProvider;
use crate::config::ApiConfig;
use crate::error::BuildError;
use crate::pipeline::BuildPipeline;
use crate::swap::{SwapExtras, SwapInstruction};
use crate::tx::BuiltTransactionView;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<BuildPipeline>,
    pub horizon: Arc<HorizonProvider>,
    /// Upper bound on one build, lookups included
    pub build_timeout: Duration,
    pub started: Instant,
}

impl AppState {
    pub fn new(
        config: &ApiConfig,
        pipeline: Arc<BuildPipeline>,
        horizon: Arc<HorizonProvider>,
    ) -> Self {
        Self {
            pipeline,
            horizon,
            build_timeout: Duration::from_millis(config.build_timeout_ms),
            started: Instant::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/status", get(get_status))
        .route("/build", post(build_transaction))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP API server
pub async fn run_server(config: ApiConfig, state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint - basic liveness
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check - Horizon must answer
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let horizon = state.horizon.health_check().await;
    let status = if horizon {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready: horizon,
            horizon,
            horizon_url: state.horizon.base_url().to_string(),
        }),
    )
}

/// Get adapter status
async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started.elapsed().as_secs(),
        chain_id: state.pipeline.chain_id().to_string(),
        network_passphrase: state.pipeline.network_passphrase().to_string(),
        horizon_url: state.horizon.base_url().to_string(),
    })
}

/// Build the unsigned payment for one swap instruction
async fn build_transaction(
    State(state): State<AppState>,
    Json(mut instruction): Json<SwapInstruction>,
) -> Result<Json<BuildResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    info!(%request_id, swap_id = %instruction.swap_id(), "Build requested");

    let built = tokio::time::timeout(state.build_timeout, state.pipeline.build(&mut instruction))
        .await
        .map_err(|_| {
            warn!(%request_id, "Build timed out after {:?}", state.build_timeout);
            ApiError::Timeout
        })??;

    let view = BuiltTransactionView::from(&built);
    Ok(Json(BuildResponse {
        envelope_xdr: view.envelope_xdr,
        signing_hash: view.signing_hash,
        sequence: view.sequence,
        fee: view.fee,
        extras: instruction.extras().cloned(),
    }))
}

/// Build failure as returned to HTTP callers
#[derive(Debug)]
pub enum ApiError {
    Build(BuildError),
    Timeout,
}

impl From<BuildError> for ApiError {
    fn from(e: BuildError) -> Self {
        ApiError::Build(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Build(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Build(BuildError::SignerRegistry(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Build(
                BuildError::SenderNotAuthorizedSigner { .. } | BuildError::MissingSignerPublicKey(_),
            ) => StatusCode::FORBIDDEN,
            ApiError::Build(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::Timeout => ErrorResponse {
                error: "build timed out".to_string(),
                kind: "timeout",
                retryable: true,
            },
            ApiError::Build(e) => ErrorResponse {
                error: e.to_string(),
                kind: e.kind(),
                retryable: e.is_retryable(),
            },
        };
        (self.status(), Json(body)).into_response()
    }
}

// Response types

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    horizon: bool,
    horizon_url: String,
}

#[derive(Serialize)]
struct StatusResponse {
    version: String,
    uptime_seconds: u64,
    chain_id: String,
    network_passphrase: String,
    horizon_url: String,
}

#[derive(Debug, Serialize)]
pub struct BuildResponse {
    envelope_xdr: String,
    signing_hash: String,
    sequence: i64,
    fee: u32,
    extras: Option<SwapExtras>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
    retryable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{AccountState, MockAccountStateProvider};
    use crate::config::{tests::SAMPLE, Settings};

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const SIGNER: &str = "GAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQDZ7H";
    const RECEIVER: &str = "GABAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEJXA";

    fn app() -> Router {
        let settings = Settings::from_toml_str(SAMPLE).unwrap();
        let mut accounts = MockAccountStateProvider::new();
        accounts.expect_account().returning(|address| {
            Ok(AccountState {
                account_id: address.to_string(),
                sequence: 7,
                native_balance: 1_000_000_000,
                subentry_count: 0,
            })
        });
        let pipeline = BuildPipeline::from_settings(&settings, Arc::new(accounts)).unwrap();
        let horizon = HorizonProvider::new(&settings.horizon).unwrap();
        router(AppState::new(
            &settings.api,
            Arc::new(pipeline),
            Arc::new(horizon),
        ))
    }

    fn build_request(sender: &str) -> Request<Body> {
        let body = serde_json::json!({
            "from_chain_id": "1",
            "to_chain_id": "1000005788240",
            "swap_id": "abcdef",
            "log_index": 0,
            "token_id": "USDC",
            "origin_token": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            "origin_value": "25000000",
            "sender": sender,
            "receiver": RECEIVER,
            "swap_kind": "erc20_swap"
        });
        Request::post("/build")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_build_success() {
        let response = app().oneshot(build_request(SIGNER)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["sequence"], 8);
        assert_eq!(body["fee"], 200);
        assert_eq!(body["extras"]["sequence"], 7);
        assert_eq!(body["extras"]["fee"], "200");
        assert_eq!(body["signing_hash"].as_str().unwrap().len(), 64);
        assert!(!body["envelope_xdr"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_rejects_unauthorized_sender() {
        let response = app().oneshot(build_request(RECEIVER)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = json_body(response).await;
        assert_eq!(body["kind"], "sender_not_authorized_signer");
        assert_eq!(body["retryable"], false);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(ApiError::Timeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ApiError::from(BuildError::EmptySender).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(BuildError::InsufficientReserveBalance {
                account: SIGNER.to_string(),
                have: 0,
                need: 1,
            })
            .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
