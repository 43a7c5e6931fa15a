//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Build outcomes by error kind
//! - Build latency
//! - Sequence allocation
//! - Memo fallbacks and Horizon failovers

use axum::{http::StatusCode, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    pub static ref BUILDS_TOTAL: CounterVec = register_counter_vec!(
        "stellar_adapter_builds_total",
        "Transaction builds by outcome (success or error kind)",
        &["chain_id", "outcome"]
    ).unwrap();

    pub static ref BUILD_LATENCY: HistogramVec = register_histogram_vec!(
        "stellar_adapter_build_latency_seconds",
        "Transaction build latency",
        &["chain_id"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    ).unwrap();

    pub static ref SEQUENCES_ALLOCATED: CounterVec = register_counter_vec!(
        "stellar_adapter_sequences_allocated_total",
        "Sequence numbers allocated by the sequence strategy",
        &["strategy"]
    ).unwrap();

    pub static ref MEMO_FALLBACKS: CounterVec = register_counter_vec!(
        "stellar_adapter_memo_fallbacks_total",
        "Swap ids that could not be encoded and fell back to a zero memo",
        &[]
    ).unwrap();

    pub static ref HORIZON_FAILOVERS: CounterVec = register_counter_vec!(
        "stellar_adapter_horizon_failovers_total",
        "Horizon endpoint failovers",
        &[]
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn metrics_handler() -> Result<String, StatusCode> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

// Helper functions to record metrics

pub fn record_build(chain_id: &str, outcome: &str, latency_secs: f64) {
    BUILDS_TOTAL.with_label_values(&[chain_id, outcome]).inc();
    BUILD_LATENCY
        .with_label_values(&[chain_id])
        .observe(latency_secs);
}

pub fn record_sequence_allocated(strategy: &str) {
    SEQUENCES_ALLOCATED.with_label_values(&[strategy]).inc();
}

pub fn record_memo_fallback() {
    MEMO_FALLBACKS.with_label_values(&[]).inc();
}

pub fn record_horizon_failover() {
    HORIZON_FAILOVERS.with_label_values(&[]).inc();
}
