//! Prometheus metrics for the gateway.
//!
//! HTTP request metrics come from `service_core::middleware::metrics_middleware`;
//! this module adds inference outcome metrics and renders the exposition.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder. Must be called once at startup.
pub fn init_metrics() {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Outcome of one `/predict` call that reached the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceOutcome {
    Success,
    Failure,
}

impl InferenceOutcome {
    fn as_str(self) -> &'static str {
        match self {
            InferenceOutcome::Success => "success",
            InferenceOutcome::Failure => "failure",
        }
    }
}

pub fn record_inference(backend: &'static str, outcome: InferenceOutcome, elapsed: Duration) {
    let labels = [("backend", backend), ("outcome", outcome.as_str())];
    counter!("inference_requests_total", &labels).increment(1);
    histogram!("inference_latency_seconds", &labels).record(elapsed.as_secs_f64());
}
