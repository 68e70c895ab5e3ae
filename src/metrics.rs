// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::warn;

use crate::report::DataQuality;

pub const RUNS_TOTAL: &str = "scoring_runs_total";
pub const SCHEMA_ERRORS_TOTAL: &str = "scoring_schema_errors_total";
pub const DROPPED_OPTIONS_TOTAL: &str = "scoring_dropped_options_total";
pub const UNRESOLVED_TOKENS_TOTAL: &str = "scoring_unresolved_tokens_total";
pub const UNSUPPORTED_ANSWERS_TOTAL: &str = "scoring_unsupported_answers_total";
pub const RUN_MS: &str = "scoring_run_ms";

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(RUNS_TOTAL, "Completed scoring runs.");
        describe_counter!(SCHEMA_ERRORS_TOTAL, "Runs rejected with a schema error.");
        describe_counter!(
            DROPPED_OPTIONS_TOTAL,
            "Options dropped because they map to no potential."
        );
        describe_counter!(
            UNRESOLVED_TOKENS_TOTAL,
            "Answer tokens that resolved to no potential."
        );
        describe_counter!(
            UNSUPPORTED_ANSWERS_TOTAL,
            "Answers whose shape could not be read."
        );
        describe_histogram!(RUN_MS, "Scoring run time in milliseconds.");
    });
}

/// Count a finished run and its data-quality gaps.
pub fn record_run(meta: &DataQuality, elapsed_ms: f64) {
    ensure_metrics_described();
    counter!(RUNS_TOTAL).increment(1);
    counter!(DROPPED_OPTIONS_TOTAL).increment(meta.dropped_options as u64);
    counter!(UNRESOLVED_TOKENS_TOTAL).increment(meta.unresolved_tokens as u64);
    counter!(UNSUPPORTED_ANSWERS_TOTAL).increment(meta.unsupported_answers as u64);
    histogram!(RUN_MS).record(elapsed_ms);
}

pub fn record_schema_error() {
    ensure_metrics_described();
    counter!(SCHEMA_ERRORS_TOTAL).increment(1);
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process.
    ///
    /// Later calls reuse the same handle. If another recorder is already
    /// installed, a detached handle is returned and the page stays empty.
    pub fn init() -> Self {
        static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
        let handle = HANDLE
            .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
                Ok(h) => h,
                Err(e) => {
                    warn!(error = %e, "prometheus: recorder already installed");
                    PrometheusBuilder::new().build_recorder().handle()
                }
            })
            .clone();
        ensure_metrics_described();
        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
