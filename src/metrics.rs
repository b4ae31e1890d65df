use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::warn;

// The recorder is process-global; routers built later (tests) share it.
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once and describe the scoring series.
    pub fn init() -> Self {
        let handle = HANDLE
            .get_or_init(|| {
                let handle = match PrometheusBuilder::new().install_recorder() {
                    Ok(h) => h,
                    Err(e) => {
                        // Another recorder won; keep a detached handle so /metrics still answers.
                        warn!(error = %e, "prometheus: recorder already installed");
                        PrometheusBuilder::new().build_recorder().handle()
                    }
                };
                describe_counter!(
                    "ripple_scores_computed_total",
                    "Drafts scored, labelled by equation id"
                );
                describe_histogram!("ripple_score_value", "Ripple scores produced");
                describe_gauge!("ripple_equations_loaded", "Equations in the current registry");
                handle
            })
            .clone();

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
