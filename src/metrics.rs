//! Prometheus recorder and the `/metrics` route.

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("hub_items_ingested_total", "Items accepted into the ingestion queue.");
        describe_counter!(
            "hub_items_dropped_total",
            "Items dropped because the ingestion queue was full."
        );
        describe_counter!("hub_analyses_emitted_total", "Analyses published to subscribers.");
        describe_counter!(
            "hub_analysis_failures_total",
            "Items whose analysis failed, panicked or timed out."
        );
        describe_gauge!("hub_in_flight", "Analyses currently running.");
        describe_gauge!("hub_subscribers", "Live stream subscribers.");

        Ok(Self { handle })
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
