use anyhow::{Context, Result};
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::web::AppState;

/// Install the Prometheus recorder
/// Returns a handle that can be used to render metrics for scraping
pub fn init_metrics() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        // Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s
        .set_buckets_for_metric(
            Matcher::Full("skytrail_snapshot_duration_seconds".to_string()),
            &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0],
        )
        .context("Failed to set buckets for skytrail_snapshot_duration_seconds")?
        .install_recorder()
        .context("Failed to install Prometheus recorder")
}

/// Initialize tracker metrics to zero/default values
/// This ensures metrics always appear in Prometheus queries even if no events have occurred
pub fn initialize_tracker_metrics() {
    // Snapshot processing
    metrics::counter!("skytrail_snapshots_processed_total").absolute(0);
    metrics::counter!("skytrail_snapshots_out_of_order_total").absolute(0);
    metrics::counter!("skytrail_feed_errors_total").absolute(0);

    // Aircraft lifecycle
    metrics::counter!("skytrail_aircraft_created_total").absolute(0);
    metrics::counter!("skytrail_aircraft_removed_total").absolute(0);
    metrics::gauge!("skytrail_aircraft_tracked").set(0.0);
    metrics::gauge!("skytrail_aircraft_visible").set(0.0);

    // Metadata lookups
    metrics::counter!("skytrail_metadata_lookups_total").absolute(0);
    metrics::counter!("skytrail_metadata_stale_total").absolute(0);
    metrics::counter!("skytrail_metadata_lookup_panics_total").absolute(0);
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "Metrics disabled".to_string()),
    }
}
