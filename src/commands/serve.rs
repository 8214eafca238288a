use anyhow::{Context, Result};
use skytrail::config::SkytrailConfig;
use skytrail::feed_client;
use skytrail::service::{SharedTracker, TrackerService};
use skytrail::tracker::AircraftTracker;
use skytrail::web::{self, AppState};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info};

use super::load_metadata;

pub async fn handle_serve(config_path: &Path, bind: Option<String>) -> Result<()> {
    let mut config = SkytrailConfig::load_or_default(config_path)?;
    if let Some(bind) = bind {
        config.web.bind = bind;
    }

    info!(
        "Starting skytrail - feed: {}, web: {}, config: {:?}",
        config.feed.source, config.web.bind, config_path
    );

    // Counters must exist before the first scrape
    let metrics = if config.web.metrics {
        let handle = skytrail::metrics::init_metrics()?;
        skytrail::metrics::initialize_tracker_metrics();
        Some(handle)
    } else {
        None
    };

    let tracker: SharedTracker = Arc::new(Mutex::new(AircraftTracker::new(config.tracker.clone())));
    let feed = feed_client::from_config(&config.feed)?;
    let metadata = load_metadata(&config.metadata).await?;
    let service = TrackerService::new(
        Arc::clone(&tracker),
        feed,
        metadata,
        Duration::from_millis(config.feed.interval_ms),
    );

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received shutdown signal (Ctrl+C), stopping..."),
                Err(err) => error!("Unable to listen for shutdown signal: {}", err),
            }
            shutdown.cancel();
        }
        .instrument(tracing::info_span!("shutdown_handler")),
    );

    let service_task = tokio::spawn(
        service
            .run(cancel.clone())
            .instrument(tracing::info_span!("tracker_service")),
    );

    let state = AppState {
        tracker,
        filter: Arc::new(config.filter.clone()),
        style: Arc::new(config.style.clone()),
        metrics,
    };
    let web_result = web::start_web_server(config.web.clone(), state, cancel.clone()).await;

    // Whichever side stops first takes the other one down with it
    cancel.cancel();
    service_task
        .await
        .context("Tracker service task panicked")??;
    web_result?;

    info!("Shutdown complete");
    Ok(())
}
