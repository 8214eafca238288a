use anyhow::{Context, Result};
use skytrail::actions::views::AircraftDetailView;
use skytrail::config::SkytrailConfig;
use skytrail::feed_client::ReplayFeed;
use skytrail::service::TrackerService;
use skytrail::tracker::{AircraftTracker, TickReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

use super::load_metadata;

/// Totals over a whole replay
#[derive(Debug, Default)]
struct ReplaySummary {
    snapshots: usize,
    created: usize,
    moved: usize,
    removed: usize,
}

impl ReplaySummary {
    fn add(&mut self, report: &TickReport) {
        self.snapshots += 1;
        self.created += report.created;
        self.moved += report.moved;
        self.removed += report.removed.len();
    }
}

/// Run a recording through the tracker as fast as it can be read
///
/// The first `warmup` snapshots are processed as initial load, the way a
/// browser catches up on stored history before going live.
pub async fn handle_replay(
    config_path: &Path,
    file: PathBuf,
    warmup: usize,
    select: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = SkytrailConfig::load_or_default(config_path)?;
    info!("Replaying {:?}", file);

    let tracker = Arc::new(Mutex::new(AircraftTracker::new(config.tracker.clone())));
    let feed = ReplayFeed::from_file(&file).await?;
    let metadata = load_metadata(&config.metadata).await?;
    let mut service = TrackerService::new(Arc::clone(&tracker), Box::new(feed), metadata, Duration::ZERO);

    let mut summary = ReplaySummary::default();
    loop {
        service.apply_finished_lookups().await;
        let init = summary.snapshots < warmup;
        let Some(report) = service.step(init).await? else {
            break;
        };
        summary.add(&report);

        if summary.snapshots == warmup.max(1)
            && let Some(icao) = select.as_deref()
        {
            let icao = icao.trim().to_lowercase();
            let found = tracker.lock().await.select(Some(&icao));
            info!(%icao, found, "Selecting aircraft after warmup");
        }
    }
    service.settle_lookups().await;

    let tracker = tracker.lock().await;
    let points: usize = tracker.iter().map(|a| a.history_size).sum();
    info!(
        snapshots = summary.snapshots,
        created = summary.created,
        moved = summary.moved,
        removed = summary.removed,
        tracked = tracker.len(),
        trail_points = points,
        "Replay finished"
    );

    if let Some(output) = output {
        let mut views: Vec<AircraftDetailView> = tracker
            .iter()
            .map(|a| AircraftDetailView::from_aircraft(a, &config.style))
            .collect();
        views.sort_by(|a, b| a.icao.cmp(&b.icao));

        let json = serde_json::to_string_pretty(&views).context("Failed to serialize aircraft")?;
        tokio::fs::write(&output, json)
            .await
            .with_context(|| format!("Failed to write {:?}", output))?;
        info!("Wrote {} aircraft to {:?}", views.len(), output);
    }

    Ok(())
}
