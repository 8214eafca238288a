//! Async driver around the tracker
//!
//! Polls the feed, runs each snapshot through the tracker and dispatches the
//! metadata lookups the tracker asks for. Lookups run in a `JoinSet` and
//! send their results back over a channel; a removed aircraft's task is
//! aborted, and anything that still arrives late is rejected by its ticket.
use anyhow::Result;
use metrics::{counter, histogram};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, mpsc};
use tokio::task::{AbortHandle, Id, JoinError, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::feed_client::FeedSource;
use crate::metadata::{AircraftMetadata, MetadataLookup};
use crate::tracker::{AircraftTracker, LookupOutcome, LookupTicket, TickReport};

/// Tracker shared between the driver and the web handlers
pub type SharedTracker = Arc<Mutex<AircraftTracker>>;

type LookupResult = (LookupTicket, Option<AircraftMetadata>);

pub struct TrackerService {
    tracker: SharedTracker,
    feed: Box<dyn FeedSource>,
    metadata: Arc<dyn MetadataLookup>,
    interval: Duration,
    lookups: HashMap<LookupTicket, AbortHandle>,
    tasks: JoinSet<()>,
    results_tx: mpsc::UnboundedSender<LookupResult>,
    results_rx: mpsc::UnboundedReceiver<LookupResult>,
}

impl TrackerService {
    pub fn new(
        tracker: SharedTracker,
        feed: Box<dyn FeedSource>,
        metadata: Arc<dyn MetadataLookup>,
        interval: Duration,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            tracker,
            feed,
            metadata,
            interval,
            lookups: HashMap::new(),
            tasks: JoinSet::new(),
            results_tx,
            results_rx,
        }
    }

    pub fn tracker(&self) -> SharedTracker {
        Arc::clone(&self.tracker)
    }

    /// Number of lookups still in flight
    pub fn pending_lookups(&self) -> usize {
        self.lookups.len()
    }

    /// Poll until cancelled, or until a finite feed runs out
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        // replays run unpaced; interval() rejects a zero period
        let mut ticker = (self.feed.is_live() && !self.interval.is_zero()).then(|| {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        info!(
            live = ticker.is_some(),
            interval_ms = self.interval.as_millis() as u64,
            "Tracker service started"
        );

        loop {
            if let Some(ticker) = ticker.as_mut() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
            } else if cancel.is_cancelled() {
                break;
            }

            self.apply_finished_lookups().await;

            match self.step(false).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    info!("Feed ended");
                    self.settle_lookups().await;
                    break;
                }
                Err(e) => {
                    warn!("Failed to poll feed: {:#}", e);
                    counter!("skytrail_feed_errors_total").increment(1);
                }
            }
        }

        self.abort_lookups();
        info!("Tracker service stopped");
        Ok(())
    }

    /// Fetch one snapshot and run it through the tracker
    ///
    /// Returns `Ok(None)` when the feed has no more snapshots.
    pub async fn step(&mut self, init: bool) -> Result<Option<TickReport>> {
        let Some(snapshot) = self.feed.next_snapshot().await? else {
            return Ok(None);
        };

        let (report, requests) = {
            let mut tracker = self.tracker.lock().await;
            let start = Instant::now();
            let report = tracker.process_snapshot(&snapshot, init);
            histogram!("skytrail_snapshot_duration_seconds").record(start.elapsed().as_secs_f64());
            (report, tracker.take_lookup_requests())
        };

        for ticket in &report.removed {
            if let Some(handle) = self.lookups.remove(ticket) {
                handle.abort();
                debug!(icao = %ticket.icao, "Aborted metadata lookup of removed aircraft");
            }
        }
        for ticket in requests {
            self.spawn_lookup(ticket);
        }

        trace!(
            now = snapshot.now,
            aircraft = snapshot.aircraft.len(),
            created = report.created,
            moved = report.moved,
            hidden = report.hidden,
            removed = report.removed.len(),
            "Processed snapshot"
        );
        Ok(Some(report))
    }

    fn spawn_lookup(&mut self, ticket: LookupTicket) {
        let metadata = Arc::clone(&self.metadata);
        let tx = self.results_tx.clone();
        let key = ticket.clone();

        let handle = self.tasks.spawn(async move {
            let result = match metadata.lookup(&ticket.icao).await {
                Ok(result) => result,
                Err(e) => {
                    debug!(icao = %ticket.icao, "Metadata lookup failed: {:#}", e);
                    None
                }
            };
            // the receiver only goes away on shutdown
            let _ = tx.send((ticket, result));
        });

        counter!("skytrail_metadata_lookups_total").increment(1);
        self.lookups.insert(key, handle);
    }

    /// Apply every lookup result that has arrived, without waiting
    pub async fn apply_finished_lookups(&mut self) -> usize {
        while let Some(joined) = self.tasks.try_join_next_with_id() {
            self.reap_lookup(joined);
        }

        let mut applied = 0;
        while let Ok((ticket, metadata)) = self.results_rx.try_recv() {
            self.apply_lookup(ticket, metadata).await;
            applied += 1;
        }
        applied
    }

    /// Wait for every outstanding lookup to finish and apply it
    ///
    /// A lookup task that panicked or was aborted counts as finished.
    pub async fn settle_lookups(&mut self) {
        while let Some(joined) = self.tasks.join_next_with_id().await {
            self.reap_lookup(joined);
        }
        self.apply_finished_lookups().await;
    }

    /// Forget a lookup task that ended without sending a result
    fn reap_lookup(&mut self, joined: Result<(Id, ()), JoinError>) {
        let Err(e) = joined else {
            return;
        };
        if e.is_panic() {
            warn!("Metadata lookup task panicked: {}", e);
            counter!("skytrail_metadata_lookup_panics_total").increment(1);
        }
        let id = e.id();
        self.lookups.retain(|_, handle| handle.id() != id);
    }

    async fn apply_lookup(&mut self, ticket: LookupTicket, metadata: Option<AircraftMetadata>) {
        self.lookups.remove(&ticket);
        let Some(metadata) = metadata else {
            return;
        };

        let outcome = self.tracker.lock().await.complete_lookup(&ticket, &metadata);
        match outcome {
            LookupOutcome::Applied => {}
            LookupOutcome::AppliedSelected => {
                info!(icao = %ticket.icao, "Metadata arrived for selected aircraft");
            }
            LookupOutcome::Stale => {
                debug!(icao = %ticket.icao, token = ticket.token, "Discarding stale metadata");
                counter!("skytrail_metadata_stale_total").increment(1);
            }
        }
    }

    fn abort_lookups(&mut self) {
        self.tasks.abort_all();
        self.lookups.clear();
    }
}
