//! Live aircraft state
//!
//! [`AircraftTracker`] owns every tracked [`Aircraft`], feeds snapshots
//! through them, and holds the selection. It is a plain single-writer
//! structure; the async driver in `service` wraps it in a mutex.
pub mod aircraft_state;
pub mod altitude;
pub mod data_source;
pub mod filter;
pub mod segmentation;
pub mod track_history;

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use metrics::{counter, gauge};
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::feed::AircraftSnapshot;
use crate::metadata::AircraftMetadata;

pub use aircraft_state::{Aircraft, TickOutcome};
pub use altitude::Altitude;
pub use data_source::DataSource;
pub use track_history::{Segment, TrackHistory};

/// Identifies one metadata lookup: the aircraft and the token it was issued with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupTicket {
    pub icao: String,
    pub token: u64,
}

/// Result of applying a finished metadata lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Applied,
    /// Applied to the selected aircraft; detail views should refresh
    AppliedSelected,
    /// The aircraft is gone or was re-created since the lookup was issued
    Stale,
}

/// What one snapshot did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub created: usize,
    pub moved: usize,
    pub restyled: usize,
    pub hidden: usize,
    /// Tickets of aircraft removed for inactivity
    pub removed: Vec<LookupTicket>,
}

pub struct AircraftTracker {
    config: TrackerConfig,
    aircraft: HashMap<String, Aircraft>,
    selected: Option<String>,
    /// Receiver clock of the last processed snapshot
    last_now: Option<f64>,
    next_token: u64,
    pending_lookups: Vec<LookupTicket>,
    /// Receiver-wide message counter from the last snapshot
    messages: Option<u64>,
}

impl AircraftTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            aircraft: HashMap::new(),
            selected: None,
            last_now: None,
            next_token: 0,
            pending_lookups: Vec::new(),
            messages: None,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn last_now(&self) -> Option<f64> {
        self.last_now
    }

    pub fn messages(&self) -> Option<u64> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.aircraft.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aircraft.is_empty()
    }

    pub fn get(&self, icao: &str) -> Option<&Aircraft> {
        self.aircraft.get(icao)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aircraft> {
        self.aircraft.values()
    }

    pub fn selected(&self) -> Option<&Aircraft> {
        self.selected.as_deref().and_then(|icao| self.aircraft.get(icao))
    }

    /// Merge a snapshot into the tracked aircraft and advance every one by a tick
    ///
    /// `init` marks a bulk seed from history: only core fields are merged and
    /// the trail engine is skipped, so no trail points are written. Every
    /// visible aircraft is reported as moved so its marker gets drawn.
    pub fn process_snapshot(&mut self, snapshot: &AircraftSnapshot, init: bool) -> TickReport {
        let mut report = TickReport::default();
        let now = snapshot.now;

        if let Some(last) = self.last_now
            && now < last
        {
            warn!(now, last, "Ignoring snapshot older than the last processed one");
            counter!("skytrail_snapshots_out_of_order_total").increment(1);
            return report;
        }
        let last_now = self.last_now.unwrap_or(now);

        for record in &snapshot.aircraft {
            let icao = record.hex.trim().to_lowercase();
            let aircraft = match self.aircraft.entry(icao) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let token = self.next_token;
                    self.next_token += 1;
                    self.pending_lookups.push(LookupTicket {
                        icao: entry.key().clone(),
                        token,
                    });
                    report.created += 1;
                    debug!(icao = %entry.key(), "New aircraft");
                    let aircraft = Aircraft::new(entry.key(), token);
                    entry.insert(aircraft)
                }
            };

            if snapshot.uat {
                aircraft.data_source = Some(DataSource::Uat);
            }
            aircraft.update_data(now, record, init, self.config.site.as_ref());
        }

        for aircraft in self.aircraft.values_mut() {
            match aircraft.update_tick(now, last_now, init, self.config.turn_density) {
                TickOutcome::Moved => report.moved += 1,
                TickOutcome::Restyled => report.restyled += 1,
                TickOutcome::Hidden => report.hidden += 1,
                TickOutcome::StillHidden => {}
            }
        }

        report.removed = self.reap_inactive();

        self.last_now = Some(now);
        if snapshot.messages.is_some() {
            self.messages = snapshot.messages;
        }

        counter!("skytrail_snapshots_processed_total").increment(1);
        counter!("skytrail_aircraft_created_total").increment(report.created as u64);
        counter!("skytrail_aircraft_removed_total").increment(report.removed.len() as u64);
        gauge!("skytrail_aircraft_tracked").set(self.aircraft.len() as f64);
        gauge!("skytrail_aircraft_visible")
            .set(self.aircraft.values().filter(|a| a.visible).count() as f64);

        report
    }

    fn reap_inactive(&mut self) -> Vec<LookupTicket> {
        let remove_after = self.config.remove_after_secs;
        let expired: Vec<String> = self
            .aircraft
            .values()
            .filter(|a| !a.selected && a.seen > remove_after)
            .map(|a| a.icao.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|icao| self.remove(&icao))
            .collect()
    }

    /// Select one aircraft, or clear the selection with `None`
    ///
    /// Returns false when the requested aircraft is not tracked; the current
    /// selection is left alone in that case.
    pub fn select(&mut self, icao: Option<&str>) -> bool {
        if let Some(icao) = icao
            && !self.aircraft.contains_key(icao)
        {
            return false;
        }

        if let Some(previous) = self.selected.take()
            && let Some(aircraft) = self.aircraft.get_mut(&previous)
        {
            aircraft.selected = false;
        }

        if let Some(icao) = icao
            && let Some(aircraft) = self.aircraft.get_mut(icao)
        {
            aircraft.selected = true;
            aircraft.visible = true;
            self.selected = Some(icao.to_string());
            info!(%icao, "Selected aircraft");
        }
        true
    }

    /// Drop an aircraft; its pending lookup becomes stale
    pub fn remove(&mut self, icao: &str) -> Option<LookupTicket> {
        if self.selected.as_deref() == Some(icao) {
            self.selected = None;
        }
        let aircraft = self.aircraft.remove(icao)?;
        self.pending_lookups.retain(|t| t.icao != icao);
        debug!(%icao, seen = aircraft.seen, "Removed aircraft");
        Some(LookupTicket {
            icao: aircraft.icao,
            token: aircraft.lookup_token,
        })
    }

    /// Lookups issued since the last call
    pub fn take_lookup_requests(&mut self) -> Vec<LookupTicket> {
        std::mem::take(&mut self.pending_lookups)
    }

    /// Apply a finished lookup if its aircraft is still the one it was issued for
    pub fn complete_lookup(
        &mut self,
        ticket: &LookupTicket,
        metadata: &AircraftMetadata,
    ) -> LookupOutcome {
        match self.aircraft.get_mut(&ticket.icao) {
            Some(aircraft) if aircraft.lookup_token == ticket.token => {
                aircraft.apply_metadata(metadata);
                if aircraft.selected {
                    LookupOutcome::AppliedSelected
                } else {
                    LookupOutcome::Applied
                }
            }
            _ => LookupOutcome::Stale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::AircraftRecord;

    fn record(hex: &str, lon: f64, lat: f64) -> AircraftRecord {
        AircraftRecord {
            hex: hex.to_string(),
            lon: Some(lon),
            lat: Some(lat),
            seen: Some(0.0),
            seen_pos: Some(0.0),
            alt_baro: Some(Altitude::Feet(5000.0)),
            ..Default::default()
        }
    }

    fn snapshot(now: f64, aircraft: Vec<AircraftRecord>) -> AircraftSnapshot {
        AircraftSnapshot {
            now,
            aircraft,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_aircraft_issue_lookup_tickets() {
        let mut tracker = AircraftTracker::new(TrackerConfig::default());
        let report = tracker.process_snapshot(
            &snapshot(100.0, vec![record("3C6DD4", 10.0, 50.0), record("def456", 11.0, 51.0)]),
            false,
        );
        assert_eq!(report.created, 2);
        assert_eq!(report.moved, 2);
        assert!(tracker.get("3c6dd4").is_some());

        let tickets = tracker.take_lookup_requests();
        assert_eq!(tickets.len(), 2);
        assert!(tracker.take_lookup_requests().is_empty());

        tracker.process_snapshot(&snapshot(101.0, vec![record("3c6dd4", 10.0, 50.0)]), false);
        assert!(tracker.take_lookup_requests().is_empty());
    }

    #[test]
    fn test_out_of_order_snapshot_is_ignored() {
        let mut tracker = AircraftTracker::new(TrackerConfig::default());
        tracker.process_snapshot(&snapshot(100.0, vec![record("3c6dd4", 10.0, 50.0)]), false);
        let report =
            tracker.process_snapshot(&snapshot(90.0, vec![record("def456", 10.0, 50.0)]), false);
        assert_eq!(report, TickReport::default());
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.last_now(), Some(100.0));
    }

    #[test]
    fn test_uat_snapshot_marks_source() {
        let mut tracker = AircraftTracker::new(TrackerConfig::default());
        let mut snap = snapshot(100.0, vec![record("a1b2c3", 10.0, 50.0)]);
        snap.uat = true;
        tracker.process_snapshot(&snap, false);
        assert_eq!(tracker.get("a1b2c3").unwrap().data_source, Some(DataSource::Uat));
    }

    #[test]
    fn test_selection_is_exclusive() {
        let mut tracker = AircraftTracker::new(TrackerConfig::default());
        tracker.process_snapshot(
            &snapshot(100.0, vec![record("aaa111", 10.0, 50.0), record("bbb222", 11.0, 51.0)]),
            false,
        );

        assert!(tracker.select(Some("aaa111")));
        assert!(tracker.select(Some("bbb222")));
        assert!(!tracker.get("aaa111").unwrap().selected);
        assert_eq!(tracker.selected().unwrap().icao, "bbb222");

        assert!(!tracker.select(Some("zzz999")));
        assert_eq!(tracker.selected().unwrap().icao, "bbb222");

        assert!(tracker.select(None));
        assert!(tracker.selected().is_none());
        assert!(tracker.iter().all(|a| !a.selected));
    }

    #[test]
    fn test_remove_clears_selection_and_stales_lookup() {
        let mut tracker = AircraftTracker::new(TrackerConfig::default());
        tracker.process_snapshot(&snapshot(100.0, vec![record("3c6dd4", 10.0, 50.0)]), false);
        let ticket = tracker.take_lookup_requests().remove(0);
        tracker.select(Some("3c6dd4"));

        assert_eq!(tracker.remove("3c6dd4"), Some(ticket.clone()));
        assert!(tracker.selected().is_none());

        // same identifier re-appears with a new token
        tracker.process_snapshot(&snapshot(101.0, vec![record("3c6dd4", 10.0, 50.0)]), false);
        let metadata = AircraftMetadata {
            registration: Some("D-AIBL".to_string()),
            ..Default::default()
        };
        assert_eq!(tracker.complete_lookup(&ticket, &metadata), LookupOutcome::Stale);
        assert_eq!(tracker.get("3c6dd4").unwrap().registration, None);

        let fresh = tracker.take_lookup_requests().remove(0);
        assert_eq!(tracker.complete_lookup(&fresh, &metadata), LookupOutcome::Applied);
        tracker.select(Some("3c6dd4"));
        assert_eq!(
            tracker.complete_lookup(&fresh, &metadata),
            LookupOutcome::AppliedSelected
        );
    }

    #[test]
    fn test_init_snapshot_writes_no_trail() {
        let mut tracker = AircraftTracker::new(TrackerConfig::default());
        let report =
            tracker.process_snapshot(&snapshot(100.0, vec![record("3c6dd4", 10.0, 50.0)]), true);
        assert_eq!(report.moved, 1);

        let aircraft = tracker.get("3c6dd4").unwrap();
        assert!(aircraft.visible);
        assert!(aircraft.track_history().is_empty());
        assert_eq!(aircraft.history_size, 0);

        // the first live tick starts the trail
        tracker.process_snapshot(&snapshot(101.0, vec![record("3c6dd4", 10.0, 50.0)]), false);
        assert_eq!(tracker.get("3c6dd4").unwrap().track_history().len(), 1);
    }

    #[test]
    fn test_inactive_aircraft_are_reaped_unless_selected() {
        let mut tracker = AircraftTracker::new(TrackerConfig {
            remove_after_secs: 60.0,
            ..Default::default()
        });
        tracker.process_snapshot(
            &snapshot(100.0, vec![record("aaa111", 10.0, 50.0), record("bbb222", 11.0, 51.0)]),
            false,
        );
        tracker.select(Some("bbb222"));

        let report = tracker.process_snapshot(&snapshot(161.0, vec![]), false);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].icao, "aaa111");
        assert!(tracker.get("aaa111").is_none());
        assert!(tracker.get("bbb222").is_some());
    }
}
