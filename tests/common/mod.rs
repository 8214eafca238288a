//! Common builders for tracker integration tests
//!
//! Records are built the way a receiver reports them: every key optional,
//! `seen`/`seen_pos` relative to the snapshot's `now`.
#![allow(dead_code)]

use skytrail::AircraftTracker;
use skytrail::config::TrackerConfig;
use skytrail::feed::{AircraftRecord, AircraftSnapshot};
use skytrail::tracker::Altitude;

/// A record heard just now, without a position
pub fn record(hex: &str) -> AircraftRecord {
    AircraftRecord {
        hex: hex.to_string(),
        seen: Some(0.0),
        ..Default::default()
    }
}

/// A record with a fresh position and barometric altitude
pub fn airborne(hex: &str, lon: f64, lat: f64, alt_ft: f64) -> AircraftRecord {
    AircraftRecord {
        lon: Some(lon),
        lat: Some(lat),
        seen_pos: Some(0.0),
        alt_baro: Some(Altitude::Feet(alt_ft)),
        ..record(hex)
    }
}

/// A record with a fresh position on the ground
pub fn on_ground(hex: &str, lon: f64, lat: f64) -> AircraftRecord {
    AircraftRecord {
        lon: Some(lon),
        lat: Some(lat),
        seen_pos: Some(0.0),
        alt_baro: Some(Altitude::Ground),
        ..record(hex)
    }
}

/// Mark the record's position as multilaterated
pub fn mlat(mut record: AircraftRecord) -> AircraftRecord {
    record.mlat = Some(vec!["lat".to_string(), "lon".to_string()]);
    record
}

pub fn snapshot(now: f64, aircraft: Vec<AircraftRecord>) -> AircraftSnapshot {
    AircraftSnapshot {
        now,
        aircraft,
        ..Default::default()
    }
}

pub fn tracker() -> AircraftTracker {
    AircraftTracker::new(TrackerConfig::default())
}

/// Latitude step of roughly one kilometre
pub const KM_LAT: f64 = 0.009;
