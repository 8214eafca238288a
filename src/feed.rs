//! Snapshot format produced by readsb/dump1090 (`aircraft.json`)
//!
//! Each poll yields one snapshot: the receiver clock (`now`, seconds) and a
//! list of per-aircraft records. Every key of a record is optional; a missing
//! key means "nothing new this tick", not "clear the value".
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::tracker::altitude::Altitude;

/// One aircraft record from a snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftRecord {
    pub hex: String,
    /// Address/message type, e.g. `adsb_icao`, `mlat`, `tisb_trackfile`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub addr_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub squawk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Seconds since any message from this aircraft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seen: Option<f64>,
    /// Seconds since the last position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seen_pos: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_baro: Option<Altitude>,
    /// Pre-1.15 dump1090 altitude field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<Altitude>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_geom: Option<Altitude>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gs: Option<f64>,
    /// Pre-1.15 dump1090 ground speed field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ias: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tas: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mach: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mag_heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_heading: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baro_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geom_rate: Option<f64>,
    /// Pre-1.15 dump1090 vertical rate field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vert_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_altitude_fms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_altitude_mcp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_qnh: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_modes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nac_p: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nac_v: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nic_baro: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sil: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sil_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,

    /// Names of the fields that were derived from MLAT
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mlat: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<f64>,
}

impl AircraftRecord {
    /// Whether MLAT supplied this record's position
    pub fn has_mlat_position(&self) -> bool {
        self.mlat
            .as_ref()
            .is_some_and(|fields| fields.iter().any(|f| f == "lat"))
    }
}

/// One batch of records sharing a receiver timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AircraftSnapshot {
    /// Receiver clock in seconds since the epoch
    pub now: f64,
    pub messages: Option<u64>,
    pub aircraft: Vec<AircraftRecord>,
    /// Set for snapshots produced by a UAT (978 MHz) receiver
    #[serde(skip)]
    pub uat: bool,
}

/// Wire shape before individual records are validated
#[derive(Deserialize)]
struct RawSnapshot {
    now: f64,
    #[serde(default)]
    messages: Option<u64>,
    #[serde(default)]
    aircraft: Vec<serde_json::Value>,
}

impl AircraftSnapshot {
    /// Parse a snapshot, skipping (and logging) records that do not parse
    ///
    /// Only an unreadable envelope is an error; one malformed aircraft must
    /// not take the rest of the batch down with it.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawSnapshot =
            serde_json::from_str(json).context("Failed to parse aircraft snapshot")?;

        let mut aircraft = Vec::with_capacity(raw.aircraft.len());
        for value in raw.aircraft {
            match serde_json::from_value::<AircraftRecord>(value) {
                Ok(record) if !record.hex.trim().is_empty() => aircraft.push(record),
                Ok(_) => warn!("Skipping aircraft record without hex identifier"),
                Err(e) => warn!("Skipping malformed aircraft record: {}", e),
            }
        }

        Ok(Self {
            now: raw.now,
            messages: raw.messages,
            aircraft,
            uat: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_readsb_snapshot() {
        let json = r#"{
            "now": 1700000000.5,
            "messages": 123456,
            "aircraft": [
                {"hex": "4ca7b2", "type": "adsb_icao", "flight": "RYR12AB ",
                 "alt_baro": 37000, "alt_geom": 37450, "gs": 452.3, "track": 87.4,
                 "lat": 53.1, "lon": -6.2, "seen_pos": 0.4, "seen": 0.1,
                 "rssi": -12.4, "messages": 900, "mlat": [], "category": "A3"},
                {"hex": "~2b1c4d", "type": "mlat", "alt_baro": "ground",
                 "mlat": ["lat", "lon", "track"], "seen": 3.2}
            ]
        }"#;

        let snapshot = AircraftSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.now, 1700000000.5);
        assert_eq!(snapshot.messages, Some(123456));
        assert_eq!(snapshot.aircraft.len(), 2);

        let first = &snapshot.aircraft[0];
        assert_eq!(first.addr_type.as_deref(), Some("adsb_icao"));
        assert_eq!(first.alt_baro, Some(Altitude::Feet(37000.0)));
        assert!(!first.has_mlat_position());

        let second = &snapshot.aircraft[1];
        assert_eq!(second.alt_baro, Some(Altitude::Ground));
        assert!(second.has_mlat_position());
        assert_eq!(second.lat, None);
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let json = r#"{"now": 10, "aircraft": [
            {"hex": "abc123", "alt_baro": "sideways"},
            {"hex": "def456", "gs": 100},
            {"flight": "NOHEX"},
            {"hex": "  "}
        ]}"#;

        let snapshot = AircraftSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.aircraft.len(), 1);
        assert_eq!(snapshot.aircraft[0].hex, "def456");
    }

    #[test]
    fn test_envelope_without_now_is_error() {
        assert!(AircraftSnapshot::from_json(r#"{"aircraft": []}"#).is_err());
    }
}
