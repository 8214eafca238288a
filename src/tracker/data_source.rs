use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::feed::AircraftRecord;

/// MLAT positions older than this no longer mark the aircraft as MLAT
const MLAT_POSITION_MAX_AGE_SECS: f64 = 45.0;

/// Where the aircraft's data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../web/src/lib/types/generated/")]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Adsb,
    Mlat,
    Uat,
    Tisb,
    Other,
    ModeS,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Adsb => write!(f, "adsb"),
            DataSource::Mlat => write!(f, "mlat"),
            DataSource::Uat => write!(f, "uat"),
            DataSource::Tisb => write!(f, "tisb"),
            DataSource::Other => write!(f, "other"),
            DataSource::ModeS => write!(f, "mode_s"),
        }
    }
}

impl DataSource {
    /// Sort rank used by aircraft tables: ADS-B first, plain Mode S last
    pub fn sort_rank(source: Option<DataSource>) -> u8 {
        match source {
            Some(DataSource::Adsb) => 1,
            Some(DataSource::Uat) => 2,
            Some(DataSource::Mlat) => 3,
            Some(DataSource::Tisb) => 4,
            _ => 5,
        }
    }
}

/// Decide the data source for this tick
///
/// Precedence: a fresh MLAT position wins; a UAT aircraft stays UAT;
/// otherwise the record `type` decides, falling back to ADS-B when a
/// position is known and to `Other` when not.
pub fn classify(
    current: Option<DataSource>,
    record: &AircraftRecord,
    has_position: bool,
) -> DataSource {
    let seen_pos = record.seen_pos.unwrap_or(f64::INFINITY);
    if seen_pos < MLAT_POSITION_MAX_AGE_SECS && record.has_mlat_position() {
        return DataSource::Mlat;
    }

    if current == Some(DataSource::Uat) {
        return DataSource::Uat;
    }

    match record.addr_type.as_deref() {
        Some(t) if t.starts_with("tisb") => DataSource::Tisb,
        Some("adsb_icao") | Some("adsb_other") => DataSource::Adsb,
        Some(t) if t.starts_with("adsr") => DataSource::Other,
        Some("adsb_icao_nt") => DataSource::Other,
        _ if has_position => DataSource::Adsb,
        _ => DataSource::Other,
    }
}

/// Source label shown to users: the raw address type when there is one,
/// `mode_s` when nothing better is known
pub fn display_label(source: Option<DataSource>, addr_type: Option<&str>) -> String {
    match source {
        Some(DataSource::Mlat) => "mlat".to_string(),
        Some(DataSource::Uat) => "uat".to_string(),
        _ => match addr_type {
            Some(t) => t.to_string(),
            None if source == Some(DataSource::Adsb) => "adsb_icao".to_string(),
            None => DataSource::ModeS.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(addr_type: Option<&str>) -> AircraftRecord {
        AircraftRecord {
            hex: "abc123".to_string(),
            addr_type: addr_type.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_fresh_mlat_position_wins() {
        let mut r = record(Some("adsb_icao"));
        r.mlat = Some(vec!["lat".to_string(), "lon".to_string()]);
        r.seen_pos = Some(3.0);
        assert_eq!(classify(Some(DataSource::Uat), &r, true), DataSource::Mlat);

        r.seen_pos = Some(50.0);
        assert_eq!(classify(None, &r, true), DataSource::Adsb);
    }

    #[test]
    fn test_uat_is_kept() {
        let r = record(Some("tisb_icao"));
        assert_eq!(classify(Some(DataSource::Uat), &r, true), DataSource::Uat);
    }

    #[test]
    fn test_type_prefixes() {
        assert_eq!(classify(None, &record(Some("tisb_trackfile")), false), DataSource::Tisb);
        assert_eq!(classify(None, &record(Some("adsb_icao")), false), DataSource::Adsb);
        assert_eq!(classify(None, &record(Some("adsb_other")), false), DataSource::Adsb);
        assert_eq!(classify(None, &record(Some("adsr_icao")), true), DataSource::Other);
        assert_eq!(classify(None, &record(Some("adsb_icao_nt")), true), DataSource::Other);
    }

    #[test]
    fn test_fallback_on_position() {
        assert_eq!(classify(None, &record(Some("mode_s")), true), DataSource::Adsb);
        assert_eq!(classify(None, &record(None), true), DataSource::Adsb);
        assert_eq!(classify(Some(DataSource::Adsb), &record(None), false), DataSource::Other);
    }

    #[test]
    fn test_display_label() {
        assert_eq!(display_label(Some(DataSource::Mlat), Some("mlat")), "mlat");
        assert_eq!(display_label(Some(DataSource::Adsb), None), "adsb_icao");
        assert_eq!(display_label(Some(DataSource::Tisb), Some("tisb_other")), "tisb_other");
        assert_eq!(display_label(None, None), "mode_s");
    }

    #[test]
    fn test_sort_rank() {
        assert_eq!(DataSource::sort_rank(Some(DataSource::Adsb)), 1);
        assert_eq!(DataSource::sort_rank(Some(DataSource::Mlat)), 3);
        assert_eq!(DataSource::sort_rank(None), 5);
    }
}
