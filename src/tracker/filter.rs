use serde::{Deserialize, Serialize};

use super::aircraft_state::Aircraft;
use super::altitude::{AltitudeUnits, convert_altitude};

/// Whether a class of aircraft is shown or filtered out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Shown,
    Filtered,
}

/// Display filter; filtered aircraft keep being tracked but get no marker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Lower altitude bound in `altitude_units`; needs `max_altitude` too
    pub min_altitude: Option<f64>,
    pub max_altitude: Option<f64>,
    pub altitude_units: AltitudeUnits,
    /// `filtered` hides surface vehicles (category `C*`)
    pub ground_vehicles: FilterMode,
    /// `filtered` hides anonymised MLAT identifiers (`~` prefix)
    pub blocked_mlat: FilterMode,
}

impl FilterConfig {
    /// Check whether the aircraft's marker should be hidden
    ///
    /// When altitude bounds are configured they decide on their own; the
    /// class filters are only consulted without bounds.
    pub fn is_filtered(&self, aircraft: &Aircraft) -> bool {
        if let (Some(min), Some(max)) = (self.min_altitude, self.max_altitude) {
            let Some(altitude) = aircraft.altitude else {
                return true;
            };
            let altitude = if altitude.is_ground() {
                0.0
            } else {
                convert_altitude(altitude.feet_or_zero(), self.altitude_units)
            };
            return altitude < min || altitude > max;
        }

        if self.ground_vehicles == FilterMode::Filtered
            && aircraft
                .category
                .as_deref()
                .is_some_and(|c| c.starts_with('C'))
        {
            return true;
        }

        if self.blocked_mlat == FilterMode::Filtered && aircraft.icao.starts_with('~') {
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::altitude::Altitude;

    fn aircraft(icao: &str, altitude: Option<Altitude>, category: Option<&str>) -> Aircraft {
        let mut ac = Aircraft::new(icao, 1);
        ac.altitude = altitude;
        ac.category = category.map(str::to_string);
        ac
    }

    #[test]
    fn test_no_filter_shows_everything() {
        let filter = FilterConfig::default();
        assert!(!filter.is_filtered(&aircraft("~abc", None, Some("C1"))));
    }

    #[test]
    fn test_altitude_bounds() {
        let filter = FilterConfig {
            min_altitude: Some(1000.0),
            max_altitude: Some(20000.0),
            ..Default::default()
        };

        assert!(filter.is_filtered(&aircraft("a1", None, None)));
        assert!(filter.is_filtered(&aircraft("a1", Some(Altitude::Ground), None)));
        assert!(filter.is_filtered(&aircraft("a1", Some(Altitude::Feet(35000.0)), None)));
        assert!(!filter.is_filtered(&aircraft("a1", Some(Altitude::Feet(5000.0)), None)));
    }

    #[test]
    fn test_altitude_bounds_in_metres() {
        let filter = FilterConfig {
            min_altitude: Some(0.0),
            max_altitude: Some(3000.0),
            altitude_units: AltitudeUnits::Metres,
            ..Default::default()
        };

        // 9000 ft is about 2743 m
        assert!(!filter.is_filtered(&aircraft("a1", Some(Altitude::Feet(9000.0)), None)));
        assert!(filter.is_filtered(&aircraft("a1", Some(Altitude::Feet(12000.0)), None)));
        assert!(!filter.is_filtered(&aircraft("a1", Some(Altitude::Ground), None)));
    }

    #[test]
    fn test_ground_vehicles() {
        let filter = FilterConfig {
            ground_vehicles: FilterMode::Filtered,
            ..Default::default()
        };
        assert!(filter.is_filtered(&aircraft("a1", None, Some("C2"))));
        assert!(!filter.is_filtered(&aircraft("a1", None, Some("A3"))));
        assert!(!filter.is_filtered(&aircraft("a1", None, None)));
    }

    #[test]
    fn test_blocked_mlat() {
        let filter = FilterConfig {
            blocked_mlat: FilterMode::Filtered,
            ..Default::default()
        };
        assert!(filter.is_filtered(&aircraft("~4b1234", None, None)));
        assert!(!filter.is_filtered(&aircraft("4b1234", None, None)));
    }
}
