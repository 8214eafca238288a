//! Geographic helpers used by the tracker
//!
//! Distances use the mean earth radius so they agree with what the web map
//! measures on its side; projected coordinates are spherical Web Mercator
//! (EPSG:3857) metres, the space the map draws trails in.
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Mean earth radius in metres
const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;

/// WGS84 semi-major axis, the sphere radius used by Web Mercator
const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Web Mercator cannot represent the poles; latitudes are clamped to this
const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// A longitude/latitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Great-circle distance to another point in metres
    pub fn distance_to(&self, other: &LonLat) -> f64 {
        haversine_distance(self.lat, self.lon, other.lat, other.lon)
    }

    /// Initial bearing from this point towards `other`, 0-360 degrees
    pub fn bearing_to(&self, other: &LonLat) -> f64 {
        initial_bearing(self, other)
    }

    /// Project into Web Mercator metres
    pub fn project(&self) -> MapPoint {
        MapPoint::from_lon_lat(self)
    }
}

/// A point in projected map space (EPSG:3857 metres)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    pub fn from_lon_lat(p: &LonLat) -> Self {
        let lat = p.lat.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT);
        let x = WEB_MERCATOR_RADIUS_M * p.lon.to_radians();
        let y = WEB_MERCATOR_RADIUS_M
            * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0)
                .tan()
                .ln();
        Self { x, y }
    }

    /// Inverse projection back to degrees
    pub fn to_lon_lat(&self) -> LonLat {
        let lon = (self.x / WEB_MERCATOR_RADIUS_M).to_degrees();
        let lat = (2.0 * (self.y / WEB_MERCATOR_RADIUS_M).exp().atan()
            - std::f64::consts::FRAC_PI_2)
            .to_degrees();
        LonLat { lon, lat }
    }
}

/// Calculate distance between two points using Haversine formula
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    MEAN_EARTH_RADIUS_M * c
}

fn initial_bearing(from: &LonLat, to: &LonLat) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Calculate the angular difference between two headings in degrees
/// Returns the smallest angle between the two headings (0-180 degrees)
pub fn angular_difference(angle1: f64, angle2: f64) -> f64 {
    let diff = (angle1 - angle2).abs() % 360.0;
    if diff > 180.0 { 360.0 - diff } else { diff }
}
