use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::geometry::{LonLat, MapPoint};
use crate::marker_style::{self, MarkerStyle, StyleConfig};
use crate::tracker::data_source::display_label;
use crate::tracker::{Aircraft, Altitude, DataSource, Segment};

/// Receiver clock (seconds since the epoch) as a UTC timestamp
fn receiver_time(secs: f64) -> Option<DateTime<Utc>> {
    if secs <= 0.0 {
        return None;
    }
    DateTime::from_timestamp(secs.trunc() as i64, (secs.fract() * 1e9) as u32)
}

/// One marker on the map
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../web/src/lib/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct AircraftMarkerView {
    pub icao: String,
    pub name: String,
    pub position: LonLat,
    /// Position in map space
    pub point: MapPoint,
    #[ts(type = "number | \"ground\" | null")]
    pub altitude: Option<Altitude>,
    pub data_source: Option<DataSource>,
    pub selected: bool,
    pub style: MarkerStyle,
    /// Bumped whenever the trail changes
    pub trail_revision: u64,
}

impl AircraftMarkerView {
    /// `None` for aircraft without a position
    pub fn from_aircraft(aircraft: &Aircraft, style: &StyleConfig) -> Option<Self> {
        let position = aircraft.position?;
        Some(Self {
            icao: aircraft.icao.clone(),
            name: aircraft.name.clone(),
            position,
            point: position.project(),
            altitude: aircraft.altitude,
            data_source: aircraft.data_source,
            selected: aircraft.selected,
            style: marker_style::marker_style(aircraft, style),
            trail_revision: aircraft.track_history().revision(),
        })
    }
}

/// One trail segment, in map space
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../web/src/lib/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SegmentView {
    pub points: Vec<MapPoint>,
    pub estimated: bool,
    pub ground: bool,
    #[ts(type = "number | \"ground\" | null")]
    pub altitude: Option<Altitude>,
    #[ts(type = "number | \"ground\" | null")]
    pub alt_real: Option<Altitude>,
    pub speed: Option<f64>,
    pub color: String,
}

impl SegmentView {
    pub fn from_segment(segment: &Segment, style: &StyleConfig) -> Self {
        Self {
            points: segment.points().to_vec(),
            estimated: segment.estimated,
            ground: segment.ground,
            altitude: segment.altitude,
            alt_real: segment.alt_real,
            speed: segment.speed,
            color: marker_style::trail_color(segment, &style.palette),
        }
    }
}

/// Link from the last committed trail point to the live position
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../web/src/lib/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct ElasticView {
    pub from: MapPoint,
    pub to: MapPoint,
    pub color: String,
}

/// Full state of one aircraft, including its trail
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../web/src/lib/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct AircraftDetailView {
    pub icao: String,
    pub name: String,
    pub registration: Option<String>,
    pub icao_type: Option<String>,
    pub type_description: Option<String>,
    pub wtc: Option<String>,
    pub category: Option<String>,
    pub flight: Option<String>,
    pub squawk: Option<String>,
    pub emergency: Option<String>,
    pub data_source: Option<DataSource>,
    /// Source label: the raw address type when known
    pub source_label: String,
    pub source_rank: u8,

    pub position: Option<LonLat>,
    #[ts(type = "number | \"ground\" | null")]
    pub altitude: Option<Altitude>,
    #[ts(type = "number | \"ground\" | null")]
    pub alt_baro: Option<Altitude>,
    #[ts(type = "number | \"ground\" | null")]
    pub alt_geom: Option<Altitude>,
    pub on_ground: bool,
    pub speed: Option<f64>,
    pub ias: Option<f64>,
    pub tas: Option<f64>,
    pub mach: Option<f64>,
    pub roll: Option<f64>,
    pub track: Option<f64>,
    pub track_rate: Option<f64>,
    pub true_heading: Option<f64>,
    pub mag_heading: Option<f64>,
    pub vert_rate: Option<f64>,
    pub baro_rate: Option<f64>,
    pub geom_rate: Option<f64>,
    pub nav_altitude: Option<f64>,
    pub nav_heading: Option<f64>,
    pub nav_qnh: Option<f64>,
    pub nav_modes: Option<Vec<String>>,

    pub nac_p: Option<u8>,
    pub nac_v: Option<u8>,
    pub nic_baro: Option<u8>,
    pub sil: Option<u8>,
    pub sil_type: Option<String>,
    pub rc: Option<f64>,
    pub version: Option<u8>,
    pub messages: Option<u64>,
    pub rssi: Option<f64>,
    pub site_distance: Option<f64>,

    pub seen: f64,
    pub seen_pos: f64,
    pub last_message_at: Option<DateTime<Utc>>,
    pub position_at: Option<DateTime<Utc>>,

    pub selected: bool,
    pub visible: bool,
    pub style: MarkerStyle,
    pub history_size: usize,
    pub segments: Vec<SegmentView>,
    pub elastic: Option<ElasticView>,
}

impl AircraftDetailView {
    pub fn from_aircraft(aircraft: &Aircraft, style: &StyleConfig) -> Self {
        let history = aircraft.track_history();
        let elastic = match (history.current(), aircraft.position) {
            (Some(current), Some(position)) => current.last_point().map(|from| ElasticView {
                from: *from,
                to: position.project(),
                color: marker_style::trail_color(current, &style.palette),
            }),
            _ => None,
        };

        Self {
            icao: aircraft.icao.clone(),
            name: aircraft.name.clone(),
            registration: aircraft.registration.clone(),
            icao_type: aircraft.icao_type.clone(),
            type_description: aircraft.type_description.clone(),
            wtc: aircraft.wtc.clone(),
            category: aircraft.category.clone(),
            flight: aircraft.flight.clone(),
            squawk: aircraft.squawk.clone(),
            emergency: aircraft
                .squawk
                .as_deref()
                .and_then(marker_style::special_squawk)
                .map(|s| s.text.to_string()),
            data_source: aircraft.data_source,
            source_label: display_label(aircraft.data_source, aircraft.addr_type.as_deref()),
            source_rank: DataSource::sort_rank(aircraft.data_source),
            position: aircraft.position,
            altitude: aircraft.altitude,
            alt_baro: aircraft.alt_baro,
            alt_geom: aircraft.alt_geom,
            on_ground: aircraft.on_ground,
            speed: aircraft.speed,
            ias: aircraft.ias,
            tas: aircraft.tas,
            mach: aircraft.mach,
            roll: aircraft.roll,
            track: aircraft.track,
            track_rate: aircraft.track_rate,
            true_heading: aircraft.true_heading,
            mag_heading: aircraft.mag_heading,
            vert_rate: aircraft.vert_rate,
            baro_rate: aircraft.baro_rate,
            geom_rate: aircraft.geom_rate,
            nav_altitude: aircraft.nav_altitude,
            nav_heading: aircraft.nav_heading,
            nav_qnh: aircraft.nav_qnh,
            nav_modes: aircraft.nav_modes.clone(),
            nac_p: aircraft.nac_p,
            nac_v: aircraft.nac_v,
            nic_baro: aircraft.nic_baro,
            sil: aircraft.sil,
            sil_type: aircraft.sil_type.clone(),
            rc: aircraft.rc,
            version: aircraft.version,
            messages: aircraft.messages,
            rssi: aircraft.rssi,
            site_distance: aircraft.site_distance,
            seen: aircraft.seen,
            seen_pos: aircraft.seen_pos,
            last_message_at: receiver_time(aircraft.last_message_time),
            position_at: aircraft
                .position
                .and_then(|_| receiver_time(aircraft.position_time)),
            selected: aircraft.selected,
            visible: aircraft.visible,
            style: marker_style::marker_style(aircraft, style),
            history_size: aircraft.history_size,
            segments: history
                .segments()
                .iter()
                .map(|s| SegmentView::from_segment(s, style))
                .collect(),
            elastic,
        }
    }
}

/// Body of `PUT /api/selection`; `null` clears the selection
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../web/src/lib/types/generated/")]
pub struct SelectionRequest {
    pub icao: Option<String>,
}
