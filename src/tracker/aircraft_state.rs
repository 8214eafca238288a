use tracing::trace;

use crate::feed::AircraftRecord;
use crate::geometry::LonLat;
use crate::metadata::AircraftMetadata;
use crate::registration::registration_from_icao;

use super::altitude::{Altitude, round_altitude};
use super::data_source::{self, DataSource};
use super::track_history::TrackHistory;

/// Slack allowed when a record's position is older than the one we hold
const POSITION_AGE_SLACK_SECS: f64 = 2.0;

/// Hide the aircraft when no message arrived for this long
const MESSAGE_TIMEOUT_SECS: f64 = 58.0;

/// Hide the aircraft when no position arrived for this long
const POSITION_TIMEOUT_SECS: f64 = 100.0;

/// Only derive rotation from movement when the aircraft moved this far
const MIN_BEARING_DISTANCE_M: f64 = 50.0;

/// Z-order for aircraft on the ground: below everything airborne
pub const GROUND_Z_INDEX: i32 = -10_000;

/// Size of the RSSI smoothing ring
const RSSI_SLOTS: usize = 4;

/// Kinematic state as of the last `update_track_prev`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSnapshot {
    pub position: Option<LonLat>,
    pub time: f64,
    pub track: Option<f64>,
    pub true_heading: Option<f64>,
    pub altitude: Option<Altitude>,
    pub alt_rounded: Option<Altitude>,
    pub speed: Option<f64>,
}

/// State at the last point appended to the trail
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TailState {
    pub position: Option<LonLat>,
    pub time: Option<f64>,
    pub track: Option<f64>,
    pub true_heading: Option<f64>,
}

/// What a tick did to the aircraft, so the caller knows what to redraw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Position or trail changed: refresh trail and marker
    Moved,
    /// Nothing positional changed: refresh marker styling only
    Restyled,
    /// Timed out this tick: release marker and trail resources
    Hidden,
    /// Still timed out, nothing to do
    StillHidden,
}

/// One tracked aircraft
#[derive(Debug, Clone)]
pub struct Aircraft {
    pub icao: String,
    pub registration: Option<String>,
    pub icao_type: Option<String>,
    pub type_description: Option<String>,
    pub wtc: Option<String>,
    pub category: Option<String>,
    pub data_source: Option<DataSource>,
    /// Raw record `type`
    pub addr_type: Option<String>,
    pub flight: Option<String>,
    pub squawk: Option<String>,

    pub position: Option<LonLat>,
    pub altitude: Option<Altitude>,
    pub alt_baro: Option<Altitude>,
    pub alt_geom: Option<Altitude>,
    pub alt_rounded: Option<Altitude>,
    pub on_ground: bool,
    pub z_index: i32,

    pub speed: Option<f64>,
    pub gs: Option<f64>,
    pub ias: Option<f64>,
    pub tas: Option<f64>,
    pub mach: Option<f64>,
    pub roll: Option<f64>,
    pub track: Option<f64>,
    pub track_rate: Option<f64>,
    pub true_heading: Option<f64>,
    pub mag_heading: Option<f64>,
    pub baro_rate: Option<f64>,
    pub geom_rate: Option<f64>,
    pub vert_rate: Option<f64>,
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
    rssi_ring: Option<[f64; RSSI_SLOTS]>,
    rssi_index: usize,

    /// Metres from the receiver site, when one is configured
    pub site_distance: Option<f64>,
    pub name: String,
    /// Icon rotation in degrees
    pub rotation: f64,

    /// Receiver time of the last message
    pub last_message_time: f64,
    /// Receiver time of the current position
    pub position_time: f64,
    /// Seconds since the last message, as of the last tick
    pub seen: f64,
    /// Seconds since the last position, as of the last tick
    pub seen_pos: f64,

    pub(crate) prev: TrackSnapshot,
    pub(crate) tail: TailState,
    pub(crate) history: TrackHistory,
    /// Points committed to the trail so far
    pub history_size: usize,

    pub selected: bool,
    pub visible: bool,

    /// Identifies the metadata lookup issued when this aircraft appeared
    pub(crate) lookup_token: u64,
}

impl Aircraft {
    pub fn new(icao: &str, lookup_token: u64) -> Self {
        let mut aircraft = Self {
            icao: icao.to_string(),
            registration: registration_from_icao(icao),
            icao_type: None,
            type_description: None,
            wtc: None,
            category: None,
            data_source: None,
            addr_type: None,
            flight: None,
            squawk: None,
            position: None,
            altitude: None,
            alt_baro: None,
            alt_geom: None,
            alt_rounded: None,
            on_ground: false,
            z_index: 0,
            speed: None,
            gs: None,
            ias: None,
            tas: None,
            mach: None,
            roll: None,
            track: None,
            track_rate: None,
            true_heading: None,
            mag_heading: None,
            baro_rate: None,
            geom_rate: None,
            vert_rate: None,
            nav_altitude: None,
            nav_heading: None,
            nav_qnh: None,
            nav_modes: None,
            nac_p: None,
            nac_v: None,
            nic_baro: None,
            sil: None,
            sil_type: None,
            rc: None,
            version: None,
            messages: None,
            rssi: None,
            rssi_ring: None,
            rssi_index: 0,
            site_distance: None,
            name: String::new(),
            rotation: 0.0,
            last_message_time: 0.0,
            position_time: 0.0,
            seen: 0.0,
            seen_pos: 0.0,
            prev: TrackSnapshot::default(),
            tail: TailState::default(),
            history: TrackHistory::new(),
            history_size: 0,
            selected: false,
            visible: true,
            lookup_token,
        };
        aircraft.name = aircraft.display_name();
        aircraft
    }

    pub fn track_history(&self) -> &TrackHistory {
        &self.history
    }

    /// Position and time the trail was last committed at
    pub fn previous(&self) -> &TrackSnapshot {
        &self.prev
    }

    /// Merge one record into the aircraft's state
    ///
    /// With `init` set only position, source, altitude, speed, track and
    /// callsign are taken; the bulk-seed path needs nothing else.
    pub fn update_data(
        &mut self,
        now: f64,
        record: &AircraftRecord,
        init: bool,
        site: Option<&LonLat>,
    ) {
        self.last_message_time = now - record.seen.unwrap_or(0.0);

        // keep the last known position even if stale, unless this one is older
        if let (Some(lat), Some(lon)) = (record.lat, record.lon) {
            let seen_pos = record.seen_pos.or(record.seen).unwrap_or(0.0);
            if seen_pos < now - self.position_time + POSITION_AGE_SLACK_SECS {
                self.position = Some(LonLat::new(lon, lat));
                self.position_time = now - seen_pos;
            }
        }

        self.data_source = Some(data_source::classify(
            self.data_source,
            record,
            self.position.is_some(),
        ));

        // keep the last known altitude even if stale
        if let Some(alt) = record.alt_baro.or(record.altitude) {
            self.altitude = Some(alt);
            self.alt_baro = Some(alt);
        } else {
            self.alt_baro = None;
            if let Some(alt) = record.alt_geom {
                self.altitude = Some(alt);
            }
        }

        self.alt_rounded = round_altitude(self.altitude);
        self.on_ground = self.altitude.is_some_and(|a| a.is_ground());
        self.z_index = if self.on_ground {
            GROUND_Z_INDEX
        } else {
            self.alt_rounded.map(|a| a.feet_or_zero() as i32).unwrap_or(0)
        };

        self.speed = record.gs.or(record.speed);

        if let Some(track) = record.track {
            self.track = Some(track);
        }
        if let Some(flight) = &record.flight {
            self.flight = Some(flight.clone());
        }

        if init {
            return;
        }

        self.messages = record.messages;
        if let Some(rssi) = record.rssi {
            let ring = self.rssi_ring.get_or_insert([rssi; RSSI_SLOTS]);
            ring[self.rssi_index % RSSI_SLOTS] = rssi;
            self.rssi_index = self.rssi_index.wrapping_add(1);
            self.rssi = Some(ring.iter().sum::<f64>() / RSSI_SLOTS as f64);
        }

        self.gs = record.gs.or(record.speed);
        self.baro_rate = record.baro_rate.or(record.vert_rate);

        self.alt_geom = record.alt_geom;
        self.ias = record.ias;
        self.tas = record.tas;
        self.track_rate = record.track_rate;
        self.mag_heading = record.mag_heading;
        self.mach = record.mach;
        self.roll = record.roll;
        self.nav_heading = record.nav_heading;
        self.nav_modes = record.nav_modes.clone();
        self.nac_p = record.nac_p;
        self.nac_v = record.nac_v;
        self.nic_baro = record.nic_baro;
        self.sil_type = record.sil_type.clone();
        self.sil = record.sil;
        self.nav_qnh = record.nav_qnh;
        self.geom_rate = record.geom_rate;
        self.rc = record.rc;
        self.squawk = record.squawk.clone();
        self.category = record.category.clone();
        self.version = record.version;
        self.true_heading = record.true_heading;
        self.addr_type = record.addr_type.clone();

        if record.lat.is_some()
            && let (Some(site), Some(position)) = (site, self.position)
        {
            self.site_distance = Some(site.distance_to(&position));
        }

        // selected altitude: FMS beats MCP
        self.nav_altitude = record.nav_altitude_fms.or(record.nav_altitude_mcp);

        // geometric rate is smoothed and generally more reliable
        self.vert_rate = record
            .geom_rate
            .or(record.baro_rate)
            .or(record.vert_rate);

        self.name = self.display_name();
        self.update_rotation();
    }

    /// Callsign, else registration, else the upper-cased identifier
    pub fn display_name(&self) -> String {
        let non_empty = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        non_empty(&self.flight)
            .or_else(|| non_empty(&self.registration))
            .unwrap_or_else(|| self.icao.trim().to_uppercase())
    }

    fn update_rotation(&mut self) {
        if self.on_ground
            && let Some(true_heading) = self.true_heading
        {
            self.rotation = true_heading;
        } else if let Some(track) = self.track {
            self.rotation = track;
        } else if let Some(true_heading) = self.true_heading {
            self.rotation = true_heading;
        } else if let Some(mag_heading) = self.mag_heading {
            self.rotation = mag_heading;
        } else if let (Some(position), Some(prev)) = (self.position, self.prev.position)
            && position.lon != prev.lon
            && position.lat != prev.lat
            && position.distance_to(&prev) > MIN_BEARING_DISTANCE_M
        {
            self.rotation = prev.bearing_to(&position);
        }
    }

    /// Apply the result of the metadata lookup
    pub fn apply_metadata(&mut self, metadata: &AircraftMetadata) {
        if let Some(registration) = &metadata.registration {
            self.registration = Some(registration.clone());
        }
        if let Some(icao_type) = &metadata.icao_type {
            self.icao_type = Some(icao_type.clone());
        }
        if let Some(desc) = &metadata.description {
            self.type_description = Some(desc.clone());
        }
        if let Some(wtc) = &metadata.wtc {
            self.wtc = Some(wtc.clone());
        }
        self.name = self.display_name();
    }

    /// Whether the aircraft has timed out of the display
    pub fn is_expired(&self) -> bool {
        self.seen > MESSAGE_TIMEOUT_SECS
            || self.position.is_none()
            || self.seen_pos > POSITION_TIMEOUT_SECS
    }

    /// Per-tick visibility decision followed by the trail update
    ///
    /// An expired aircraft is hidden unless it is selected; a selected one
    /// stays on the map however old its data gets.
    pub fn update_tick(
        &mut self,
        now: f64,
        last_now: f64,
        init: bool,
        turn_density: f64,
    ) -> TickOutcome {
        self.seen = now - self.last_message_time;
        self.seen_pos = now - self.position_time;

        if self.is_expired() && !self.selected {
            if self.visible {
                trace!(icao = %self.icao, seen = self.seen, "hiding aircraft");
                self.visible = false;
                return TickOutcome::Hidden;
            }
            return TickOutcome::StillHidden;
        }

        self.visible = true;
        if init || self.update_track(now, last_now, turn_density) {
            TickOutcome::Moved
        } else {
            TickOutcome::Restyled
        }
    }
}
