//! Trail segmentation
//!
//! Decides, once per tick, whether the previous position is committed to the
//! trail and whether the trail has to be split: at a gap in the data
//! (estimated segment), on recovery from one, or when the altitude bucket
//! changes. Between splits, points are thinned by elapsed time and turn rate.
use tracing::debug;

use crate::geometry::{MapPoint, angular_difference};

use super::aircraft_state::Aircraft;
use super::data_source::DataSource;
use super::track_history::SegmentState;

/// Positions closer than this to the previous one are treated as duplicates
const MIN_MOVE_M: f64 = 8.0;

const STALE_AIR_SECS: f64 = 8.0;
const STALE_MLAT_SECS: f64 = 15.0;
const STALE_GROUND_SECS: f64 = 30.0;

/// Always commit a point after this long
const RETAIN_MAX_SECS: f64 = 42.0;
/// Airborne with unknown turn rate: commit after this long
const RETAIN_UNKNOWN_TURN_SECS: f64 = 8.0;
/// Ground: minimum distance for the turn-based rule
const RETAIN_GROUND_TURN_MIN_M: f64 = 8.0;
/// Ground: commit when moved this far and `RETAIN_GROUND_MOVE_SECS` passed
const RETAIN_GROUND_MOVE_M: f64 = 40.0;
const RETAIN_GROUND_MOVE_SECS: f64 = 4.0;

pub const DEFAULT_TURN_DENSITY: f64 = 6.5;

impl Aircraft {
    /// Feed the current position to the trail
    ///
    /// Returns true when the trail changed and has to be redrawn.
    pub fn update_track(&mut self, now: f64, last_now: f64, turn_density: f64) -> bool {
        let Some(position) = self.position else {
            return false;
        };
        if self.prev.position == Some(position) {
            return false;
        }

        let on_ground = self.on_ground;

        let Some(prev_position) = self.prev.position.filter(|_| !self.history.is_empty()) else {
            self.history.begin(
                position.project(),
                SegmentState {
                    estimated: false,
                    ground: on_ground,
                    altitude: self.alt_rounded,
                    alt_real: self.altitude,
                    speed: self.speed,
                },
            );
            self.history_size += 1;
            self.prev.position = Some(position);
            self.update_tail();
            return true;
        };

        // drop the current position but keep the previous one from going stale
        if position.distance_to(&prev_position) < MIN_MOVE_M {
            self.prev.time = self.position_time;
            return false;
        }

        let is_mlat = self.data_source == Some(DataSource::Mlat);
        if is_mlat && on_ground {
            return true;
        }

        let proj_prev = prev_position.project();

        // the gap between positions should not be much larger than the gap
        // between snapshots
        let time_difference = (self.position_time - self.prev.time) - (now - last_now);
        let stale_timeout = if on_ground {
            STALE_GROUND_SECS
        } else if is_mlat {
            STALE_MLAT_SECS
        } else {
            STALE_AIR_SECS
        };
        let estimated = time_difference > stale_timeout
            || (now - self.position_time) > stale_timeout;

        let Some(last_estimated) = self.history.current().map(|s| s.estimated) else {
            return false;
        };
        let last_altitude = self.history.current().and_then(|s| s.altitude);

        if estimated {
            if last_estimated {
                self.history.extend(proj_prev);
                self.history_size += 1;
            } else {
                self.log_selected(format_args!(
                    "switching to estimated, time_difference: {time_difference:.1}"
                ));
                self.history
                    .split(proj_prev, SegmentState::estimated(on_ground));
                self.history_size += 2;
            }
            self.update_tail();
            return true;
        }

        if last_estimated {
            // two points close in time again: back to a solid line
            self.split_at_prev(proj_prev, on_ground);
            self.update_tail();
            return true;
        }

        let since_update = self.prev.time - self.tail.time.unwrap_or(0.0);

        if self.prev.alt_rounded != last_altitude {
            self.log_selected(format_args!(
                "sec_elapsed: {since_update:.1} altitude: {:?} -> {:?}",
                last_altitude, self.prev.alt_rounded
            ));
            self.split_at_prev(proj_prev, on_ground);
            self.update_tail();
            return true;
        }

        let track_change = self.track_change();
        let distance_traveled = match self.tail.position {
            Some(tail) => tail.distance_to(&prev_position),
            None => 0.0,
        };

        let retain = since_update > RETAIN_MAX_SECS
            || match (on_ground, track_change) {
                (false, Some(change)) => since_update > (100.0 / turn_density) / change,
                (false, None) => since_update > RETAIN_UNKNOWN_TURN_SECS,
                (true, change) => {
                    change.is_some_and(|change| {
                        since_update > (500.0 / turn_density) / change
                            && distance_traveled > RETAIN_GROUND_TURN_MIN_M
                    }) || (distance_traveled > RETAIN_GROUND_MOVE_M
                        && since_update > RETAIN_GROUND_MOVE_SECS)
                }
            };

        if retain {
            self.history.extend(proj_prev);
            self.history_size += 1;
            self.log_selected(format_args!(
                "sec_elapsed: {since_update:.1} {} dist: {distance_traveled:.0} track_change: {:?}",
                if on_ground { "ground" } else { "air" },
                track_change
            ));
            self.update_tail();
            return true;
        }

        self.update_track_prev();
        false
    }

    /// Circular difference between the current track and the track at the
    /// tail; unknown when either is missing
    pub fn track_change(&self) -> Option<f64> {
        match (self.track, self.tail.track) {
            (Some(track), Some(tail)) => Some(angular_difference(track, tail)),
            _ => None,
        }
    }

    fn split_at_prev(&mut self, at: MapPoint, on_ground: bool) {
        self.history.split(
            at,
            SegmentState {
                estimated: false,
                ground: on_ground,
                altitude: self.prev.alt_rounded,
                alt_real: self.prev.altitude,
                speed: self.prev.speed,
            },
        );
        self.history_size += 2;
    }

    /// Record the point just committed as the new tail, then advance `prev`
    pub(crate) fn update_tail(&mut self) {
        self.tail.time = Some(self.prev.time);
        self.tail.track = self.prev.track;
        self.tail.true_heading = self.prev.true_heading;
        self.tail.position = self.prev.position;
        self.update_track_prev();
    }

    /// Snapshot the current kinematic state into `prev`
    pub(crate) fn update_track_prev(&mut self) {
        self.prev.position = self.position;
        self.prev.time = self.position_time;
        self.prev.track = self.track;
        self.prev.true_heading = self.true_heading;
        self.prev.altitude = self.altitude;
        self.prev.alt_rounded = self.alt_rounded;
        self.prev.speed = self.speed;
    }

    fn log_selected(&self, args: std::fmt::Arguments<'_>) {
        if self.selected {
            debug!(icao = %self.icao, "{}", args);
        }
    }
}
