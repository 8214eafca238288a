//! Trail geometry owned by each aircraft
//!
//! A trail is an ordered list of segments. Only the last segment grows; when
//! a new one is opened the previous one receives the shared boundary point
//! and is never touched again. Coordinates are projected map points, a cache
//! derived from the authoritative lon/lat positions.
use crate::geometry::MapPoint;

use super::altitude::Altitude;

/// A contiguous run of trail points sharing estimated/ground/altitude state
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    points: Vec<MapPoint>,
    /// Drawn dashed/grey: built from stale positions
    pub estimated: bool,
    pub ground: bool,
    /// Altitude bucket the segment was opened with; `None` for estimated runs
    pub altitude: Option<Altitude>,
    /// Unrounded altitude at the segment start (for trail labels)
    pub alt_real: Option<Altitude>,
    /// Ground speed at the segment start
    pub speed: Option<f64>,
}

/// State a new segment is opened with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentState {
    pub estimated: bool,
    pub ground: bool,
    pub altitude: Option<Altitude>,
    pub alt_real: Option<Altitude>,
    pub speed: Option<f64>,
}

impl SegmentState {
    pub fn estimated(ground: bool) -> Self {
        Self {
            estimated: true,
            ground,
            altitude: None,
            alt_real: None,
            speed: None,
        }
    }
}

impl Segment {
    fn open(start: MapPoint, state: SegmentState) -> Self {
        Self {
            points: vec![start],
            estimated: state.estimated,
            ground: state.ground,
            altitude: state.altitude,
            alt_real: state.alt_real,
            speed: state.speed,
        }
    }

    pub fn points(&self) -> &[MapPoint] {
        &self.points
    }

    pub fn first_point(&self) -> Option<&MapPoint> {
        self.points.first()
    }

    pub fn last_point(&self) -> Option<&MapPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Ordered trail segments for one aircraft
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackHistory {
    segments: Vec<Segment>,
    /// Bumped on every mutation so renderers can rebuild lazily
    revision: u64,
}

impl TrackHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The open segment, the only one that may still grow
    pub fn current(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Total number of stored points across all segments
    pub fn point_count(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    /// Open the very first segment. Ignored once a trail exists.
    pub(crate) fn begin(&mut self, start: MapPoint, state: SegmentState) {
        if !self.segments.is_empty() {
            return;
        }
        self.segments.push(Segment::open(start, state));
        self.revision += 1;
    }

    /// Append a point to the open segment
    pub(crate) fn extend(&mut self, point: MapPoint) {
        if let Some(current) = self.segments.last_mut() {
            current.points.push(point);
            self.revision += 1;
        }
    }

    /// Close the open segment at `at` and open a new one starting there
    pub(crate) fn split(&mut self, at: MapPoint, state: SegmentState) {
        if let Some(current) = self.segments.last_mut() {
            current.points.push(at);
        }
        self.segments.push(Segment::open(at, state));
        self.revision += 1;
    }
}
