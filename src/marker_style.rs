//! Marker and trail styling
//!
//! Turns aircraft state into plain style data (CSS colours, icon key,
//! rotation, label) for whatever draws the map. Colours follow altitude:
//! hue is interpolated over altitude stops, lightness over hue stops so
//! every band reads with similar contrast.
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::tracker::{Aircraft, Altitude, DataSource, Segment};

/// Marker drawn with a stale position gets the `stale` offset after this long
const STALE_POSITION_SECS: f64 = 15.0;

/// Extra lightness for aircraft on the ground
const GROUND_LIGHTNESS_BOOST: f64 = 15.0;

/// Saturation and lightness are kept inside this range
const MIN_SL: f64 = 5.0;
const MAX_SL: f64 = 95.0;

/// Trail colour of estimated segments
pub const ESTIMATED_TRAIL_COLOR: &str = "#808080";

/// Ground vehicles without speed (or slower than this) get a name-only label
const LABEL_SLOW_GROUND_KT: f64 = 15.0;

const NBSP: char = '\u{a0}';

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub const fn new(h: f64, s: f64, l: f64) -> Self {
        Self { h, s, l }
    }

    /// Wrap hue into [0, 360) and clamp saturation/lightness into [5, 95]
    pub fn normalized(self) -> Self {
        Self {
            h: self.h.rem_euclid(360.0),
            s: self.s.clamp(MIN_SL, MAX_SL),
            l: self.l.clamp(MIN_SL, MAX_SL),
        }
    }

    fn offset(self, by: &HslOffset) -> Self {
        Self::new(self.h + by.h, self.s + by.s, self.l + by.l)
    }

    pub fn to_css(&self) -> String {
        format!("hsl({:.0},{:.0}%,{:.0}%)", self.h, self.s, self.l)
    }
}

/// Adjustment added on top of the altitude colour
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HslOffset {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HueStop {
    pub alt: f64,
    pub val: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightnessStop {
    pub h: f64,
    pub val: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorPalette {
    pub unknown: Hsl,
    pub ground: Hsl,
    pub air_saturation: f64,
    /// Hue by altitude in feet, ascending
    pub air_hue: Vec<HueStop>,
    /// Lightness by hue, ascending
    pub air_lightness: Vec<LightnessStop>,
    pub selected: HslOffset,
    pub stale: HslOffset,
    pub mlat: HslOffset,
}

impl Default for ColorPalette {
    fn default() -> Self {
        let hue = |alt, val| HueStop { alt, val };
        let light = |h, val| LightnessStop { h, val };
        Self {
            unknown: Hsl::new(0.0, 0.0, 20.0),
            ground: Hsl::new(220.0, 0.0, 30.0),
            air_saturation: 88.0,
            air_hue: vec![
                hue(0.0, 20.0),
                hue(2000.0, 32.5),
                hue(4000.0, 43.0),
                hue(6000.0, 54.0),
                hue(8000.0, 72.0),
                hue(9000.0, 85.0),
                hue(11000.0, 140.0),
                hue(40000.0, 300.0),
            ],
            air_lightness: vec![
                light(0.0, 53.0),
                light(20.0, 50.0),
                light(32.0, 54.0),
                light(40.0, 52.0),
                light(46.0, 51.0),
                light(50.0, 46.0),
                light(60.0, 43.0),
                light(80.0, 41.0),
                light(100.0, 41.0),
                light(120.0, 41.0),
                light(140.0, 41.0),
                light(160.0, 40.0),
                light(180.0, 40.0),
                light(190.0, 44.0),
                light(198.0, 50.0),
                light(200.0, 58.0),
                light(220.0, 58.0),
                light(240.0, 58.0),
                light(255.0, 55.0),
                light(266.0, 55.0),
                light(270.0, 58.0),
                light(280.0, 58.0),
                light(290.0, 47.0),
                light(300.0, 43.0),
                light(310.0, 48.0),
                light(320.0, 48.0),
                light(340.0, 52.0),
                light(360.0, 53.0),
            ],
            selected: HslOffset {
                h: 0.0,
                s: -10.0,
                l: 5.0,
            },
            stale: HslOffset {
                h: 0.0,
                s: -35.0,
                l: 9.0,
            },
            mlat: HslOffset::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub palette: ColorPalette,
    /// Two-line labels with speed and altitude
    pub extended_labels: bool,
}

/// Squawk codes that override the altitude colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialSquawk {
    pub code: &'static str,
    pub text: &'static str,
    pub marker_color: &'static str,
}

const SPECIAL_SQUAWKS: [SpecialSquawk; 3] = [
    SpecialSquawk {
        code: "7500",
        text: "Aircraft Hijacking",
        marker_color: "rgb(255, 85, 85)",
    },
    SpecialSquawk {
        code: "7600",
        text: "Radio Failure",
        marker_color: "rgb(0, 255, 255)",
    },
    SpecialSquawk {
        code: "7700",
        text: "General Emergency",
        marker_color: "rgb(255, 255, 0)",
    },
];

pub fn special_squawk(squawk: &str) -> Option<&'static SpecialSquawk> {
    SPECIAL_SQUAWKS.iter().find(|s| s.code == squawk)
}

/// Base colour for an altitude bucket
pub fn altitude_color(altitude: Option<Altitude>, palette: &ColorPalette) -> Hsl {
    let color = match altitude {
        None => palette.unknown,
        Some(Altitude::Ground) => palette.ground,
        Some(Altitude::Feet(ft)) => {
            let h = interpolate(&palette.air_hue, ft, |s| (s.alt, s.val));
            let l = interpolate(&palette.air_lightness, h, |s| (s.h, s.val));
            Hsl::new(h, palette.air_saturation, l)
        }
    };
    color.normalized()
}

/// Piecewise-linear lookup: below the first stop takes its value, above the
/// last stop takes the last value
fn interpolate<T>(stops: &[T], x: f64, point: impl Fn(&T) -> (f64, f64)) -> f64 {
    let Some(first) = stops.first() else {
        return 0.0;
    };
    let fallback = point(first).1;

    for (i, stop) in stops.iter().enumerate().rev() {
        let (at, val) = point(stop);
        if x > at {
            return match stops.get(i + 1) {
                None => val,
                Some(next) => {
                    let (next_at, next_val) = point(next);
                    val + (next_val - val) * (x - at) / (next_at - at)
                }
            };
        }
    }
    fallback
}

/// CSS colour of the aircraft's marker
pub fn marker_color(aircraft: &Aircraft, palette: &ColorPalette) -> String {
    if let Some(special) = aircraft.squawk.as_deref().and_then(special_squawk) {
        return special.marker_color.to_string();
    }

    let mut color = altitude_color(aircraft.alt_rounded, palette);

    if aircraft.seen_pos > STALE_POSITION_SECS {
        color = color.offset(&palette.stale);
    }
    if aircraft.alt_rounded == Some(Altitude::Ground) {
        color.l += GROUND_LIGHTNESS_BOOST;
    }
    if aircraft.selected {
        color = color.offset(&palette.selected);
    }
    if aircraft.data_source == Some(DataSource::Mlat) {
        color = color.offset(&palette.mlat);
    }

    color.normalized().to_css()
}

/// Key selecting the icon shape: category, type description, wake category, type
pub fn shape_key(aircraft: &Aircraft) -> String {
    let part = |s: &Option<String>| s.clone().unwrap_or_else(|| "null".to_string());
    format!(
        "{}_{}_{}_{}",
        aircraft.category.as_deref().unwrap_or("A0"),
        part(&aircraft.type_description),
        part(&aircraft.wtc),
        part(&aircraft.icao_type)
    )
}

pub fn label(aircraft: &Aircraft, extended: bool) -> String {
    let slow = aircraft.speed.is_none_or(|s| s < LABEL_SLOW_GROUND_KT);
    if !extended || (aircraft.on_ground && slow) {
        return format!(" {} ", aircraft.name);
    }

    let speed = format!("{:.0}", aircraft.speed.unwrap_or(0.0));
    let altitude = aircraft
        .altitude
        .map(|a| a.to_string())
        .unwrap_or_default();
    format!(
        "{}  {} \n {} ",
        pad_start(&speed, 4),
        pad_start(&altitude, 5),
        aircraft.name
    )
}

fn pad_start(s: &str, width: usize) -> String {
    let len = s.chars().count();
    let mut out: String = std::iter::repeat_n(NBSP, width.saturating_sub(len)).collect();
    out.push_str(s);
    out
}

/// CSS colour of a trail segment
pub fn trail_color(segment: &Segment, palette: &ColorPalette) -> String {
    if segment.estimated {
        ESTIMATED_TRAIL_COLOR.to_string()
    } else {
        altitude_color(segment.altitude, palette).to_css()
    }
}

/// Everything a renderer needs to draw one marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../web/src/lib/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    pub color: String,
    pub shape_key: String,
    pub rotation: f64,
    pub label: String,
    pub z_index: i32,
    /// MLAT markers use the MLAT outline colour, selected or not
    pub mlat_outline: bool,
}

pub fn marker_style(aircraft: &Aircraft, config: &StyleConfig) -> MarkerStyle {
    MarkerStyle {
        color: marker_color(aircraft, &config.palette),
        shape_key: shape_key(aircraft),
        rotation: aircraft.rotation,
        label: label(aircraft, config.extended_labels),
        z_index: aircraft.z_index,
        mlat_outline: aircraft.data_source == Some(DataSource::Mlat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aircraft() -> Aircraft {
        let mut ac = Aircraft::new("3c6dd4", 1);
        ac.name = "DLH4AB".to_string();
        ac
    }

    #[test]
    fn test_normalize() {
        let c = Hsl::new(-30.0, 3.0, 97.0).normalized();
        assert_eq!(c, Hsl::new(330.0, 5.0, 95.0));

        let c = Hsl::new(370.0, 50.0, 50.0).normalized();
        assert_eq!(c.h, 10.0);
        assert_eq!(Hsl::new(360.0, 50.0, 50.0).normalized().h, 0.0);
    }

    #[test]
    fn test_altitude_color_fixed_classes() {
        let palette = ColorPalette::default();
        assert_eq!(altitude_color(None, &palette), Hsl::new(0.0, 5.0, 20.0));
        assert_eq!(
            altitude_color(Some(Altitude::Ground), &palette),
            Hsl::new(220.0, 5.0, 30.0)
        );
    }

    #[test]
    fn test_altitude_color_interpolates_hue() {
        let palette = ColorPalette::default();

        // below the first stop
        assert_eq!(altitude_color(Some(Altitude::Feet(0.0)), &palette).h, 20.0);
        // between 2000 (32.5) and 4000 (43)
        let c = altitude_color(Some(Altitude::Feet(3000.0)), &palette);
        assert!((c.h - 37.75).abs() < 1e-9);
        assert_eq!(c.s, 88.0);
        // above the last stop
        assert_eq!(altitude_color(Some(Altitude::Feet(45000.0)), &palette).h, 300.0);
    }

    #[test]
    fn test_lightness_follows_hue() {
        let palette = ColorPalette::default();
        // 40000 ft is hue 300, lightness 43
        let c = altitude_color(Some(Altitude::Feet(40000.0)), &palette);
        assert_eq!(c.h, 300.0);
        assert_eq!(c.l, 43.0);
    }

    #[test]
    fn test_special_squawk_overrides() {
        let palette = ColorPalette::default();
        let mut ac = aircraft();
        ac.alt_rounded = Some(Altitude::Feet(5000.0));
        ac.squawk = Some("7700".to_string());
        assert_eq!(marker_color(&ac, &palette), "rgb(255, 255, 0)");

        ac.squawk = Some("7500".to_string());
        assert_eq!(marker_color(&ac, &palette), "rgb(255, 85, 85)");

        ac.squawk = Some("1200".to_string());
        assert!(marker_color(&ac, &palette).starts_with("hsl("));
        assert_eq!(special_squawk("7600").unwrap().text, "Radio Failure");
    }

    #[test]
    fn test_marker_color_offsets() {
        let palette = ColorPalette::default();
        let mut ac = aircraft();
        ac.alt_rounded = Some(Altitude::Ground);
        // ground: 220/0/30, clamped saturation, +15 lightness
        assert_eq!(marker_color(&ac, &palette), "hsl(220,5%,45%)");

        ac.selected = true;
        assert_eq!(marker_color(&ac, &palette), "hsl(220,5%,50%)");

        ac.seen_pos = 20.0;
        assert_eq!(marker_color(&ac, &palette), "hsl(220,5%,59%)");
    }

    #[test]
    fn test_mlat_outline_ignores_selection() {
        let style = StyleConfig::default();
        let mut ac = aircraft();
        assert!(!marker_style(&ac, &style).mlat_outline);

        ac.data_source = Some(DataSource::Mlat);
        assert!(marker_style(&ac, &style).mlat_outline);
        ac.selected = true;
        assert!(marker_style(&ac, &style).mlat_outline);

        ac.data_source = Some(DataSource::Adsb);
        assert!(!marker_style(&ac, &style).mlat_outline);
    }

    #[test]
    fn test_shape_key() {
        let mut ac = aircraft();
        assert_eq!(shape_key(&ac), "A0_null_null_null");

        ac.category = Some("A3".to_string());
        ac.type_description = Some("L2J".to_string());
        ac.wtc = Some("M".to_string());
        ac.icao_type = Some("A320".to_string());
        assert_eq!(shape_key(&ac), "A3_L2J_M_A320");
    }

    #[test]
    fn test_labels() {
        let mut ac = aircraft();
        assert_eq!(label(&ac, false), " DLH4AB ");

        ac.speed = Some(251.4);
        ac.altitude = Some(Altitude::Feet(9000.0));
        assert_eq!(
            label(&ac, true),
            "\u{a0}251  \u{a0}9000 \n DLH4AB "
        );

        ac.on_ground = true;
        ac.speed = Some(3.0);
        assert_eq!(label(&ac, true), " DLH4AB ");
    }

    #[test]
    fn test_trail_color() {
        let palette = ColorPalette::default();
        let mut history = crate::tracker::TrackHistory::new();
        history.begin(
            crate::geometry::MapPoint { x: 0.0, y: 0.0 },
            crate::tracker::track_history::SegmentState::estimated(false),
        );
        let segment = &history.segments()[0];
        assert_eq!(trail_color(segment, &palette), ESTIMATED_TRAIL_COLOR);
    }

    #[test]
    fn test_palette_from_toml() {
        let style: StyleConfig = toml::from_str(
            r#"
            extended_labels = true
            [palette]
            air_saturation = 70
            "#,
        )
        .unwrap();
        assert!(style.extended_labels);
        assert_eq!(style.palette.air_saturation, 70.0);
        assert_eq!(style.palette.air_hue.len(), 8);
    }
}
