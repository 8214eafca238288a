use serde::{Deserialize, Serialize};

/// Altitudes above this are bucketed to the nearest 1000 ft, below it to 500 ft
const COARSE_BUCKET_ABOVE_FT: f64 = 10_000.0;

/// Feet per metre, used when filter bounds are given in metres
const FEET_PER_METRE: f64 = 3.2808;

/// Reported altitude: either a value in feet or the on-ground sentinel
///
/// The feed encodes this as a JSON number or the string `"ground"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AltitudeRepr", into = "AltitudeRepr")]
pub enum Altitude {
    Ground,
    Feet(f64),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AltitudeRepr {
    Feet(f64),
    Text(String),
}

impl TryFrom<AltitudeRepr> for Altitude {
    type Error = String;

    fn try_from(repr: AltitudeRepr) -> Result<Self, Self::Error> {
        match repr {
            AltitudeRepr::Feet(ft) => Ok(Altitude::Feet(ft)),
            AltitudeRepr::Text(s) if s == "ground" => Ok(Altitude::Ground),
            AltitudeRepr::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Altitude::Feet)
                .map_err(|_| format!("invalid altitude: {s:?}")),
        }
    }
}

impl From<Altitude> for AltitudeRepr {
    fn from(alt: Altitude) -> Self {
        match alt {
            Altitude::Ground => AltitudeRepr::Text("ground".to_string()),
            Altitude::Feet(ft) => AltitudeRepr::Feet(ft),
        }
    }
}

impl Altitude {
    pub fn is_ground(&self) -> bool {
        matches!(self, Altitude::Ground)
    }

    /// Altitude in feet, with ground counted as zero
    pub fn feet_or_zero(&self) -> f64 {
        match self {
            Altitude::Ground => 0.0,
            Altitude::Feet(ft) => *ft,
        }
    }

    /// Round into the coarse bands used for colouring and segment comparison
    ///
    /// Above 10000 ft the band is 1000 ft wide, below it 500 ft. Exact
    /// half-way values go to the even multiple, so 10500 ft lands on 10000.
    pub fn rounded(&self) -> Altitude {
        match self {
            Altitude::Ground => Altitude::Ground,
            Altitude::Feet(ft) if *ft > COARSE_BUCKET_ABOVE_FT => {
                Altitude::Feet((ft / 1000.0).round_ties_even() * 1000.0)
            }
            Altitude::Feet(ft) => Altitude::Feet((ft / 500.0).round_ties_even() * 500.0),
        }
    }
}

impl std::fmt::Display for Altitude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Altitude::Ground => write!(f, "ground"),
            Altitude::Feet(ft) => write!(f, "{:.0}", ft),
        }
    }
}

/// Bucket an optional altitude; unknown stays unknown
pub fn round_altitude(altitude: Option<Altitude>) -> Option<Altitude> {
    altitude.map(|a| a.rounded())
}

/// Units the altitude filter bounds are expressed in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AltitudeUnits {
    #[default]
    Feet,
    Metres,
}

/// Convert an altitude in feet into the given display units
pub fn convert_altitude(feet: f64, units: AltitudeUnits) -> f64 {
    match units {
        AltitudeUnits::Feet => feet,
        AltitudeUnits::Metres => feet / FEET_PER_METRE,
    }
}
