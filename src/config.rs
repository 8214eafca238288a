use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::geometry::LonLat;
use crate::marker_style::StyleConfig;
use crate::tracker::filter::FilterConfig;
use crate::tracker::segmentation::DEFAULT_TURN_DENSITY;

/// Where snapshots come from and how often
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// `http(s)://` URL of `aircraft.json`, or a local file path
    pub source: String,
    pub interval_ms: u64,
    pub timeout_secs: u64,
    /// The feed comes from a 978 MHz UAT receiver
    pub uat: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: "http://127.0.0.1/tar1090/data/aircraft.json".to_string(),
            interval_ms: 1000,
            timeout_secs: 5,
            uat: false,
        }
    }
}

impl FeedConfig {
    pub fn is_http(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }
}

/// Tunables of the tracker core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Higher values keep more points while turning
    pub turn_density: f64,
    /// Forget aircraft not heard from for this long (selected ones are kept)
    pub remove_after_secs: f64,
    /// Receiver location, used for per-aircraft distance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<LonLat>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            turn_density: DEFAULT_TURN_DENSITY,
            remove_after_secs: 300.0,
            site: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub bind: String,
    pub cors_origins: Vec<String>,
    /// Expose `/metrics`
    pub metrics: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            cors_origins: Vec::new(),
            metrics: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// JSON file mapping identifiers to registration/type records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

/// Top-level configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkytrailConfig {
    pub feed: FeedConfig,
    pub tracker: TrackerConfig,
    pub filter: FilterConfig,
    pub style: StyleConfig,
    pub web: WebConfig,
    pub metadata: MetadataConfig,
}

impl SkytrailConfig {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SkytrailConfig =
            toml::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Load the config file if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a TOML file (atomic: write to .tmp then rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        let tmp_path = path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, &contents)
            .with_context(|| format!("Failed to write {:?}", tmp_path))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to rename {:?} to {:?}", tmp_path, path))?;
        Ok(())
    }
}

/// Resolve the config file path.
///
/// Priority:
/// 1. `SKYTRAIL_CONFIG` env var
/// 2. `/etc/skytrail/skytrail.toml` (production/staging)
/// 3. `./skytrail.toml` (development)
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("SKYTRAIL_CONFIG") {
        return PathBuf::from(path);
    }

    match std::env::var("SKYTRAIL_ENV").as_deref() {
        Ok("production") | Ok("staging") => PathBuf::from("/etc/skytrail/skytrail.toml"),
        _ => PathBuf::from("./skytrail.toml"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::altitude::AltitudeUnits;
    use crate::tracker::filter::FilterMode;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: SkytrailConfig = toml::from_str("").unwrap();
        assert_eq!(config, SkytrailConfig::default());
        assert_eq!(config.tracker.turn_density, 6.5);
        assert_eq!(config.tracker.remove_after_secs, 300.0);
        assert!(config.feed.is_http());
    }

    #[test]
    fn test_partial_sections() {
        let toml_str = r#"
            [feed]
            source = "/run/readsb/aircraft.json"
            uat = true

            [tracker]
            turn_density = 3.0
            site = { lon = -0.46, lat = 51.47 }

            [filter]
            min_altitude = 0
            max_altitude = 3000
            altitude_units = "metres"
            ground_vehicles = "filtered"
        "#;

        let config: SkytrailConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.feed.is_http());
        assert!(config.feed.uat);
        assert_eq!(config.feed.interval_ms, 1000);
        assert_eq!(config.tracker.turn_density, 3.0);
        assert_eq!(config.tracker.remove_after_secs, 300.0);
        assert_eq!(config.tracker.site, Some(LonLat::new(-0.46, 51.47)));
        assert_eq!(config.filter.altitude_units, AltitudeUnits::Metres);
        assert_eq!(config.filter.ground_vehicles, FilterMode::Filtered);
        assert_eq!(config.filter.blocked_mlat, FilterMode::Shown);
    }

    #[test]
    fn test_config_load_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test-skytrail.toml");

        let mut config = SkytrailConfig::default();
        config.web.bind = "0.0.0.0:9000".to_string();
        config.tracker.site = Some(LonLat::new(8.55, 47.45));
        config.metadata.db_path = Some(PathBuf::from("/var/lib/skytrail/aircraft.json"));
        config.style.extended_labels = true;

        config.save(&path).unwrap();
        assert!(!path.with_extension("toml.tmp").exists());

        let loaded = SkytrailConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = SkytrailConfig::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, SkytrailConfig::default());
    }

    #[test]
    fn test_load_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[tracker\nturn_density = ").unwrap();
        assert!(SkytrailConfig::load(&path).is_err());
    }
}
