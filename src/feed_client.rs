//! Snapshot sources
//!
//! - Live: poll `aircraft.json` over HTTP or from the receiver's run directory
//! - Replay: read recorded snapshots from a JSON-lines file
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::feed::AircraftSnapshot;

/// Trait for sources of aircraft snapshots
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Get the next snapshot
    ///
    /// Returns:
    /// - `Ok(Some(snapshot))` - Next snapshot available
    /// - `Ok(None)` - End of stream (replays only)
    /// - `Err(e)` - Fetching or parsing failed; live sources may be retried
    async fn next_snapshot(&mut self) -> Result<Option<AircraftSnapshot>>;

    /// Whether snapshots should be paced by the poll interval
    fn is_live(&self) -> bool {
        true
    }
}

/// Build the live source described by the feed config
pub fn from_config(config: &FeedConfig) -> Result<Box<dyn FeedSource>> {
    if config.is_http() {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Box::new(HttpFeed::new(client, &config.source, config.uat)))
    } else {
        Ok(Box::new(FileFeed::new(&config.source, config.uat)))
    }
}

/// Polls `aircraft.json` from a web server
pub struct HttpFeed {
    client: Client,
    url: String,
    uat: bool,
}

impl HttpFeed {
    pub fn new(client: Client, url: &str, uat: bool) -> Self {
        Self {
            client,
            url: url.to_string(),
            uat,
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn next_snapshot(&mut self) -> Result<Option<AircraftSnapshot>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Feed {} returned {}", self.url, status));
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", self.url))?;

        let mut snapshot = AircraftSnapshot::from_json(&body)?;
        snapshot.uat = self.uat;
        Ok(Some(snapshot))
    }
}

/// Reads `aircraft.json` written by a local decoder (e.g. `/run/readsb`)
pub struct FileFeed {
    path: PathBuf,
    uat: bool,
}

impl FileFeed {
    pub fn new<P: AsRef<Path>>(path: P, uat: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            uat,
        }
    }
}

#[async_trait]
impl FeedSource for FileFeed {
    async fn next_snapshot(&mut self) -> Result<Option<AircraftSnapshot>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {:?}", self.path))?;
        let mut snapshot = AircraftSnapshot::from_json(&contents)?;
        snapshot.uat = self.uat;
        Ok(Some(snapshot))
    }
}

/// Recorded snapshots, one JSON document per line
///
/// Malformed lines are skipped with a warning so a truncated recording still
/// replays up to its end.
pub struct ReplayFeed {
    reader: BufReader<File>,
    line_buffer: String,
    snapshots_read: usize,
}

impl ReplayFeed {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .await
            .with_context(|| format!("Failed to open replay file {:?}", path.as_ref()))?;

        debug!("Opened replay source from: {:?}", path.as_ref());

        Ok(Self {
            reader: BufReader::new(file),
            line_buffer: String::new(),
            snapshots_read: 0,
        })
    }

    pub fn snapshots_read(&self) -> usize {
        self.snapshots_read
    }
}

#[async_trait]
impl FeedSource for ReplayFeed {
    async fn next_snapshot(&mut self) -> Result<Option<AircraftSnapshot>> {
        loop {
            self.line_buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.line_buffer).await?;
            if bytes_read == 0 {
                debug!(
                    "Reached end of replay file after {} snapshots",
                    self.snapshots_read
                );
                return Ok(None);
            }

            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }

            match AircraftSnapshot::from_json(line) {
                Ok(snapshot) => {
                    self.snapshots_read += 1;
                    return Ok(Some(snapshot));
                }
                Err(e) => warn!("Skipping unreadable replay line: {:#}", e),
            }
        }
    }

    fn is_live(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_replay_reads_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"now": 100.0, "aircraft": [{{"hex": "3c6dd4"}}]}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file, r#"{{"now": 101.0, "aircraft": []}}"#).unwrap();

        let mut feed = ReplayFeed::from_file(file.path()).await.unwrap();
        assert!(!feed.is_live());

        let first = feed.next_snapshot().await.unwrap().unwrap();
        assert_eq!(first.now, 100.0);
        assert_eq!(first.aircraft.len(), 1);

        let second = feed.next_snapshot().await.unwrap().unwrap();
        assert_eq!(second.now, 101.0);

        assert!(feed.next_snapshot().await.unwrap().is_none());
        assert_eq!(feed.snapshots_read(), 2);
    }

    #[tokio::test]
    async fn test_file_feed_rereads_and_flags_uat() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"now": 5.0, "aircraft": []}}"#).unwrap();

        let mut feed = FileFeed::new(file.path(), true);
        let snapshot = feed.next_snapshot().await.unwrap().unwrap();
        assert_eq!(snapshot.now, 5.0);
        assert!(snapshot.uat);
        assert!(feed.next_snapshot().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_feed_missing_file_is_error() {
        let mut feed = FileFeed::new("/nonexistent/aircraft.json", false);
        assert!(feed.next_snapshot().await.is_err());
    }

    #[test]
    fn test_from_config_picks_source() {
        let http = FeedConfig::default();
        assert!(from_config(&http).unwrap().is_live());

        let file = FeedConfig {
            source: "/run/readsb/aircraft.json".to_string(),
            ..Default::default()
        };
        assert!(from_config(&file).unwrap().is_live());
    }
}
