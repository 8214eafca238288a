//! Aircraft metadata (registration, type) keyed by ICAO address
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Database record; keys follow the aircraft database JSON (`r`, `t`, `desc`, `wtc`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftMetadata {
    #[serde(rename = "r", default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    /// ICAO type designator, e.g. `A320`
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub icao_type: Option<String>,
    /// ICAO type description, e.g. `L2J`
    #[serde(rename = "desc", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Wake turbulence category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wtc: Option<String>,
}

/// Source of aircraft metadata
///
/// Lookups run off the tracking path; a slow or failing lookup only delays
/// registration and type information.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Returns:
    /// - `Ok(Some(record))` - the aircraft is known
    /// - `Ok(None)` - the aircraft is not in the database
    /// - `Err(e)` - the lookup itself failed
    async fn lookup(&self, icao: &str) -> Result<Option<AircraftMetadata>>;
}

/// Lookup that never knows anything
pub struct NoMetadata;

#[async_trait]
impl MetadataLookup for NoMetadata {
    async fn lookup(&self, _icao: &str) -> Result<Option<AircraftMetadata>> {
        Ok(None)
    }
}

/// In-memory database loaded from a JSON object `{ "<icao>": { "r": .., "t": .. } }`
pub struct JsonFileMetadata {
    records: HashMap<String, AircraftMetadata>,
}

impl JsonFileMetadata {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read aircraft database {:?}", path))?;
        let db = Self::from_json(&contents)
            .with_context(|| format!("Failed to parse aircraft database {:?}", path))?;
        info!("Loaded {} aircraft records from {:?}", db.len(), path);
        Ok(db)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, AircraftMetadata> = serde_json::from_str(json)?;
        let records = raw
            .into_iter()
            .map(|(icao, record)| (icao.trim().to_lowercase(), record))
            .collect();
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl MetadataLookup for JsonFileMetadata {
    async fn lookup(&self, icao: &str) -> Result<Option<AircraftMetadata>> {
        let record = self.records.get(&icao.to_lowercase()).cloned();
        if record.is_none() {
            debug!("No metadata for {}", icao);
        }
        Ok(record)
    }
}
