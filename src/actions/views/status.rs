use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Tracker and server state for `GET /api/status`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../web/src/lib/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub version: String,
    /// Aircraft currently tracked, shown or not
    pub tracked: usize,
    /// Aircraft with a marker on the map
    pub visible: usize,
    pub selected: Option<String>,
    /// Receiver clock of the last processed snapshot
    pub receiver_time: Option<DateTime<Utc>>,
    /// Total messages decoded by the receiver
    pub messages: Option<u64>,
    pub uptime_seconds: u64,
    pub uptime_human: String,
}
