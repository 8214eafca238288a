//! Status endpoint: tracker counts, receiver clock and uptime
use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use std::sync::OnceLock;
use std::time::Instant;

use crate::actions::DataResponse;
use crate::actions::views::StatusView;
use crate::web::AppState;

/// Server start time - initialized on first status request
static SERVER_START_TIME: OnceLock<Instant> = OnceLock::new();

/// Initialize the server start time (call this when the server starts)
pub fn init_server_start_time() {
    SERVER_START_TIME.get_or_init(Instant::now);
}

/// Format seconds into a human-readable duration string
fn format_duration(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, secs)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Handler for GET /api/status
#[tracing::instrument(skip(state))]
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let start_time = SERVER_START_TIME.get_or_init(Instant::now);
    let uptime_seconds = start_time.elapsed().as_secs();

    let tracker = state.tracker.lock().await;
    let status = StatusView {
        version: env!("CARGO_PKG_VERSION").to_string(),
        tracked: tracker.len(),
        visible: tracker
            .iter()
            .filter(|a| a.visible && a.position.is_some() && !state.filter.is_filtered(a))
            .count(),
        selected: tracker.selected().map(|a| a.icao.clone()),
        receiver_time: tracker.last_now().and_then(|now| {
            chrono::DateTime::from_timestamp(now.trunc() as i64, (now.fract() * 1e9) as u32)
        }),
        messages: tracker.messages(),
        uptime_seconds,
        uptime_human: format_duration(uptime_seconds),
    };

    Json(DataResponse { data: status })
}
