use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::actions::views::{AircraftDetailView, AircraftMarkerView, SelectionRequest};
use crate::actions::{DataResponse, json_error};
use crate::web::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AircraftListParams {
    /// Also return aircraft hidden by the display filter
    #[serde(default)]
    pub include_filtered: bool,
}

/// Handler for GET /api/aircraft
///
/// Markers of all visible aircraft, in drawing order (lowest first)
#[instrument(skip(state))]
pub async fn list_aircraft(
    State(state): State<AppState>,
    Query(params): Query<AircraftListParams>,
) -> impl IntoResponse {
    let tracker = state.tracker.lock().await;

    let mut markers: Vec<AircraftMarkerView> = tracker
        .iter()
        .filter(|a| a.visible)
        .filter(|a| params.include_filtered || !state.filter.is_filtered(a))
        .filter_map(|a| AircraftMarkerView::from_aircraft(a, &state.style))
        .collect();
    drop(tracker);

    markers.sort_by(|a, b| {
        a.style
            .z_index
            .cmp(&b.style.z_index)
            .then_with(|| a.icao.cmp(&b.icao))
    });

    Json(DataResponse { data: markers })
}

/// Handler for GET /api/aircraft/{icao}
#[instrument(skip(state))]
pub async fn get_aircraft(
    State(state): State<AppState>,
    Path(icao): Path<String>,
) -> impl IntoResponse {
    let tracker = state.tracker.lock().await;
    match tracker.get(&icao.to_lowercase()) {
        Some(aircraft) => Json(DataResponse {
            data: AircraftDetailView::from_aircraft(aircraft, &state.style),
        })
        .into_response(),
        None => json_error(StatusCode::NOT_FOUND, "Aircraft not found"),
    }
}

/// Handler for PUT /api/selection
///
/// Selects the given aircraft (or clears the selection) and returns the
/// selected aircraft's detail
#[instrument(skip(state))]
pub async fn put_selection(
    State(state): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> impl IntoResponse {
    let icao = request.icao.map(|i| i.trim().to_lowercase());
    let mut tracker = state.tracker.lock().await;

    if !tracker.select(icao.as_deref()) {
        return json_error(StatusCode::NOT_FOUND, "Aircraft not found");
    }
    if icao.is_none() {
        info!("Selection cleared");
    }

    let detail = tracker
        .selected()
        .map(|a| AircraftDetailView::from_aircraft(a, &state.style));
    Json(DataResponse { data: detail }).into_response()
}
