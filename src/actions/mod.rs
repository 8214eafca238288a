pub mod aircraft;
pub mod status;
pub mod views;

pub use aircraft::*;
pub use status::*;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Envelope for every successful API response
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    errors: String,
}

/// JSON error body with the given status
pub fn json_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            errors: message.to_string(),
        }),
    )
        .into_response()
}
