use anyhow::{Context, Result};
use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::actions;
use crate::config::WebConfig;
use crate::marker_style::StyleConfig;
use crate::metrics::metrics_handler;
use crate::service::SharedTracker;
use crate::tracker::filter::FilterConfig;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub tracker: SharedTracker,
    pub filter: Arc<FilterConfig>,
    pub style: Arc<StyleConfig>,
    /// `None` when `/metrics` is disabled
    pub metrics: Option<PrometheusHandle>,
}

// Middleware for request logging with timing
async fn request_logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start_time = Instant::now();

    let response = next.run(request).await;
    let duration = start_time.elapsed();
    let status = response.status();

    if status.is_server_error() {
        warn!(
            "{} {} {} in {:.2}ms",
            method,
            path,
            status.as_u16(),
            duration.as_secs_f64() * 1000.0
        );
    } else {
        debug!(
            "{} {} {} in {:.2}ms",
            method,
            path,
            status.as_u16(),
            duration.as_secs_f64() * 1000.0
        );
    }

    response
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Build the application router
pub fn router(state: AppState, config: &WebConfig) -> Router {
    let api_router = Router::new()
        .route("/aircraft", get(actions::list_aircraft))
        .route("/aircraft/{icao}", get(actions::get_aircraft))
        .route("/selection", axum::routing::put(actions::put_selection))
        .route("/status", get(actions::get_status));

    let mut app = Router::new().nest("/api", api_router);
    if config.metrics {
        app = app.route("/metrics", get(metrics_handler));
    }

    app.with_state(state)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
}

pub async fn start_web_server(
    config: WebConfig,
    state: AppState,
    cancel: CancellationToken,
) -> Result<()> {
    info!("Starting web server on {}", config.bind);
    actions::init_server_start_time();

    let app = router(state, &config);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Web server listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("Web server failed")?;

    info!("Web server stopped");
    Ok(())
}
