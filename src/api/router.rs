//! HTTP router.
//!
//! Returns a composable `Router` with every endpoint nested under `/api/`
//! and a CORS layer for the configured browser origins.

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router.
///
/// Origins that are not valid header values are skipped with a warning.
pub fn api_router(core: Arc<CoreState>, cors_origins: &[String]) -> Router {
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/analyze", post(endpoints::analyze::analyze))
        .route("/chatbot", post(endpoints::chatbot::send))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:patient_id",
            get(endpoints::patients::detail)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::remove),
        )
        .route("/patient-data", get(endpoints::patients::dashboard))
        .route(
            "/lab-tests",
            get(endpoints::lab_tests::list).post(endpoints::lab_tests::create),
        )
        .route("/lab-tests/:id", delete(endpoints::lab_tests::remove))
        .route("/patient-analyses", get(endpoints::analyses::list))
        .route(
            "/patient-analyses/:analysis_id",
            put(endpoints::analyses::update).delete(endpoints::analyses::remove),
        )
        .with_state(ctx);

    Router::new().nest("/api", api).layer(cors_layer(cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}
