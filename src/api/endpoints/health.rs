//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub models_loaded: bool,
    pub uptime_secs: u64,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "ok",
        service: crate::config::APP_NAME,
        version: crate::config::APP_VERSION,
        models_loaded: ctx.core.predictor().models_ready(),
        uptime_secs: ctx.core.uptime_secs(),
    }))
}
