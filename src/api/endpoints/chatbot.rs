//! `POST /api/chatbot`: keyword assistant over recent records.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::chatbot::{self, ChatContext};

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub timestamp: String,
}

/// `POST /api/chatbot`
pub async fn send(
    State(ctx): State<ApiContext>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".into()));
    }

    let context = ctx
        .core
        .open_db()
        .map_err(ApiError::from)
        .and_then(|conn| ChatContext::load(&conn).map_err(ApiError::from));

    let response = match context {
        Ok(context) => chatbot::respond(&request.message, &context),
        Err(e) => {
            tracing::warn!(error = %e, "Chatbot context unavailable");
            chatbot::APOLOGY.to_string()
        }
    };

    Ok(Json(ChatResponse {
        success: true,
        response,
        timestamp: Utc::now().to_rfc3339(),
    }))
}
