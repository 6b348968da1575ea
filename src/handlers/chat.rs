use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

use super::handle_customer_message;

#[derive(Deserialize)]
pub struct ChatMessage {
    pub phone: String,
    pub message: String,
}

/// Manual test endpoint: the same pipeline as the webhook, minus the Z-API
/// envelope, with the reply echoed in the response body.
pub async fn chat_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatMessage>,
) -> Result<Json<Value>, AppError> {
    let phone = payload.phone.trim().to_string();
    let message = payload.message.trim().to_string();

    if phone.is_empty() || message.is_empty() {
        return Ok(Json(json!({ "status": "empty_message" })));
    }

    match state.gateway.is_muted(&phone).await {
        Ok(true) => {
            return Ok(Json(json!({
                "status": "muted",
                "reason": "robot muted for this phone",
            })));
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!(error = %e, phone = %phone, "mute check failed");
        }
    }

    let reply = handle_customer_message(&state, &phone, None, &message)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, phone = %phone, "chat processing failed");
            AppError::Internal(e.to_string())
        })?;

    Ok(Json(json!({ "status": "ok", "ai_response": reply })))
}
