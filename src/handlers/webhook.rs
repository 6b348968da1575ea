use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

use super::handle_customer_message;

/// Z-API delivers text in a handful of shapes; take whichever is present.
fn extract_message_text(payload: &Value) -> String {
    if let Some(text) = payload.get("text").and_then(Value::as_str) {
        return text.to_string();
    }
    if let Some(text) = payload
        .pointer("/text/message")
        .and_then(Value::as_str)
    {
        return text.to_string();
    }
    if let Some(text) = payload
        .pointer("/message/text")
        .and_then(Value::as_str)
    {
        return text.to_string();
    }
    if let Some(text) = payload.get("message").and_then(Value::as_str) {
        return text.to_string();
    }
    String::new()
}

fn extract_message_id(payload: &Value) -> String {
    payload
        .get("messageId")
        .or_else(|| payload.get("id"))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default()
}

/// Inbound WhatsApp webhook (Z-API shape). Filters groups, echoes of our
/// own messages, duplicates and muted phones before the engine runs.
pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    let phone = payload
        .get("phone")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let is_group = payload
        .get("isGroup")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let from_me = payload
        .get("fromMe")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if phone.is_empty() || is_group || from_me {
        tracing::debug!(is_group, from_me, "ignoring webhook event");
        return Json(json!({ "status": "ignored" }));
    }

    let message_id = extract_message_id(&payload);
    if !state.seen_messages.lock().unwrap().insert(&message_id) {
        tracing::info!(message_id = %message_id, "duplicate delivery ignored");
        return Json(json!({ "status": "duplicate" }));
    }

    let message = extract_message_text(&payload).trim().to_string();
    if message.is_empty() {
        return Json(json!({ "status": "empty" }));
    }

    let sender_name = payload
        .get("senderName")
        .or_else(|| payload.get("chatName"))
        .and_then(Value::as_str)
        .map(str::to_string);

    tracing::info!(phone = %phone, body = %message, "incoming WhatsApp message");

    match state.gateway.is_muted(&phone).await {
        Ok(true) => {
            tracing::info!(phone = %phone, "robot muted, staying quiet");
            return Json(json!({ "status": "muted" }));
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!(error = %e, phone = %phone, "mute check failed");
        }
    }

    match handle_customer_message(&state, &phone, sender_name.as_deref(), &message).await {
        Ok(_) => Json(json!({ "status": "ok" })),
        Err(e) => {
            tracing::error!(error = %e, phone = %phone, "webhook processing failed");
            Json(json!({ "status": "error" }))
        }
    }
}
