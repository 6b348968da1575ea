use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use serde_json::{Map, Value};

use crate::models::{
    ConversationState, EngagementTopic, LastBooking, Service, SessionRecord, SessionStatus, Status,
};

/// Rebuild the engine's typed state from the persisted flat record. Every
/// field is optional and decoded best-effort: a malformed stored value is
/// the same as an absent one.
pub fn decode(current_step: Option<&str>, data: &Map<String, Value>) -> ConversationState {
    let status = current_step
        .filter(|s| !s.is_empty())
        .map(Status::parse)
        .unwrap_or(Status::Start);

    let service = data
        .get("service")
        .and_then(|v| serde_json::from_value::<Service>(v.clone()).ok());

    let date = data
        .get("date")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

    let time = data
        .get("time")
        .and_then(Value::as_str)
        .map(str::to_string);

    let name = data
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string);

    let last_booking = data
        .get("last_booking")
        .and_then(|v| serde_json::from_value::<LastBooking>(v.clone()).ok());

    let engagement_context = data
        .get("engagement_context")
        .and_then(Value::as_str)
        .and_then(EngagementTopic::parse);

    ConversationState {
        status,
        service,
        date,
        time,
        name,
        last_booking,
        engagement_context,
    }
}

/// Flatten the typed state back into the persisted record, stamping the
/// activity timestamp. Absent fields are dropped so the stored JSON stays
/// minimal. The coarse `waiting_human` marker is never produced here; the
/// handoff branch writes it directly.
pub fn encode(state: &ConversationState, now: DateTime<FixedOffset>) -> SessionRecord {
    let mut data = Map::new();

    if let Some(service) = &state.service {
        if let Ok(value) = serde_json::to_value(service) {
            data.insert("service".to_string(), value);
        }
    }
    if let Some(date) = state.date {
        data.insert(
            "date".to_string(),
            Value::String(date.format("%Y-%m-%d").to_string()),
        );
    }
    if let Some(time) = &state.time {
        data.insert("time".to_string(), Value::String(time.clone()));
    }
    if let Some(name) = &state.name {
        data.insert("name".to_string(), Value::String(name.clone()));
    }
    if let Some(last_booking) = &state.last_booking {
        if let Ok(value) = serde_json::to_value(last_booking) {
            data.insert("last_booking".to_string(), value);
        }
    }
    if let Some(topic) = state.engagement_context {
        data.insert(
            "engagement_context".to_string(),
            Value::String(topic.as_str().to_string()),
        );
    }
    data.insert(
        "last_activity".to_string(),
        Value::String(now.to_rfc3339_opts(SecondsFormat::Secs, false)),
    );

    let status = if state.status == Status::Completed {
        SessionStatus::Completed
    } else {
        SessionStatus::Active
    };

    SessionRecord {
        current_step: state.status.as_str().to_string(),
        conversation_data: data,
        status,
    }
}
