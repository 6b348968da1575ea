use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Coarse lifecycle marker kept alongside the step label, so the transport
/// layer can tell handed-off conversations apart without decoding the data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    WaitingHuman,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::WaitingHuman => "waiting_human",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => SessionStatus::Completed,
            "waiting_human" => SessionStatus::WaitingHuman,
            _ => SessionStatus::Active,
        }
    }
}

/// The externally persisted conversation snapshot, keyed by phone. The
/// engine receives the previous record's pieces and returns a fresh one;
/// durability and per-phone serialization are the caller's problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub current_step: String,
    pub conversation_data: Map<String, Value>,
    pub status: SessionStatus,
}
