use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Service;

/// Where the conversation currently stands. Persisted as the session's
/// `current_step` string, so the string mirrors must stay stable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Start,
    AwaitingWelcomeResponse,
    AwaitingServiceSelection,
    AwaitingEngagementResponse,
    AwaitingDate,
    AwaitingTime,
    AwaitingName,
    AwaitingConfirmation,
    Completed,
    FarewellSent,
    WaitingHuman,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Start => "start",
            Status::AwaitingWelcomeResponse => "awaiting_welcome_response",
            Status::AwaitingServiceSelection => "awaiting_service_selection",
            Status::AwaitingEngagementResponse => "awaiting_engagement_response",
            Status::AwaitingDate => "awaiting_date",
            Status::AwaitingTime => "awaiting_time",
            Status::AwaitingName => "awaiting_name",
            Status::AwaitingConfirmation => "awaiting_confirmation",
            Status::Completed => "completed",
            Status::FarewellSent => "farewell_sent",
            Status::WaitingHuman => "waiting_human",
        }
    }

    /// Unknown or absent step labels fall back to `start`.
    pub fn parse(s: &str) -> Self {
        match s {
            "awaiting_welcome_response" => Status::AwaitingWelcomeResponse,
            "awaiting_service_selection" => Status::AwaitingServiceSelection,
            "awaiting_engagement_response" => Status::AwaitingEngagementResponse,
            "awaiting_date" => Status::AwaitingDate,
            "awaiting_time" => Status::AwaitingTime,
            "awaiting_name" => Status::AwaitingName,
            "awaiting_confirmation" => Status::AwaitingConfirmation,
            "completed" => Status::Completed,
            "farewell_sent" => Status::FarewellSent,
            "waiting_human" => Status::WaitingHuman,
            _ => Status::Start,
        }
    }
}

/// Which informational topic triggered the engagement offer, so a bare
/// "sim" afterwards can be read as "show me the services".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EngagementTopic {
    Address,
    Phone,
    Instagram,
}

impl EngagementTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementTopic::Address => "address",
            EngagementTopic::Phone => "phone",
            EngagementTopic::Instagram => "instagram",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "address" => Some(EngagementTopic::Address),
            "phone" => Some(EngagementTopic::Phone),
            "instagram" => Some(EngagementTopic::Instagram),
            _ => None,
        }
    }
}

/// Snapshot of the last confirmed booking. `date` is the DD/MM display
/// string shown back to the customer, not a calendar value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LastBooking {
    pub name: String,
    pub service: String,
    pub date: String,
    pub time: String,
}

/// The engine's working state for one customer. Lives only for the span of
/// one `respond` call; everything here round-trips through the session
/// record.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    pub status: Status,
    pub service: Option<Service>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub name: Option<String>,
    pub last_booking: Option<LastBooking>,
    pub engagement_context: Option<EngagementTopic>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            status: Status::Start,
            service: None,
            date: None,
            time: None,
            name: None,
            last_booking: None,
            engagement_context: None,
        }
    }

    /// Full reset, dropping any in-progress booking and history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}
