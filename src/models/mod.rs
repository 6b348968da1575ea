pub mod conversation;
pub mod service;
pub mod session;

pub use conversation::{ConversationState, EngagementTopic, LastBooking, Status};
pub use service::{Catalog, Price, Service};
pub use session::{SessionRecord, SessionStatus};
