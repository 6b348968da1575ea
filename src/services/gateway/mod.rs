pub mod ledger;

use async_trait::async_trait;

/// What happened to a booking attempt. The transport error case travels
/// separately as `Err`, so the engine can word each failure differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingOutcome {
    /// Slot(s) reserved.
    Booked,
    /// At least one of the required slots is already taken.
    Conflict,
    /// The agenda has no rows for the requested date/time.
    NotFound,
}

/// The availability ledger and robot-control backend the engine talks to.
/// All calls are per-message and synchronous from the engine's point of
/// view; implementations own caching and consistency.
#[async_trait]
pub trait BookingGateway: Send + Sync {
    /// Dates with at least one free slot, as `DD/MM/YYYY` strings (the
    /// engine also tolerates `YYYY-MM-DD`).
    async fn list_open_dates(&self) -> anyhow::Result<Vec<String>>;

    /// Free `HH:MM` slots for one `DD/MM/YYYY` date, in order.
    async fn list_open_slots(&self, date: &str) -> anyhow::Result<Vec<String>>;

    /// Reserve the slots spanned by the service duration. No partial
    /// side effects on `Conflict`/`NotFound`.
    async fn book(
        &self,
        phone: &str,
        name: &str,
        service: &str,
        date: &str,
        time: &str,
    ) -> anyhow::Result<BookingOutcome>;

    /// Cancel the customer's current reservation. `false` when nothing was
    /// found.
    async fn cancel(&self, phone: &str) -> anyhow::Result<bool>;

    /// Record a handoff: mute the robot for this phone and store the
    /// resolved client name plus the reason for the owner to see.
    async fn request_human(&self, phone: &str, name: &str, reason: &str) -> anyhow::Result<()>;

    /// Whether the robot is muted for this phone. Consulted by the
    /// transport layer before the engine ever runs.
    async fn is_muted(&self, phone: &str) -> anyhow::Result<bool>;
}
