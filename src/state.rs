use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::Catalog;
use crate::services::gateway::BookingGateway;
use crate::services::messaging::MessagingProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub gateway: Box<dyn BookingGateway>,
    pub messaging: Box<dyn MessagingProvider>,
    pub catalog: Catalog,
    pub seen_messages: Mutex<SeenMessages>,
    phone_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl AppState {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        config: AppConfig,
        gateway: Box<dyn BookingGateway>,
        messaging: Box<dyn MessagingProvider>,
        catalog: Catalog,
    ) -> Self {
        Self {
            db,
            config,
            gateway,
            messaging,
            catalog,
            seen_messages: Mutex::new(SeenMessages::with_capacity(500)),
            phone_locks: DashMap::new(),
        }
    }

    /// One lock per phone, held for the whole read-respond-write cycle so
    /// two messages from the same customer can't race on the session row.
    pub fn phone_lock(&self, phone: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.phone_locks
            .entry(phone.to_string())
            .or_default()
            .clone()
    }
}

/// Bounded FIFO of processed webhook message ids, guarding against
/// redelivery.
pub struct SeenMessages {
    order: VecDeque<String>,
    seen: HashSet<String>,
    capacity: usize,
}

impl SeenMessages {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Register an id; `false` means it was already seen (or empty) and the
    /// message should be dropped.
    pub fn insert(&mut self, id: &str) -> bool {
        if id.is_empty() || self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_string());
        self.order.push_back(id.to_string());
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        true
    }
}
