use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::Catalog;

use super::{BookingGateway, BookingOutcome};

const RESERVED_STATUS: &str = "Agendado";

/// SQLite-backed availability ledger: one row per (date, time) slot, the
/// same shape as the studio's agenda sheet. A slot is open while its
/// `client` column is empty. Bookings longer than 30 minutes fill the
/// follow-on rows with a reservation marker.
pub struct LedgerGateway {
    db: Arc<Mutex<Connection>>,
    durations: HashMap<String, u32>,
}

impl LedgerGateway {
    pub fn new(db: Arc<Mutex<Connection>>, catalog: &Catalog) -> Self {
        let durations = catalog
            .services
            .iter()
            .map(|s| (s.name.clone(), s.duration_minutes))
            .collect();
        Self { db, durations }
    }

    /// Open a day for booking: one empty row per time slot. Existing rows
    /// are left alone.
    pub fn seed_day(&self, date: &str, times: &[&str]) -> anyhow::Result<()> {
        let db = self.db.lock().unwrap();
        for time in times {
            db.execute(
                "INSERT OR IGNORE INTO agenda (date, time) VALUES (?1, ?2)",
                params![date, time],
            )?;
        }
        Ok(())
    }

    fn slot_times(&self, service: &str, start: &str) -> Option<Vec<String>> {
        let duration = self.durations.get(service).copied().unwrap_or(30);
        let start = NaiveTime::parse_from_str(start, "%H:%M").ok()?;
        let count = (duration / 30).max(1);
        Some(
            (0..count)
                .map(|i| {
                    (start + Duration::minutes(i as i64 * 30))
                        .format("%H:%M")
                        .to_string()
                })
                .collect(),
        )
    }
}

#[async_trait]
impl BookingGateway for LedgerGateway {
    async fn list_open_dates(&self) -> anyhow::Result<Vec<String>> {
        let db = self.db.lock().unwrap();
        let mut stmt =
            db.prepare("SELECT DISTINCT date FROM agenda WHERE client = '' ORDER BY date")?;
        let dates = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dates)
    }

    async fn list_open_slots(&self, date: &str) -> anyhow::Result<Vec<String>> {
        let db = self.db.lock().unwrap();
        let result = db
            .prepare("SELECT time FROM agenda WHERE date = ?1 AND client = '' ORDER BY time")
            .and_then(|mut stmt| {
                stmt.query_map(params![date], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()
            });

        // A broken lookup shows the customer "no options", not an error.
        match result {
            Ok(times) => Ok(times),
            Err(e) => {
                tracing::error!(error = %e, date = %date, "slot lookup failed, returning none");
                Ok(vec![])
            }
        }
    }

    async fn book(
        &self,
        phone: &str,
        name: &str,
        service: &str,
        date: &str,
        time: &str,
    ) -> anyhow::Result<BookingOutcome> {
        let times = match self.slot_times(service, time) {
            Some(times) => times,
            None => return Ok(BookingOutcome::NotFound),
        };

        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;

        // All spanned rows must exist and be free before anything is
        // written, so a refused booking leaves no trace.
        for slot in &times {
            let client: Option<String> = tx
                .query_row(
                    "SELECT client FROM agenda WHERE date = ?1 AND time = ?2",
                    params![date, slot],
                    |row| row.get(0),
                )
                .optional()?;

            match client {
                None => {
                    tracing::warn!(date = %date, time = %slot, "no agenda row for slot");
                    return Ok(BookingOutcome::NotFound);
                }
                Some(c) if !c.trim().is_empty() => {
                    tracing::warn!(date = %date, time = %slot, "slot already taken");
                    return Ok(BookingOutcome::Conflict);
                }
                Some(_) => {}
            }
        }

        for (i, slot) in times.iter().enumerate() {
            let client = if i == 0 {
                name.to_string()
            } else {
                format!("RESERVADO ({name})")
            };
            tx.execute(
                "UPDATE agenda SET client = ?1, service = ?2, phone = ?3, status = ?4
                 WHERE date = ?5 AND time = ?6",
                params![client, service, phone, RESERVED_STATUS, date, slot],
            )?;
        }

        tx.commit()?;
        tracing::info!(phone = %phone, service = %service, date = %date, time = %time, "booked");
        Ok(BookingOutcome::Booked)
    }

    async fn cancel(&self, phone: &str) -> anyhow::Result<bool> {
        let db = self.db.lock().unwrap();
        let cleared = db.execute(
            "UPDATE agenda SET client = '', service = '', phone = '', status = ''
             WHERE phone = ?1 AND status = ?2",
            params![phone, RESERVED_STATUS],
        )?;
        if cleared > 0 {
            tracing::info!(phone = %phone, slots = cleared, "cancelled booking");
        }
        Ok(cleared > 0)
    }

    async fn request_human(&self, phone: &str, name: &str, reason: &str) -> anyhow::Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO robot_control (phone, muted, client_name, status)
             VALUES (?1, 1, ?2, ?3)
             ON CONFLICT(phone) DO UPDATE SET
               muted = 1,
               client_name = excluded.client_name,
               status = excluded.status",
            params![phone, name, reason],
        )?;
        Ok(())
    }

    async fn is_muted(&self, phone: &str) -> anyhow::Result<bool> {
        let db = self.db.lock().unwrap();
        let muted: Option<bool> = db
            .query_row(
                "SELECT muted FROM robot_control WHERE phone = ?1",
                params![phone],
                |row| row.get(0),
            )
            .optional()
            .unwrap_or_else(|e| {
                // When the check itself breaks, the robot keeps answering.
                tracing::error!(error = %e, phone = %phone, "mute check failed");
                None
            });
        Ok(muted.unwrap_or(false))
    }
}
