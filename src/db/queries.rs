use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

use crate::models::{SessionRecord, SessionStatus};

// ── Sessions ──

pub fn get_session(conn: &Connection, phone: &str) -> anyhow::Result<Option<SessionRecord>> {
    let row: Option<(String, String, String)> = conn
        .query_row(
            "SELECT current_step, conversation_data, status FROM sessions WHERE phone = ?1",
            params![phone],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    Ok(row.map(|(current_step, data_json, status)| {
        let conversation_data: Map<String, Value> =
            serde_json::from_str(&data_json).unwrap_or_default();
        SessionRecord {
            current_step,
            conversation_data,
            status: SessionStatus::parse(&status),
        }
    }))
}

pub fn save_session(conn: &Connection, phone: &str, record: &SessionRecord) -> anyhow::Result<()> {
    let data_json = serde_json::to_string(&record.conversation_data)?;
    let updated_at = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();

    conn.execute(
        "INSERT INTO sessions (phone, current_step, conversation_data, status, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(phone) DO UPDATE SET
           current_step = excluded.current_step,
           conversation_data = excluded.conversation_data,
           status = excluded.status,
           updated_at = excluded.updated_at",
        params![
            phone,
            record.current_step,
            data_json,
            record.status.as_str(),
            updated_at
        ],
    )?;
    Ok(())
}

// ── Message log ──

pub fn log_message(
    conn: &Connection,
    phone: &str,
    message: &str,
    direction: &str,
) -> anyhow::Result<()> {
    let timestamp = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();
    conn.execute(
        "INSERT INTO message_logs (phone, message, direction, timestamp)
         VALUES (?1, ?2, ?3, ?4)",
        params![phone, message, direction, timestamp],
    )?;
    Ok(())
}
