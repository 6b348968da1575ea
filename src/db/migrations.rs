use anyhow::Context;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            phone TEXT PRIMARY KEY,
            current_step TEXT NOT NULL DEFAULT 'start',
            conversation_data TEXT NOT NULL DEFAULT '{}',
            status TEXT NOT NULL DEFAULT 'active',
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS message_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            phone TEXT NOT NULL,
            message TEXT NOT NULL,
            direction TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_message_logs_phone ON message_logs(phone);

        -- One row per bookable slot, the same shape as the agenda sheet.
        CREATE TABLE IF NOT EXISTS agenda (
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            client TEXT NOT NULL DEFAULT '',
            service TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (date, time)
        );

        CREATE TABLE IF NOT EXISTS robot_control (
            phone TEXT PRIMARY KEY,
            muted INTEGER NOT NULL DEFAULT 0,
            client_name TEXT,
            status TEXT
        );",
    )
    .context("failed to run schema migrations")?;

    Ok(())
}
