use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc, Weekday};
use serde_json::{Map, Value};

/// Idle time after which a session is discarded and the customer starts over.
pub const SESSION_TIMEOUT_MINUTES: i64 = 30;

/// The studio runs on Brazil time (UTC-3, no DST).
pub fn brazil_now() -> DateTime<FixedOffset> {
    let offset = FixedOffset::west_opt(3 * 3600).expect("valid fixed offset");
    Utc::now().with_timezone(&offset)
}

/// Working days are Tuesday through Saturday.
pub fn is_working_day(date: NaiveDate) -> bool {
    matches!(
        date.weekday(),
        Weekday::Tue | Weekday::Wed | Weekday::Thu | Weekday::Fri | Weekday::Sat
    )
}

pub fn weekday_name_pt(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Segunda-feira",
        Weekday::Tue => "Terça-feira",
        Weekday::Wed => "Quarta-feira",
        Weekday::Thu => "Quinta-feira",
        Weekday::Fri => "Sexta-feira",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}

/// Next Tuesday–Saturday date strictly after `date`, searching at most a
/// week ahead.
pub fn next_working_day(date: NaiveDate) -> Option<NaiveDate> {
    let mut next = date;
    for _ in 0..7 {
        next = next.succ_opt()?;
        if is_working_day(next) {
            return Some(next);
        }
    }
    None
}

/// A session is expired when its `last_activity` is more than the timeout in
/// the past. Empty session data counts as expired (nothing worth keeping);
/// a non-empty session without the timestamp, or with an unreadable one, is
/// treated as fresh so brand-new or legacy sessions aren't punished.
pub fn is_session_expired(session_data: &Map<String, Value>, now: NaiveDateTime) -> bool {
    if session_data.is_empty() {
        return true;
    }

    let Some(raw) = session_data.get("last_activity").and_then(Value::as_str) else {
        return false;
    };

    let Some(last_activity) = parse_activity_timestamp(raw) else {
        tracing::warn!(last_activity = raw, "unreadable last_activity timestamp");
        return false;
    };

    let elapsed = now - last_activity;
    let expired = elapsed > Duration::minutes(SESSION_TIMEOUT_MINUTES);
    if expired {
        tracing::info!(last_activity = raw, elapsed_minutes = elapsed.num_minutes(), "session expired");
    }
    expired
}

/// Accepts RFC 3339 with offset (how we write it) and the bare
/// `YYYY-MM-DDTHH:MM:SS` form, compared as local wall-clock time.
fn parse_activity_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
}
