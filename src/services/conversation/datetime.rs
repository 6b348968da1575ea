use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::normalize::normalize;

/// Transient parse result. Either side may be present independently; a
/// single utterance like "dia 20 as 15h" yields both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedDateTime {
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
}

// Time phrasings, loosest last. Declaration order is the precedence order:
// the first pattern whose candidate passes range validation wins, an
// out-of-range candidate falls through to the next pattern.
//   "15h", "15hs", "15h30", "15:00", "as 15 horas"
//   "3 da tarde", "9 da manha"
static TIME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?:as)?\s*(\d{1,2})\s*(?:h|:|hs|horas)\s*(\d{2})?").expect("valid regex"),
        Regex::new(r"(\d{1,2})\s+(?:da\s+)?(?:manha|tarde|noite)").expect("valid regex"),
    ]
});

static DAY_OF_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"dia\s+(\d{1,2})(?:/(\d{1,2}))?").expect("valid regex"));

static SLASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})").expect("valid regex"));

/// Parse free-form Portuguese text for a calendar date and a clock time.
/// Pure function of the text and the reference clock; the year is always
/// the reference year (no year phrasings are recognized).
pub fn extract(text: &str, now: NaiveDateTime) -> ExtractedDateTime {
    let text = normalize(text);

    let time = extract_time(&text);
    let date = extract_date(&text, now);

    tracing::debug!(?date, ?time, input = %text, "date/time extraction");

    ExtractedDateTime { date, time }
}

fn extract_time(text: &str) -> Option<String> {
    for pattern in TIME_PATTERNS.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };

        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minutes: u32 = caps
            .get(2)
            .map(|m| m.as_str().parse().unwrap_or(0))
            .unwrap_or(0);

        if hour <= 23 && minutes <= 59 {
            return Some(format!("{hour:02}:{minutes:02}"));
        }
        // out of range: discard this candidate, try the next pattern
    }
    None
}

fn extract_date(text: &str, now: NaiveDateTime) -> Option<NaiveDate> {
    if text.contains("hoje") {
        return Some(now.date());
    }
    if text.contains("amanha") {
        return Some((now + Duration::days(1)).date());
    }

    // "dia 20" / "dia 20/01". When this pattern matches at all, its result
    // is final: an invalid day/month combination yields no date rather than
    // falling through to the bare DD/MM pattern.
    if let Some(caps) = DAY_OF_MONTH.captures(text) {
        let day: u32 = caps.get(1)?.as_str().parse().ok()?;
        let month: u32 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(now.month());
        return NaiveDate::from_ymd_opt(now.year(), month, day);
    }

    if let Some(caps) = SLASH_DATE.captures(text) {
        let day: u32 = caps.get(1)?.as_str().parse().ok()?;
        let month: u32 = caps.get(2)?.as_str().parse().ok()?;
        return NaiveDate::from_ymd_opt(now.year(), month, day);
    }

    None
}

/// The availability ledger may hand back dates as either `YYYY-MM-DD` or
/// `DD/MM/YYYY`; comparisons in the engine always use `DD/MM/YYYY`.
pub fn standardize_ledger_dates(dates: &[String]) -> Vec<String> {
    dates
        .iter()
        .map(|d| {
            if d.contains('-') {
                if let Ok(parsed) = NaiveDate::parse_from_str(d, "%Y-%m-%d") {
                    return parsed.format("%d/%m/%Y").to_string();
                }
            }
            d.clone()
        })
        .collect()
}
