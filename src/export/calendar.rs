//! iCalendar export.
//!
//! One `VEVENT` per populated slot. The event for a slot starts at the anchor
//! plus the day's position in the week (Monday = 0). Lines end in CRLF, text
//! values are escaped, and long lines are folded at 75 octets.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use std::fs;
use std::path::Path;

use crate::config::DEFAULT_PRODUCT_ID;
use crate::errors::ExportError;
use crate::planner::ResolvedSlot;

/// Maximum octets per content line before folding
pub const CALENDAR_LINE_LIMIT: usize = 75;

const UID_DOMAIN: &str = "msosihub";
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarOptions {
    /// Start of Monday
    pub anchor: DateTime<Utc>,
    pub product_id: String,
    /// DTSTAMP written on every event
    pub stamp: DateTime<Utc>,
}

impl CalendarOptions {
    pub fn new(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor,
            product_id: DEFAULT_PRODUCT_ID.to_string(),
            stamp: Utc::now(),
        }
    }

    pub fn with_product_id(mut self, product_id: &str) -> Self {
        self.product_id = product_id.to_string();
        self
    }

    pub fn with_stamp(mut self, stamp: DateTime<Utc>) -> Self {
        self.stamp = stamp;
        self
    }
}

/// Midnight UTC at the start of `date`
pub fn anchor_from_date(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// The Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub uid: String,
    pub start: DateTime<Utc>,
    pub summary: String,
    pub description: String,
}

/// One event per slot; failed lookups get an empty ingredients section
pub fn build_events(slots: &[ResolvedSlot], options: &CalendarOptions) -> Vec<CalendarEvent> {
    slots
        .iter()
        .map(|resolved| {
            let day = resolved.slot.day;
            let category = resolved.slot.category;
            let start = options.anchor + Duration::days(day.index() as i64);
            let ingredients = resolved
                .ingredients
                .as_deref()
                .map(|lines| lines.join(", "))
                .unwrap_or_default();

            CalendarEvent {
                uid: format!(
                    "{}-{}-{}@{}",
                    start.format("%Y%m%d"),
                    day.as_str().to_lowercase(),
                    category.as_str().to_lowercase(),
                    UID_DOMAIN
                ),
                start,
                summary: format!("{} - {}", category, resolved.dish),
                description: format!(
                    "{} meal: {}\n\nIngredients: {}",
                    category, resolved.dish, ingredients
                ),
            }
        })
        .collect()
}

/// Render a complete calendar document
pub fn render_calendar(events: &[CalendarEvent], options: &CalendarOptions) -> String {
    let stamp = options.stamp.format(TIMESTAMP_FORMAT).to_string();

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", options.product_id),
        "CALSCALE:GREGORIAN".to_string(),
    ];
    for event in events {
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}", event.uid));
        lines.push(format!("DTSTAMP:{}", stamp));
        lines.push(format!("DTSTART:{}", event.start.format(TIMESTAMP_FORMAT)));
        lines.push(format!("SUMMARY:{}", escape_text(&event.summary)));
        lines.push(format!("DESCRIPTION:{}", escape_text(&event.description)));
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());

    let mut document = String::new();
    for line in lines {
        document.push_str(&fold_line(&line));
        document.push_str("\r\n");
    }
    document
}

/// Escape a TEXT value
pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// Fold a content line so no physical line exceeds the octet limit
///
/// Continuation lines start with a single space, which counts toward the limit.
/// Multi-byte characters are never split.
pub fn fold_line(line: &str) -> String {
    let mut folded = String::with_capacity(line.len() + line.len() / CALENDAR_LINE_LIMIT * 3);
    let mut used = 0;
    for ch in line.chars() {
        let width = ch.len_utf8();
        if used + width > CALENDAR_LINE_LIMIT {
            folded.push_str("\r\n ");
            used = 1;
        }
        folded.push(ch);
        used += width;
    }
    folded
}

/// Write the `.ics` artifact
pub fn write_calendar_file(path: &Path, document: &str) -> Result<(), ExportError> {
    fs::write(path, document)?;
    Ok(())
}
