//! Render-time text formatting for view models. All stamps are UTC.

use chrono::{DateTime, Utc};

use crate::model::UnixTimeMs;

fn to_utc(time: UnixTimeMs) -> DateTime<Utc> {
    i64::try_from(time.0)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default()
}

/// "MAR 18"
#[must_use]
pub fn format_day(time: UnixTimeMs) -> String {
    to_utc(time).format("%b %d").to_string().to_uppercase()
}

/// "13:30"
#[must_use]
pub fn format_time(time: UnixTimeMs) -> String {
    to_utc(time).format("%H:%M").to_string()
}

/// "18/03/19 13:30", the edit form stamp.
#[must_use]
pub fn format_form_datetime(time: UnixTimeMs) -> String {
    to_utc(time).format("%d/%m/%y %H:%M").to_string()
}

/// "30M", "02H 44M" or "01D 02H 30M".
#[must_use]
pub fn format_duration(ms: u64) -> String {
    let days = ms / UnixTimeMs::DAY;
    let hours = (ms % UnixTimeMs::DAY) / UnixTimeMs::HOUR;
    let minutes = (ms % UnixTimeMs::HOUR) / UnixTimeMs::MINUTE;

    if days > 0 {
        format!("{days:02}D {hours:02}H {minutes:02}M")
    } else if hours > 0 {
        format!("{hours:02}H {minutes:02}M")
    } else {
        format!("{minutes:02}M")
    }
}
