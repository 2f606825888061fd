//! Relative timestamps for conversation lists and message bubbles.

use chrono::{DateTime, Datelike, Days, Local, TimeZone, Utc};

/// Formats `target` relative to `now`, on the wall clock of `now`'s time zone.
///
/// Comparisons are by calendar day, not elapsed time: 23 hours across midnight is
/// `"Yesterday"`, and anything from the last week on another weekday is a weekday name.
pub fn format_relative<Tz: TimeZone>(target: &DateTime<Tz>, now: &DateTime<Tz>) -> String {
    let target = target.with_timezone(&now.timezone()).naive_local();
    let now = now.naive_local();

    if target.date() == now.date() {
        return target.format("%H:%M").to_string();
    }

    if now.date().pred_opt() == Some(target.date()) {
        return "Yesterday".to_owned();
    }

    let week_ago = now.checked_sub_days(Days::new(7));
    if target < now
        && week_ago.is_some_and(|week_ago| target > week_ago)
        && target.weekday() != now.weekday()
    {
        return target.format("%A").to_string();
    }

    format!("{}-{}-{}", target.year(), target.month(), target.day())
}

/// [`format_relative`] against the local clock.
pub fn format_relative_now(target: &DateTime<Utc>) -> String {
    format_relative(&target.with_timezone(&Local), &Local::now())
}
