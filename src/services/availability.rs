use chrono::{NaiveDate, NaiveTime, Timelike};
use rusqlite::Connection;

use crate::db::queries;

/// Venue operating window, minutes from midnight. Bookable start labels
/// run hourly from open through 18:00; everything must end by close.
pub const OPEN_MINUTE: i32 = 10 * 60;
pub const LAST_START_MINUTE: i32 = 18 * 60;
pub const CLOSE_MINUTE: i32 = 19 * 60;

/// Duration assumed when listing open slots for display. The authority for
/// acceptance is always the overlap check against the requested duration.
pub const DEFAULT_SLOT_MINUTES: i32 = 60;

pub fn start_labels() -> impl Iterator<Item = i32> {
    (OPEN_MINUTE..=LAST_START_MINUTE).step_by(60)
}

pub fn minute_of(t: NaiveTime) -> i32 {
    (t.hour() * 60 + t.minute()) as i32
}

pub fn label(minute: i32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// Half-open interval test: [a_start, a_end) and [b_start, b_end) overlap
/// iff a_start < b_end && b_start < a_end. Holds for arbitrary durations.
pub fn ranges_overlap(a_start: i32, a_end: i32, b_start: i32, b_end: i32) -> bool {
    a_start < b_end && b_start < a_end
}

pub fn conflicts(existing: &[(i32, i32)], start: i32, end: i32) -> bool {
    existing
        .iter()
        .any(|&(s, e)| ranges_overlap(start, end, s, e))
}

pub fn within_operating_hours(start: i32, end: i32) -> bool {
    start >= OPEN_MINUTE && start <= LAST_START_MINUTE && end <= CLOSE_MINUTE && end > start
}

/// True iff the range sits inside operating hours and no non-cancelled
/// booking for the same zone and date overlaps it. `exclude` lets an
/// update re-check against every booking but itself.
pub fn is_available(
    conn: &Connection,
    zone: &str,
    date: NaiveDate,
    start: i32,
    duration_minutes: i32,
    exclude: Option<&str>,
) -> anyhow::Result<bool> {
    let end = start + duration_minutes;
    if !within_operating_hours(start, end) {
        return Ok(false);
    }
    let taken = queries::day_ranges(conn, zone, date, exclude)?;
    Ok(!conflicts(&taken, start, end))
}

/// Operating-hour labels still open for a default-length slot. Display
/// only: a longer requested duration can still conflict at create time.
pub fn free_slots(conn: &Connection, zone: &str, date: NaiveDate) -> anyhow::Result<Vec<String>> {
    let taken = queries::day_ranges(conn, zone, date, None)?;

    Ok(start_labels()
        .filter(|&start| {
            let end = start + DEFAULT_SLOT_MINUTES;
            end <= CLOSE_MINUTE && !conflicts(&taken, start, end)
        })
        .map(label)
        .collect())
}
