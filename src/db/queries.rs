use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::models::{Actor, Booking, BookingStatus};

const BOOKING_COLUMNS: &str = "id, zone, date, start_min, duration_minutes, party_size, \
     customer_name, customer_email, customer_phone, add_ons, coupon_code, total, \
     payment_ref, status, cancel_reason, cancelled_by, created_at, updated_at";

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let date_str: String = row.get(2)?;
    let start_min: i32 = row.get(3)?;
    let add_ons_json: String = row.get(9)?;
    let total_str: String = row.get(11)?;
    let status_str: String = row.get(13)?;
    let cancelled_by: Option<String> = row.get(15)?;
    let created_str: String = row.get(16)?;
    let updated_str: String = row.get(17)?;

    Ok(Booking {
        id: row.get(0)?,
        zone: row.get(1)?,
        date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")?,
        start: NaiveTime::from_hms_opt((start_min / 60) as u32, (start_min % 60) as u32, 0)
            .ok_or_else(|| anyhow::anyhow!("bad start_min in row: {start_min}"))?,
        duration_minutes: row.get(4)?,
        party_size: row.get(5)?,
        customer_name: row.get(6)?,
        customer_email: row.get(7)?,
        customer_phone: row.get(8)?,
        add_ons: serde_json::from_str(&add_ons_json).unwrap_or_default(),
        coupon_code: row.get(10)?,
        total: total_str.parse::<Decimal>()?,
        payment_ref: row.get(12)?,
        status: BookingStatus::from_str(&status_str),
        cancel_reason: row.get(14)?,
        cancelled_by: cancelled_by.as_deref().map(Actor::from_str),
        created_at: NaiveDateTime::parse_from_str(&created_str, TS_FORMAT)?,
        updated_at: NaiveDateTime::parse_from_str(&updated_str, TS_FORMAT)?,
    })
}

/// Plain insert. Returns the raw rusqlite error so callers inside the
/// create transaction can translate a unique-index violation into a slot
/// conflict.
pub fn insert_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, zone, date, start_min, end_min, duration_minutes, party_size, \
         customer_name, customer_email, customer_phone, add_ons, coupon_code, total, payment_ref, \
         status, cancel_reason, cancelled_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            booking.id,
            booking.zone,
            booking.date.format("%Y-%m-%d").to_string(),
            booking.start_minute(),
            booking.end_minute(),
            booking.duration_minutes,
            booking.party_size,
            booking.customer_name,
            booking.customer_email,
            booking.customer_phone,
            serde_json::to_string(&booking.add_ons).unwrap_or_else(|_| "[]".to_string()),
            booking.coupon_code,
            booking.total.to_string(),
            booking.payment_ref,
            booking.status.as_str(),
            booking.cancel_reason,
            booking.cancelled_by.map(|a| a.as_str()),
            booking.created_at.format(TS_FORMAT).to_string(),
            booking.updated_at.format(TS_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// Reserved [start, end) minute ranges for a zone and date, cancelled
/// bookings excluded. `exclude` drops one booking id from the result so
/// an update can check against everything but itself.
pub fn day_ranges(
    conn: &Connection,
    zone: &str,
    date: NaiveDate,
    exclude: Option<&str>,
) -> anyhow::Result<Vec<(i32, i32)>> {
    let mut stmt = conn.prepare(
        "SELECT start_min, end_min FROM bookings
         WHERE zone = ?1 AND date = ?2 AND status != 'cancelled'
           AND (?3 IS NULL OR id != ?3)
         ORDER BY start_min ASC",
    )?;

    let rows = stmt.query_map(
        params![zone, date.format("%Y-%m-%d").to_string(), exclude],
        |row| Ok((row.get::<_, i32>(0)?, row.get::<_, i32>(1)?)),
    )?;

    let mut ranges = vec![];
    for row in rows {
        ranges.push(row?);
    }
    Ok(ranges)
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
    let result = conn.query_row(&sql, params![id], |row| Ok(parse_booking_row(row)));

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1 \
                 ORDER BY date DESC, start_min DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings \
                 ORDER BY date DESC, start_min DESC LIMIT ?1"
            ),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn confirm_booking(
    conn: &Connection,
    id: &str,
    payment_ref: &str,
    now: NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = 'confirmed', payment_ref = ?1, updated_at = ?2
         WHERE id = ?3 AND status = 'pending'",
        params![payment_ref, now.format(TS_FORMAT).to_string(), id],
    )?;
    Ok(count > 0)
}

pub fn cancel_booking(
    conn: &Connection,
    id: &str,
    reason: &str,
    actor: Actor,
    now: NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = 'cancelled', cancel_reason = ?1, cancelled_by = ?2, updated_at = ?3
         WHERE id = ?4 AND status != 'cancelled'",
        params![
            reason,
            actor.as_str(),
            now.format(TS_FORMAT).to_string(),
            id
        ],
    )?;
    Ok(count > 0)
}

/// Full-field rewrite used by the admin patch path. Status and the cancel
/// columns are owned by the lifecycle transitions and left alone here.
pub fn update_booking_fields(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE bookings SET zone = ?1, date = ?2, start_min = ?3, end_min = ?4,
         duration_minutes = ?5, party_size = ?6, customer_name = ?7, customer_email = ?8,
         customer_phone = ?9, add_ons = ?10, coupon_code = ?11, total = ?12, updated_at = ?13
         WHERE id = ?14",
        params![
            booking.zone,
            booking.date.format("%Y-%m-%d").to_string(),
            booking.start_minute(),
            booking.end_minute(),
            booking.duration_minutes,
            booking.party_size,
            booking.customer_name,
            booking.customer_email,
            booking.customer_phone,
            serde_json::to_string(&booking.add_ons).unwrap_or_else(|_| "[]".to_string()),
            booking.coupon_code,
            booking.total.to_string(),
            booking.updated_at.format(TS_FORMAT).to_string(),
            booking.id,
        ],
    )?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct BookingCounts {
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
}

pub fn booking_counts(conn: &Connection) -> anyhow::Result<BookingCounts> {
    let count_for = |status: &str| -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE status = ?1",
            params![status],
            |row| row.get(0),
        )
        .unwrap_or(0)
    };

    Ok(BookingCounts {
        pending: count_for("pending"),
        confirmed: count_for("confirmed"),
        cancelled: count_for("cancelled"),
    })
}
