use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::TransactionBehavior;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{zone, Actor, AddOn, Booking, BookingStatus, CouponCheck};
use crate::services::notify::Notification;
use crate::services::{availability, coupons, pricing};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub zone: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub duration_minutes: i32,
    pub party_size: i32,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub add_ons: Vec<AddOn>,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingPatch {
    pub zone: Option<String>,
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveTime>,
    pub duration_minutes: Option<i32>,
    pub party_size: Option<i32>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub add_ons: Option<Vec<AddOn>>,
    pub coupon_code: Option<String>,
}

/// The booking plus any non-fatal sub-errors (a notification recipient
/// that failed, a coupon that was not applied). The booking itself is the
/// durable fact; warnings never mean the operation failed.
#[derive(Debug, Clone, Serialize)]
pub struct BookingOutcome {
    pub booking: Booking,
    pub warnings: Vec<String>,
}

fn validate_create(input: &CreateBooking) -> Result<&'static zone::Zone, AppError> {
    let mut missing = vec![];
    if input.customer_name.trim().is_empty() {
        missing.push("name");
    }
    if input.customer_email.trim().is_empty() {
        missing.push("email");
    }
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }
    if !input.customer_email.contains('@') {
        return Err(AppError::Validation("invalid email address".to_string()));
    }
    if input.duration_minutes <= 0 {
        return Err(AppError::Validation(
            "duration must be positive".to_string(),
        ));
    }
    if input.party_size <= 0 {
        return Err(AppError::Validation(
            "party size must be at least 1".to_string(),
        ));
    }
    zone::find(&input.zone)
        .ok_or_else(|| AppError::Validation(format!("unknown zone: {}", input.zone)))
}

fn collect_failures(deliveries: &[crate::services::notify::Delivery], warnings: &mut Vec<String>) {
    for d in deliveries.iter().filter(|d| !d.ok) {
        warnings.push(format!(
            "notification to {} failed: {}",
            d.recipient,
            d.error.as_deref().unwrap_or("unknown error")
        ));
    }
}

/// Validates the request, prices it, and inserts the booking in `pending`.
/// The availability check and the insert run inside one immediate
/// transaction, with the partial unique index as backstop, so two
/// concurrent creates for the same range end in exactly one booking and
/// one conflict. The created notification is dispatched after commit and
/// only ever adds warnings.
pub async fn create(
    state: &AppState,
    input: CreateBooking,
    now: NaiveDateTime,
) -> Result<BookingOutcome, AppError> {
    let zone = validate_create(&input)?;
    let mut warnings = vec![];

    let start_min = availability::minute_of(input.start);
    let end_min = start_min + input.duration_minutes;
    if !availability::within_operating_hours(start_min, end_min) {
        return Err(AppError::Validation(format!(
            "outside operating hours ({}-{})",
            availability::label(availability::OPEN_MINUTE),
            availability::label(availability::CLOSE_MINUTE),
        )));
    }

    let applied_coupon: Option<CouponCheck> = match input.coupon_code.as_deref() {
        Some(code) if !code.trim().is_empty() => {
            let check = coupons::validate(
                state.coupons.as_ref(),
                code,
                input.duration_minutes,
                now,
            );
            if check.valid {
                Some(check)
            } else {
                let reason = check
                    .rejection
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "unknown code".to_string());
                warnings.push(format!("coupon not applied: {reason}"));
                None
            }
        }
        _ => None,
    };

    let quote = pricing::quote(
        zone.rate_per_hour(),
        input.duration_minutes,
        &input.add_ons,
        applied_coupon.as_ref(),
    );

    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        zone: zone.id.to_string(),
        date: input.date,
        start: input.start,
        duration_minutes: input.duration_minutes,
        party_size: input.party_size,
        customer_name: input.customer_name.trim().to_string(),
        customer_email: input.customer_email.trim().to_string(),
        customer_phone: input.customer_phone,
        add_ons: input.add_ons,
        coupon_code: applied_coupon
            .is_some()
            .then(|| input.coupon_code.as_deref().unwrap_or("").trim().to_uppercase()),
        total: quote.total,
        payment_ref: None,
        status: BookingStatus::Pending,
        cancel_reason: None,
        cancelled_by: None,
        created_at: now,
        updated_at: now,
    };

    {
        let mut db = state.db.lock().unwrap();
        let tx = db
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(AppError::Database)?;

        let taken = queries::day_ranges(&tx, zone.id, booking.date, None)?;
        if availability::conflicts(&taken, start_min, end_min) {
            return Err(AppError::SlotConflict);
        }

        match queries::insert_booking(&tx, &booking) {
            Ok(()) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(AppError::SlotConflict);
            }
            Err(e) => return Err(AppError::Database(e)),
        }

        tx.commit().map_err(AppError::Database)?;
    }

    tracing::info!(
        booking_id = %booking.id,
        zone = %booking.zone,
        date = %booking.date,
        total = %booking.total,
        "booking created"
    );

    let deliveries = state
        .notifier
        .dispatch(&Notification::booking_created(&booking, &state.config.staff_email))
        .await;
    collect_failures(&deliveries, &mut warnings);

    Ok(BookingOutcome { booking, warnings })
}

/// pending -> confirmed. A payment reference is required unless the
/// booking priced to exactly zero.
pub async fn confirm(
    state: &AppState,
    id: &str,
    payment_ref: &str,
    now: NaiveDateTime,
) -> Result<BookingOutcome, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        let booking = queries::get_booking(&db, id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

        if !booking.status.can_become(&BookingStatus::Confirmed) {
            return Err(AppError::InvalidTransition {
                from: booking.status.as_str(),
                to: "confirmed",
            });
        }
        if payment_ref.trim().is_empty() && !booking.total.is_zero() {
            return Err(AppError::Validation(
                "payment reference required for a non-zero total".to_string(),
            ));
        }

        queries::confirm_booking(&db, id, payment_ref.trim(), now)?;
        queries::get_booking(&db, id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?
    };

    tracing::info!(booking_id = %booking.id, "booking confirmed");

    Ok(BookingOutcome {
        booking,
        warnings: vec![],
    })
}

/// {pending, confirmed} -> cancelled. The cancellation is the durable
/// fact; the cancelled notification is best-effort and carries the
/// reason and actor for downstream refund messaging.
pub async fn cancel(
    state: &AppState,
    id: &str,
    reason: &str,
    actor: Actor,
    now: NaiveDateTime,
) -> Result<BookingOutcome, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        let booking = queries::get_booking(&db, id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

        if !booking.status.can_become(&BookingStatus::Cancelled) {
            return Err(AppError::InvalidTransition {
                from: booking.status.as_str(),
                to: "cancelled",
            });
        }

        queries::cancel_booking(&db, id, reason, actor, now)?;
        queries::get_booking(&db, id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?
    };

    tracing::info!(
        booking_id = %booking.id,
        actor = actor.as_str(),
        reason,
        "booking cancelled"
    );

    let mut warnings = vec![];
    let deliveries = state
        .notifier
        .dispatch(&Notification::booking_cancelled(
            &booking,
            reason,
            actor,
            &state.config.staff_email,
        ))
        .await;
    collect_failures(&deliveries, &mut warnings);

    Ok(BookingOutcome { booking, warnings })
}

/// Admin-only field patch. A zone/date/time/duration change re-checks
/// availability against every booking except this one, exactly as create
/// does; a zone/duration/add-on/coupon change reprices.
pub async fn update(
    state: &AppState,
    id: &str,
    patch: BookingPatch,
    now: NaiveDateTime,
) -> Result<BookingOutcome, AppError> {
    let mut warnings = vec![];

    let mut db = state.db.lock().unwrap();
    let tx = db
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(AppError::Database)?;

    let current = queries::get_booking(&tx, id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    if current.status == BookingStatus::Cancelled {
        return Err(AppError::Validation(
            "cancelled bookings cannot be updated".to_string(),
        ));
    }

    let schedule_change = patch.zone.is_some()
        || patch.date.is_some()
        || patch.start.is_some()
        || patch.duration_minutes.is_some();
    let price_change = patch.zone.is_some()
        || patch.duration_minutes.is_some()
        || patch.add_ons.is_some()
        || patch.coupon_code.is_some();

    let mut updated = current.clone();
    if let Some(z) = patch.zone {
        let zone = zone::find(&z)
            .ok_or_else(|| AppError::Validation(format!("unknown zone: {z}")))?;
        updated.zone = zone.id.to_string();
    }
    if let Some(date) = patch.date {
        updated.date = date;
    }
    if let Some(start) = patch.start {
        updated.start = start;
    }
    if let Some(duration) = patch.duration_minutes {
        if duration <= 0 {
            return Err(AppError::Validation("duration must be positive".to_string()));
        }
        updated.duration_minutes = duration;
    }
    if let Some(size) = patch.party_size {
        if size <= 0 {
            return Err(AppError::Validation(
                "party size must be at least 1".to_string(),
            ));
        }
        updated.party_size = size;
    }
    if let Some(name) = patch.customer_name {
        updated.customer_name = name;
    }
    if let Some(email) = patch.customer_email {
        if !email.contains('@') {
            return Err(AppError::Validation("invalid email address".to_string()));
        }
        updated.customer_email = email;
    }
    if let Some(phone) = patch.customer_phone {
        updated.customer_phone = Some(phone);
    }
    if let Some(add_ons) = patch.add_ons {
        updated.add_ons = add_ons;
    }
    if let Some(code) = patch.coupon_code {
        updated.coupon_code = (!code.trim().is_empty()).then(|| code.trim().to_uppercase());
    }

    if schedule_change {
        let start_min = availability::minute_of(updated.start);
        let end_min = start_min + updated.duration_minutes;
        if !availability::within_operating_hours(start_min, end_min) {
            return Err(AppError::Validation(format!(
                "outside operating hours ({}-{})",
                availability::label(availability::OPEN_MINUTE),
                availability::label(availability::CLOSE_MINUTE),
            )));
        }
        let taken = queries::day_ranges(&tx, &updated.zone, updated.date, Some(id))?;
        if availability::conflicts(&taken, start_min, end_min) {
            return Err(AppError::SlotConflict);
        }
    }

    if price_change {
        let zone = zone::find(&updated.zone)
            .ok_or_else(|| AppError::Validation(format!("unknown zone: {}", updated.zone)))?;
        let coupon_check = updated.coupon_code.as_deref().map(|code| {
            coupons::validate(state.coupons.as_ref(), code, updated.duration_minutes, now)
        });
        let applied = match coupon_check {
            Some(check) if check.valid => Some(check),
            Some(check) => {
                let reason = check
                    .rejection
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "unknown code".to_string());
                warnings.push(format!("coupon not applied: {reason}"));
                updated.coupon_code = None;
                None
            }
            None => None,
        };
        updated.total = pricing::quote(
            zone.rate_per_hour(),
            updated.duration_minutes,
            &updated.add_ons,
            applied.as_ref(),
        )
        .total;
    }

    updated.updated_at = now;
    queries::update_booking_fields(&tx, &updated)?;
    tx.commit().map_err(AppError::Database)?;

    tracing::info!(booking_id = %updated.id, "booking updated");

    Ok(BookingOutcome {
        booking: updated,
        warnings,
    })
}
