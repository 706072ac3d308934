use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{zone, Actor, AddOn, Booking};
use crate::services::{availability, booking, coupons};
use crate::state::AppState;

pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {s} (expected YYYY-MM-DD)")))
}

pub fn parse_time(s: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| AppError::Validation(format!("invalid time: {s} (expected HH:MM)")))
}

pub fn duration_to_minutes(hours: f64) -> Result<i32, AppError> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(AppError::Validation("duration must be positive".to_string()));
    }
    Ok((hours * 60.0).round() as i32)
}

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub zone: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i32,
    pub party_size: i32,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub add_ons: Vec<AddOn>,
    pub coupon_code: Option<String>,
    pub total: String,
    pub payment_ref: Option<String>,
    pub status: String,
    pub cancel_reason: Option<String>,
    pub cancelled_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Booking> for BookingResponse {
    fn from(b: &Booking) -> Self {
        let end = b.start + Duration::minutes(b.duration_minutes as i64);
        Self {
            id: b.id.clone(),
            zone: b.zone.clone(),
            date: b.date.format("%Y-%m-%d").to_string(),
            start_time: b.start.format("%H:%M").to_string(),
            end_time: end.format("%H:%M").to_string(),
            duration_minutes: b.duration_minutes,
            party_size: b.party_size,
            customer_name: b.customer_name.clone(),
            customer_email: b.customer_email.clone(),
            customer_phone: b.customer_phone.clone(),
            add_ons: b.add_ons.clone(),
            coupon_code: b.coupon_code.clone(),
            total: b.total.to_string(),
            payment_ref: b.payment_ref.clone(),
            status: b.status.as_str().to_string(),
            cancel_reason: b.cancel_reason.clone(),
            cancelled_by: b.cancelled_by.map(|a| a.as_str().to_string()),
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: b.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct OutcomeResponse {
    pub booking: BookingResponse,
    pub warnings: Vec<String>,
}

impl From<booking::BookingOutcome> for OutcomeResponse {
    fn from(outcome: booking::BookingOutcome) -> Self {
        Self {
            booking: BookingResponse::from(&outcome.booking),
            warnings: outcome.warnings,
        }
    }
}

// GET /api/zones
pub async fn get_zones() -> Json<serde_json::Value> {
    let zones: Vec<serde_json::Value> = zone::ZONES
        .iter()
        .map(|z| {
            serde_json::json!({
                "id": z.id,
                "name": z.name,
                "rate_per_hour": z.rate_per_hour(),
            })
        })
        .collect();
    Json(serde_json::json!({ "zones": zones }))
}

// GET /api/availability?zone=..&date=..
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub zone: String,
    pub date: String,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let zone = zone::find(&query.zone)
        .ok_or_else(|| AppError::Validation(format!("unknown zone: {}", query.zone)))?;
    let date = parse_date(&query.date)?;

    let slots = {
        let db = state.db.lock().unwrap();
        availability::free_slots(&db, zone.id, date)?
    };

    Ok(Json(serde_json::json!({
        "zone": zone.id,
        "date": query.date,
        "free_slots": slots,
    })))
}

// POST /api/coupons/validate
#[derive(Deserialize)]
pub struct ValidateCouponRequest {
    pub code: Option<String>,
    pub duration_hours: Option<f64>,
}

pub async fn validate_coupon(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidateCouponRequest>,
) -> Result<Json<crate::models::CouponCheck>, AppError> {
    let code = req
        .code
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::Validation("missing required fields: code".to_string()))?;
    let duration = duration_to_minutes(req.duration_hours.unwrap_or(1.0))?;

    let check = coupons::validate(state.coupons.as_ref(), code, duration, local_now());
    Ok(Json(check))
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub zone: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub duration_hours: Option<f64>,
    pub party_size: Option<i32>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub add_ons: Option<Vec<AddOn>>,
    pub coupon_code: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<OutcomeResponse>), AppError> {
    let mut missing = vec![];
    let required = [
        ("name", &req.name),
        ("email", &req.email),
        ("date", &req.date),
        ("time", &req.start_time),
        ("zone", &req.zone),
    ];
    for (field, value) in required {
        if value.as_deref().map(str::trim).unwrap_or("").is_empty() {
            missing.push(field);
        }
    }
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    let input = booking::CreateBooking {
        zone: req.zone.unwrap_or_default(),
        date: parse_date(req.date.as_deref().unwrap_or(""))?,
        start: parse_time(req.start_time.as_deref().unwrap_or(""))?,
        duration_minutes: duration_to_minutes(req.duration_hours.unwrap_or(1.0))?,
        party_size: req.party_size.unwrap_or(1),
        customer_name: req.name.unwrap_or_default(),
        customer_email: req.email.unwrap_or_default(),
        customer_phone: req.phone.filter(|p| !p.trim().is_empty()),
        add_ons: req.add_ons.unwrap_or_default(),
        coupon_code: req.coupon_code,
    };

    let outcome = booking::create(&state, input, local_now()).await?;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking(&db, &id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    Ok(Json(BookingResponse::from(&booking)))
}

// POST /api/bookings/:id/checkout
pub async fn checkout_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<crate::services::payment::PaymentAuthorization>, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking(&db, &id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    if booking.status != crate::models::BookingStatus::Pending {
        return Err(AppError::Validation(
            "only pending bookings can be checked out".to_string(),
        ));
    }

    let auth = state
        .payments
        .authorize(&booking.id, booking.total)
        .await
        .map_err(|e| {
            tracing::warn!(booking_id = %booking.id, error = %e, "payment authorization failed");
            AppError::Upstream(format!("payment authorization failed: {e}"))
        })?;

    Ok(Json(auth))
}

// POST /api/bookings/:id/confirm
#[derive(Deserialize)]
pub struct ConfirmRequest {
    pub payment_ref: Option<String>,
}

pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<OutcomeResponse>, AppError> {
    let outcome = booking::confirm(
        &state,
        &id,
        req.payment_ref.as_deref().unwrap_or(""),
        local_now(),
    )
    .await?;
    Ok(Json(outcome.into()))
}

// POST /api/bookings/:id/cancel
#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<OutcomeResponse>, AppError> {
    let reason = req
        .reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| "cancelled by customer".to_string());

    let outcome = booking::cancel(&state, &id, &reason, Actor::Customer, local_now()).await?;
    Ok(Json(outcome.into()))
}
