use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::booking::{
    duration_to_minutes, local_now, parse_date, parse_time, BookingResponse, OutcomeResponse,
};
use crate::models::{Actor, AddOn};
use crate::services::booking::{self, BookingPatch};
use crate::services::session::Claims;
use crate::state::AppState;

/// Pulls the bearer token out of the request and verifies it. A missing
/// credential and a bad one are distinct failures internally; both come
/// back to the client as 401.
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<Claims, AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("").trim();
    if token.is_empty() {
        return Err(AppError::Unauthenticated);
    }

    state.sessions.verify(token, local_now())
}

// POST /api/admin/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: i64,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let issued = state.sessions.issue(
        req.username.as_deref().unwrap_or(""),
        req.password.as_deref().unwrap_or(""),
        local_now(),
    )?;

    tracing::info!("admin session issued");

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

// GET /api/admin/session
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Claims>, AppError> {
    let claims = require_admin(&state, &headers)?;
    Ok(Json(claims))
}

// POST /api/admin/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;
    // Tokens are stateless; revocation is the client discarding its copy.
    Ok(Json(serde_json::json!({
        "ok": true,
        "instruction": "discard the session token",
    })))
}

// GET /api/admin/status
#[derive(Serialize)]
pub struct StatusResponse {
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, AppError> {
    require_admin(&state, &headers)?;

    let counts = {
        let db = state.db.lock().unwrap();
        queries::booking_counts(&db)?
    };

    Ok(Json(StatusResponse {
        pending: counts.pending,
        confirmed: counts.confirmed,
        cancelled: counts.cancelled,
    }))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    require_admin(&state, &headers)?;

    let limit = query.limit.unwrap_or(50);
    let bookings = {
        let db = state.db.lock().unwrap();
        queries::list_bookings(&db, query.status.as_deref(), limit)?
    };

    Ok(Json(bookings.iter().map(BookingResponse::from).collect()))
}

// POST /api/admin/bookings/:id/cancel
#[derive(Deserialize)]
pub struct AdminCancelRequest {
    pub reason: Option<String>,
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<AdminCancelRequest>,
) -> Result<Json<OutcomeResponse>, AppError> {
    require_admin(&state, &headers)?;

    let reason = req
        .reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| "cancelled by staff".to_string());

    let outcome = booking::cancel(&state, &id, &reason, Actor::Admin, local_now()).await?;
    Ok(Json(outcome.into()))
}

// PATCH /api/admin/bookings/:id
#[derive(Deserialize)]
pub struct UpdateBookingRequest {
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

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookingRequest>,
) -> Result<Json<OutcomeResponse>, AppError> {
    require_admin(&state, &headers)?;

    let patch = BookingPatch {
        zone: req.zone,
        date: req.date.as_deref().map(parse_date).transpose()?,
        start: req.start_time.as_deref().map(parse_time).transpose()?,
        duration_minutes: req.duration_hours.map(duration_to_minutes).transpose()?,
        party_size: req.party_size,
        customer_name: req.name,
        customer_email: req.email,
        customer_phone: req.phone,
        add_ons: req.add_ons,
        coupon_code: req.coupon_code,
    };

    let outcome = booking::update(&state, &id, patch, local_now()).await?;
    Ok(Json(outcome.into()))
}
