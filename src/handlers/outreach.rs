use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::services::notify::{Delivery, Notification};
use crate::state::AppState;

fn require_fields(fields: &[(&'static str, Option<&str>)]) -> Result<(), AppError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, v)| v.map(str::trim).unwrap_or("").is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// For these endpoints the notification IS the operation: there is no
/// booking-state effect behind it, so a delivery failure is the result.
fn deliveries_to_result(deliveries: Vec<Delivery>) -> Result<Json<serde_json::Value>, AppError> {
    if deliveries.iter().any(|d| !d.ok) {
        return Err(AppError::Upstream(
            "notification delivery failed".to_string(),
        ));
    }
    Ok(Json(serde_json::json!({
        "ok": true,
        "deliveries": deliveries,
    })))
}

// POST /api/waiver
#[derive(Deserialize)]
pub struct WaiverRequest {
    pub booking_id: Option<String>,
    pub signed_by: Option<String>,
}

pub async fn waiver_signed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WaiverRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_fields(&[
        ("booking_id", req.booking_id.as_deref()),
        ("signed_by", req.signed_by.as_deref()),
    ])?;

    let id = req.booking_id.as_deref().unwrap_or("");
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking(&db, id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    let notification = Notification::waiver_signed(
        &booking,
        req.signed_by.as_deref().unwrap_or(""),
        &state.config.staff_email,
    );
    let deliveries = state.notifier.dispatch(&notification).await;
    deliveries_to_result(deliveries)
}

// POST /api/contact
#[derive(Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

pub async fn contact(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContactRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_fields(&[
        ("name", req.name.as_deref()),
        ("email", req.email.as_deref()),
        ("message", req.message.as_deref()),
    ])?;

    let notification = Notification::contact(
        req.name.as_deref().unwrap_or(""),
        req.email.as_deref().unwrap_or(""),
        req.message.as_deref().unwrap_or(""),
        &state.config.staff_email,
    );
    let deliveries = state.notifier.dispatch(&notification).await;
    deliveries_to_result(deliveries)
}

// POST /api/events/request
#[derive(Deserialize)]
pub struct EventRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<String>,
    pub party_size: Option<i32>,
    pub details: Option<String>,
}

pub async fn event_request(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EventRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_fields(&[
        ("name", req.name.as_deref()),
        ("email", req.email.as_deref()),
    ])?;

    let payload = serde_json::json!({
        "name": req.name,
        "email": req.email,
        "date": req.date,
        "party_size": req.party_size,
        "details": req.details,
    });
    let notification = Notification::event_request(payload, &state.config.staff_email);
    let deliveries = state.notifier.dispatch(&notification).await;
    deliveries_to_result(deliveries)
}
