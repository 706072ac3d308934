pub mod email;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::{Actor, Booking};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Created,
    Cancelled,
    WaiverSigned,
    Contact,
    EventRequest,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Cancelled => "cancelled",
            EventKind::WaiverSigned => "waiver-signed",
            EventKind::Contact => "contact",
            EventKind::EventRequest => "event-request",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub kind: EventKind,
    pub recipients: Vec<String>,
    pub subject: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub recipient: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Attempts delivery of one event to each recipient and reports
/// per-recipient outcomes. Never returns an error into the caller:
/// transitions this rides along with must not fail because mail did.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: &Notification) -> Vec<Delivery>;
}

fn booking_payload(booking: &Booking) -> serde_json::Value {
    serde_json::json!({
        "booking_id": booking.id,
        "zone": booking.zone,
        "date": booking.date.format("%Y-%m-%d").to_string(),
        "start_time": booking.start.format("%H:%M").to_string(),
        "duration_minutes": booking.duration_minutes,
        "party_size": booking.party_size,
        "customer_name": booking.customer_name,
        "total": booking.total,
        "status": booking.status.as_str(),
    })
}

impl Notification {
    pub fn booking_created(booking: &Booking, staff_email: &str) -> Self {
        Self {
            kind: EventKind::Created,
            recipients: vec![booking.customer_email.clone(), staff_email.to_string()],
            subject: format!("Booking received for {}", booking.date.format("%Y-%m-%d")),
            payload: booking_payload(booking),
        }
    }

    pub fn booking_cancelled(booking: &Booking, reason: &str, actor: Actor, staff_email: &str) -> Self {
        let mut payload = booking_payload(booking);
        payload["reason"] = serde_json::json!(reason);
        payload["cancelled_by"] = serde_json::json!(actor.as_str());
        Self {
            kind: EventKind::Cancelled,
            recipients: vec![booking.customer_email.clone(), staff_email.to_string()],
            subject: format!("Booking cancelled for {}", booking.date.format("%Y-%m-%d")),
            payload,
        }
    }

    pub fn waiver_signed(booking: &Booking, signed_by: &str, staff_email: &str) -> Self {
        let mut payload = booking_payload(booking);
        payload["signed_by"] = serde_json::json!(signed_by);
        Self {
            kind: EventKind::WaiverSigned,
            recipients: vec![staff_email.to_string()],
            subject: format!("Waiver signed by {signed_by}"),
            payload,
        }
    }

    pub fn contact(name: &str, email: &str, message: &str, staff_email: &str) -> Self {
        Self {
            kind: EventKind::Contact,
            recipients: vec![staff_email.to_string()],
            subject: format!("Contact form message from {name}"),
            payload: serde_json::json!({
                "name": name,
                "email": email,
                "message": message,
            }),
        }
    }

    pub fn event_request(payload: serde_json::Value, staff_email: &str) -> Self {
        Self {
            kind: EventKind::EventRequest,
            recipients: vec![staff_email.to_string()],
            subject: "Private event request".to_string(),
            payload,
        }
    }
}
