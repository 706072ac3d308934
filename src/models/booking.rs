use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
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
    pub total: Decimal,
    pub payment_ref: Option<String>,
    pub status: BookingStatus,
    pub cancel_reason: Option<String>,
    pub cancelled_by: Option<Actor>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn start_minute(&self) -> i32 {
        (self.start.hour() * 60 + self.start.minute()) as i32
    }

    pub fn end_minute(&self) -> i32 {
        self.start_minute() + self.duration_minutes
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }

    /// Legal transitions: pending -> confirmed, pending -> cancelled,
    /// confirmed -> cancelled. Nothing leaves cancelled.
    pub fn can_become(&self, next: &BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    Customer,
    Admin,
}

impl Actor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Actor::Customer => "customer",
            Actor::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => Actor::Admin,
            _ => Actor::Customer,
        }
    }
}

/// Flat-fee extras. Fees are fixed amounts, never scaled by duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum AddOn {
    AllergySoap,
    PartyHost,
    PhotoPackage,
}

impl AddOn {
    pub fn fee(&self) -> Decimal {
        match self {
            AddOn::AllergySoap => Decimal::new(1500, 2),
            AddOn::PartyHost => Decimal::new(2500, 2),
            AddOn::PhotoPackage => Decimal::new(4000, 2),
        }
    }
}
