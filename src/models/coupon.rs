use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub kind: CouponKind,
    /// Percent off for `Percentage`; ignored for `Free`.
    pub discount: Decimal,
    pub description: String,
    pub min_duration_hours: Option<i32>,
    pub valid_until: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CouponKind {
    Percentage,
    Free,
}

/// Outcome of looking a code up against the registry. An unknown or
/// rejected code is a normal negative result, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct CouponCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<CouponKind>,
    pub discount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub rejection: Option<CouponRejection>,
}

impl CouponCheck {
    pub fn unknown() -> Self {
        Self {
            valid: false,
            kind: None,
            discount: Decimal::ZERO,
            description: None,
            rejection: None,
        }
    }

    pub fn rejected(rejection: CouponRejection) -> Self {
        Self {
            valid: false,
            kind: None,
            discount: Decimal::ZERO,
            description: None,
            rejection: Some(rejection),
        }
    }

    pub fn approved(coupon: &Coupon) -> Self {
        Self {
            valid: true,
            kind: Some(coupon.kind),
            discount: coupon.discount,
            description: Some(coupon.description.clone()),
            rejection: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub enum CouponRejection {
    #[serde(rename = "expired")]
    Expired,
    #[serde(rename = "insufficient duration")]
    InsufficientDuration,
}

impl std::fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CouponRejection::Expired => write!(f, "expired"),
            CouponRejection::InsufficientDuration => write!(f, "insufficient duration"),
        }
    }
}
