use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::models::{Coupon, CouponCheck, CouponKind, CouponRejection};

/// Lookup table for promotional codes. The built-in implementation is a
/// process-wide constant; swapping in a store-backed one must not touch
/// the validation logic below.
pub trait CouponRegistry: Send + Sync {
    /// `code` is already canonical (trimmed, upper-case).
    fn find(&self, code: &str) -> Option<&Coupon>;
}

pub struct StaticRegistry {
    coupons: Vec<Coupon>,
}

impl StaticRegistry {
    pub fn builtin() -> Self {
        Self {
            coupons: vec![
                Coupon {
                    code: "CANADADAY".to_string(),
                    kind: CouponKind::Percentage,
                    discount: Decimal::from(50),
                    description: "Canada Day special: 50% off parties of 2 hours or more"
                        .to_string(),
                    min_duration_hours: Some(2),
                    valid_until: chrono::NaiveDate::from_ymd_opt(2025, 6, 1),
                },
                Coupon {
                    code: "SPLASH10".to_string(),
                    kind: CouponKind::Percentage,
                    discount: Decimal::from(10),
                    description: "10% off any booking".to_string(),
                    min_duration_hours: None,
                    valid_until: None,
                },
                Coupon {
                    code: "SOAKED25".to_string(),
                    kind: CouponKind::Percentage,
                    discount: Decimal::from(25),
                    description: "Summer soak: 25% off".to_string(),
                    min_duration_hours: None,
                    valid_until: chrono::NaiveDate::from_ymd_opt(2025, 9, 1),
                },
                Coupon {
                    code: "FOAMFREE".to_string(),
                    kind: CouponKind::Free,
                    discount: Decimal::from(100),
                    description: "Free foam party, on the house".to_string(),
                    min_duration_hours: Some(1),
                    valid_until: None,
                },
            ],
        }
    }
}

impl CouponRegistry for StaticRegistry {
    fn find(&self, code: &str) -> Option<&Coupon> {
        self.coupons.iter().find(|c| c.code == code)
    }
}

/// Validate a code for a booking of the given length. Expiry is judged
/// against the caller's `now` (venue-local), at 23:59:59 on the last valid
/// day, so the result is never cached across requests.
pub fn validate(
    registry: &dyn CouponRegistry,
    code: &str,
    duration_minutes: i32,
    now: NaiveDateTime,
) -> CouponCheck {
    let canonical = code.trim().to_uppercase();

    let coupon = match registry.find(&canonical) {
        Some(c) => c,
        None => return CouponCheck::unknown(),
    };

    if let Some(last_day) = coupon.valid_until {
        if let Some(cutoff) = last_day.and_hms_opt(23, 59, 59) {
            if now > cutoff {
                return CouponCheck::rejected(CouponRejection::Expired);
            }
        }
    }

    if let Some(min_hours) = coupon.min_duration_hours {
        if duration_minutes < min_hours * 60 {
            return CouponCheck::rejected(CouponRejection::InsufficientDuration);
        }
    }

    CouponCheck::approved(coupon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn registry() -> StaticRegistry {
        StaticRegistry::builtin()
    }

    #[test]
    fn test_unknown_code() {
        let check = validate(&registry(), "NOSUCHCODE", 120, dt("2025-05-01 12:00"));
        assert!(!check.valid);
        assert_eq!(check.discount, Decimal::ZERO);
        assert!(check.rejection.is_none());
    }

    #[test]
    fn test_code_is_canonicalized() {
        let check = validate(&registry(), "  splash10 ", 60, dt("2025-05-01 12:00"));
        assert!(check.valid);
        assert_eq!(check.discount, Decimal::from(10));
    }

    #[test]
    fn test_valid_before_expiry() {
        let check = validate(&registry(), "CANADADAY", 120, dt("2025-05-15 12:00"));
        assert!(check.valid);
        assert_eq!(check.kind, Some(CouponKind::Percentage));
        assert_eq!(check.discount, Decimal::from(50));
    }

    #[test]
    fn test_valid_on_last_day() {
        let check = validate(&registry(), "CANADADAY", 120, dt("2025-06-01 23:59"));
        assert!(check.valid);
    }

    #[test]
    fn test_expired_after_last_day() {
        let check = validate(&registry(), "CANADADAY", 120, dt("2025-06-02 00:00"));
        assert!(!check.valid);
        assert_eq!(check.rejection, Some(CouponRejection::Expired));
    }

    #[test]
    fn test_insufficient_duration() {
        let check = validate(&registry(), "CANADADAY", 60, dt("2025-05-15 12:00"));
        assert!(!check.valid);
        assert_eq!(check.rejection, Some(CouponRejection::InsufficientDuration));
    }

    #[test]
    fn test_expiry_checked_before_duration() {
        // An expired code reports expired even if the duration is also short.
        let check = validate(&registry(), "CANADADAY", 60, dt("2026-01-01 12:00"));
        assert_eq!(check.rejection, Some(CouponRejection::Expired));
    }

    #[test]
    fn test_free_coupon() {
        let check = validate(&registry(), "FOAMFREE", 60, dt("2025-05-15 12:00"));
        assert!(check.valid);
        assert_eq!(check.kind, Some(CouponKind::Free));
    }

    #[test]
    fn test_free_coupon_min_duration() {
        let check = validate(&registry(), "FOAMFREE", 30, dt("2025-05-15 12:00"));
        assert_eq!(check.rejection, Some(CouponRejection::InsufficientDuration));
    }
}
