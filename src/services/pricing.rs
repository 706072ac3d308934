use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{AddOn, CouponCheck, CouponKind};

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub subtotal: Decimal,
    pub add_on_total: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Base rate times duration, plus flat add-on fees, minus the coupon.
/// A free coupon zeroes the total exactly; a percentage coupon rounds
/// half-up to two decimals and never goes negative.
pub fn quote(
    rate_per_hour: Decimal,
    duration_minutes: i32,
    add_ons: &[AddOn],
    coupon: Option<&CouponCheck>,
) -> Quote {
    let subtotal = round2(rate_per_hour * Decimal::from(duration_minutes) / Decimal::from(60));
    let add_on_total: Decimal = add_ons.iter().map(|a| a.fee()).sum();
    let pre_discount = subtotal + add_on_total;

    let (discount, total) = match coupon {
        Some(check) if check.valid => match check.kind {
            Some(CouponKind::Free) => (pre_discount, Decimal::ZERO),
            _ => {
                let discount = round2(pre_discount * check.discount / Decimal::from(100));
                let total = (pre_discount - discount).max(Decimal::ZERO);
                (discount, total)
            }
        },
        _ => (Decimal::ZERO, pre_discount),
    };

    Quote {
        subtotal,
        add_on_total,
        discount,
        total,
    }
}
