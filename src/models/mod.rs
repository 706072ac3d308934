pub mod booking;
pub mod coupon;
pub mod zone;

pub use booking::{Actor, AddOn, Booking, BookingStatus};
pub use coupon::{Coupon, CouponCheck, CouponKind, CouponRejection};
pub use zone::Zone;
