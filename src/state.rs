use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::coupons::CouponRegistry;
use crate::services::notify::NotificationDispatcher;
use crate::services::payment::PaymentProvider;
use crate::services::session::SessionManager;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub coupons: Box<dyn CouponRegistry>,
    pub sessions: Box<dyn SessionManager>,
    pub notifier: Box<dyn NotificationDispatcher>,
    pub payments: Box<dyn PaymentProvider>,
}
