use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_username: String,
    pub admin_password: String,
    pub session_secret: String,
    pub staff_email: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub payment_api_url: String,
    pub payment_api_key: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "splashbook.db".to_string()),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "changeme".to_string()),
            session_secret: env::var("SESSION_SECRET")
                .unwrap_or_else(|_| "dev-session-secret".to_string()),
            staff_email: env::var("STAFF_EMAIL")
                .unwrap_or_else(|_| "bookings@splashbook.local".to_string()),
            mail_api_url: env::var("MAIL_API_URL").unwrap_or_default(),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            payment_api_url: env::var("PAYMENT_API_URL").unwrap_or_default(),
            payment_api_key: env::var("PAYMENT_API_KEY").unwrap_or_default(),
        }
    }
}
