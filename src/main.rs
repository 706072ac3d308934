use std::sync::{Arc, Mutex};

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use splashbook::config::AppConfig;
use splashbook::db;
use splashbook::handlers;
use splashbook::services::coupons::StaticRegistry;
use splashbook::services::notify::email::HttpMailer;
use splashbook::services::payment::HttpPaymentProvider;
use splashbook::services::session::HmacSessions;
use splashbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let sessions = HmacSessions::new(
        config.session_secret.clone(),
        config.admin_username.clone(),
        config.admin_password.clone(),
    );
    let notifier = HttpMailer::new(config.mail_api_url.clone(), config.mail_api_key.clone());
    let payments = HttpPaymentProvider::new(
        config.payment_api_url.clone(),
        config.payment_api_key.clone(),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        coupons: Box::new(StaticRegistry::builtin()),
        sessions: Box::new(sessions),
        notifier: Box::new(notifier),
        payments: Box::new(payments),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/zones", get(handlers::booking::get_zones))
        .route("/api/availability", get(handlers::booking::get_availability))
        .route(
            "/api/coupons/validate",
            post(handlers::booking::validate_coupon),
        )
        .route("/api/bookings", post(handlers::booking::create_booking))
        .route("/api/bookings/:id", get(handlers::booking::get_booking))
        .route(
            "/api/bookings/:id/checkout",
            post(handlers::booking::checkout_booking),
        )
        .route(
            "/api/bookings/:id/confirm",
            post(handlers::booking::confirm_booking),
        )
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::booking::cancel_booking),
        )
        .route("/api/waiver", post(handlers::outreach::waiver_signed))
        .route("/api/contact", post(handlers::outreach::contact))
        .route("/api/events/request", post(handlers::outreach::event_request))
        .route("/api/admin/login", post(handlers::admin::login))
        .route("/api/admin/session", get(handlers::admin::get_session))
        .route("/api/admin/logout", post(handlers::admin::logout))
        .route("/api/admin/status", get(handlers::admin::get_status))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/cancel",
            post(handlers::admin::cancel_booking),
        )
        .route(
            "/api/admin/bookings/:id",
            patch(handlers::admin::update_booking),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
