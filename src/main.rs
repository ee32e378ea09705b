use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::services::payments::mercado_pago::MercadoPagoProvider;
use salonbook::services::payments::PaymentProvider;
use salonbook::services::sweep;
use salonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let payments = MercadoPagoProvider::new(config.mercado_pago_access_token.clone());
    if payments.is_configured() {
        tracing::info!("online payments enabled (Mercado Pago)");
    } else {
        tracing::info!("no payment provider configured, online payments disabled");
    }

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        payments: Box::new(payments),
    });

    sweep::spawn(Arc::clone(&state));

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/services", get(handlers::catalog::list_services))
        .route("/api/employees", get(handlers::catalog::list_employees))
        .route(
            "/api/availability",
            get(handlers::availability::get_availability),
        )
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/profiles/:whatsapp", get(handlers::profiles::get_profile))
        .route(
            "/api/profiles/:whatsapp",
            put(handlers::profiles::update_profile),
        )
        .route("/webhook/payments", post(handlers::webhook::payment_webhook))
        .route("/api/admin/stats", get(handlers::admin::get_stats))
        .route("/api/admin/services", post(handlers::admin::create_service))
        .route(
            "/api/admin/services/:id",
            put(handlers::admin::update_service),
        )
        .route(
            "/api/admin/services/:id",
            delete(handlers::admin::delete_service),
        )
        .route(
            "/api/admin/employees",
            post(handlers::admin::create_employee),
        )
        .route(
            "/api/admin/employees/:id",
            put(handlers::admin::update_employee),
        )
        .route(
            "/api/admin/employees/:id",
            delete(handlers::admin::delete_employee),
        )
        .route(
            "/api/admin/employees/:id/services",
            put(handlers::admin::set_employee_services),
        )
        .route("/api/admin/hours", get(handlers::admin::get_hours))
        .route(
            "/api/admin/hours/:weekday",
            put(handlers::admin::update_hours),
        )
        .route(
            "/api/admin/appointments",
            get(handlers::admin::list_appointments),
        )
        .route(
            "/api/admin/appointments",
            post(handlers::admin::create_appointment),
        )
        .route(
            "/api/admin/appointments/:id",
            get(handlers::admin::get_appointment),
        )
        .route(
            "/api/admin/appointments/:id",
            put(handlers::admin::update_appointment),
        )
        .route(
            "/api/admin/appointments/:id",
            delete(handlers::admin::delete_appointment),
        )
        .route(
            "/api/admin/appointments/:id/status",
            post(handlers::admin::set_appointment_status),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
