//! HTTP/JSON API for the SAT preparation backend.
//!
//! Thin edge over the service layer: an axum router, an identity extractor
//! trusting an upstream proxy, and env-driven configuration. All domain
//! behavior lives below in the services and core crates.

#![forbid(unsafe_code)]

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, header::CONTENT_TYPE},
    routing::{get, post, put},
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use prep_core::Clock;
use prep_services::AppServices;

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use config::Config;
use state::AppState;

/// Build the full API router over the given state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(auth::USER_ID_HEADER)])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/auth/user", get(routes::current_user))
        .route("/api/user/progress", get(routes::user_progress))
        .route(
            "/api/practice/questions/{subject}",
            get(routes::questions_by_subject),
        )
        .route(
            "/api/practice/random/{subject}/{count}",
            get(routes::random_questions),
        )
        .route("/api/practice/session", post(routes::create_session))
        .route("/api/practice/session/{id}", put(routes::update_session))
        .route("/api/practice/sessions", get(routes::list_sessions))
        .route("/api/practice/answer", post(routes::submit_answer))
        .route("/api/user/answers", get(routes::list_answers))
        .route("/api/study-plan", post(routes::create_plan))
        .route("/api/study-plans", get(routes::list_plans))
        .route("/api/study-plan/{id}", put(routes::update_plan))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load();

    info!("Connecting to {}", config.db_url);
    let services = AppServices::new_sqlite(&config.db_url, Clock::default())
        .await
        .expect("Database misconfigured!");

    let app = router(AppState::new(services));

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .expect("Port misconfigured!");
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed!");

    info!("Server shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
