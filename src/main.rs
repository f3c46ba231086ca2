use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timetracker_api::clock::BlockClock;
use timetracker_api::config;
use timetracker_api::handlers;
use timetracker_api::ledger::{MemoryLedger, SessionLedger, SessionLedgerState};
use timetracker_api::notify::{MemorySink, Notifier};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "timetracker_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let app_config = config::load_config_with_fallback();

    // Wire the ledger: in-memory authoritative store, in-memory notification
    // sink for external listeners, tick counter seeded from config
    let notifier = Notifier::new(Arc::new(MemorySink::new()));
    let ledger = SessionLedger::new(Arc::new(MemoryLedger::new()), notifier);
    let clock = BlockClock::starting_at(app_config.clock.starting_height);
    let state = SessionLedgerState::new(ledger, clock);

    // Build our application with routes
    let app = Router::new()
        // Health check routes
        .route("/", get(handlers::health::health_check))
        .route("/health", get(handlers::health::health_check))
        // Session ledger routes
        .route(
            "/api/v1/sessions/start",
            post(handlers::sessions::start_session),
        )
        .route(
            "/api/v1/sessions/end",
            post(handlers::sessions::end_session),
        )
        .route(
            "/api/v1/users/:address/sessions/current",
            get(handlers::sessions::current_session),
        )
        .route(
            "/api/v1/users/:address/sessions/:session_id/duration",
            get(handlers::sessions::session_duration),
        )
        .with_state(state)
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Run the server
    let addr: SocketAddr = format!("{}:{}", app_config.server.host, app_config.server.port)
        .parse()
        .unwrap();
    tracing::info!("Starting timetracker API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
