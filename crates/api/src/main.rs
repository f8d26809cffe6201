use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use register_core::checkin::{
    DayPolicy, LocationPolicy, MeetingDayPolicy, PermissiveDayPolicy, PermissiveLocationPolicy,
    RadiusLocationPolicy,
};
use register_sync::{ExternalSync, GlideConfig, GlideTables, SyncDisabled};

use register_api::config::ServerConfig;
use register_api::router::build_app_router;
use register_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "register_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = register_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    register_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    register_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- External mirror ---
    let sync: Arc<dyn ExternalSync> = if config.external_sync_enabled {
        let glide_config = GlideConfig::from_env()
            .expect("ENABLE_EXTERNAL_SYNC=true requires the GLIDE_* variables");
        let glide = GlideTables::new(glide_config).expect("Failed to build mirror HTTP client");
        tracing::info!("External sync enabled");
        Arc::new(glide)
    } else {
        tracing::info!("External sync disabled");
        Arc::new(SyncDisabled)
    };

    // --- Check-in policies ---
    let location_policy: Arc<dyn LocationPolicy> = if config.enforce_radius {
        Arc::new(RadiusLocationPolicy::default())
    } else {
        Arc::new(PermissiveLocationPolicy)
    };
    let day_policy: Arc<dyn DayPolicy> = if config.enforce_meeting_day {
        Arc::new(MeetingDayPolicy)
    } else {
        Arc::new(PermissiveDayPolicy)
    };

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        sync,
        location_policy,
        day_policy,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
