//! Lunary notification server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lunary_common::Config;
use lunary_core::{
    DeliveryDispatcher, EventDeduplicator, NotificationService, ProfileResolver, VapidConfig,
    WebPushTransport,
};
use lunary_db::repositories::{
    ProfileRepository, PushSubscriptionRepository, SentNotificationRepository,
};

mod routes;

use routes::AppState;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lunary=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting lunary notification server...");

    // Load configuration
    let config = Config::load()?;

    // Validate transport credentials before touching anything else; a
    // deployment without VAPID keys must fail here, not per event.
    let transport = WebPushTransport::new(VapidConfig {
        public_key: config.vapid.public_key.clone(),
        private_key: config.vapid.private_key.clone(),
        subject: config.vapid.subject.clone(),
    })?;

    // Connect to database
    let db = lunary_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    lunary_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories and services
    let db = Arc::new(db);
    let subscription_repo = PushSubscriptionRepository::new(Arc::clone(&db));
    let profile_repo = ProfileRepository::new(Arc::clone(&db));
    let sent_repo = SentNotificationRepository::new(Arc::clone(&db));

    let deduplicator = EventDeduplicator::new(sent_repo, config.notifications.retention_days);
    let dispatcher = DeliveryDispatcher::new(
        subscription_repo,
        ProfileResolver::new(profile_repo),
        Arc::new(transport),
        config.notifications.concurrency,
    );
    let notifications = NotificationService::new(deduplicator, dispatcher);

    let state = AppState {
        notifications,
        cron_secret: config.cron.secret.clone(),
    };
    let app = routes::router(state).layer(TraceLayer::new_for_http());

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
