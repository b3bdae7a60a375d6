//! Countdown Keeper - A state-managed HTTP server for countdown timers
//!
//! This is the main entry point for the countdown-keeper application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use countdown_keeper::{
    api::create_router,
    config::Config,
    manager::TimerManager,
    notifications::{LocalNotifier, NotificationGateway},
    state::AppState,
    storage::{FileStore, StorageGateway},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("countdown_keeper={},tower_http=info", config.log_level()))
        .init();

    info!("Starting countdown-keeper server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, data_dir={}, tick={}ms",
          config.host, config.port, config.data_dir.display(), config.tick_ms);

    // Storage and notification gateways
    let storage = StorageGateway::new(Arc::new(FileStore::new(&config.data_dir)));
    let notifier = Arc::new(LocalNotifier::new(!config.no_notifications));
    let notifications = NotificationGateway::new(notifier);

    let manager = TimerManager::with_tick_period(storage, notifications, config.tick_period());
    if !manager.request_notification_permission().await {
        warn!("Notifications disabled: completion and halfway alerts will only appear in-app");
    }

    // Resume countdowns that were running when the process last stopped
    let resumed = manager.load().await;
    info!("Resumed {} running timers", resumed);

    // Mirror in-app notices to the log
    let mut notices = manager.subscribe_notices();
    tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            info!("{}", notice.message);
        }
    });

    let state = Arc::new(AppState::new(manager.clone(), config.port, config.host.clone()));
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /timers                       - List timers (?category=, ?grouped=true)");
    info!("  POST   /timers                       - Create a timer");
    info!("  POST   /timers/:id/start|pause|reset - Timer commands");
    info!("  DELETE /timers/:id                   - Delete a timer");
    info!("  POST   /categories/:category/:action - Bulk start/pause/reset");
    info!("  GET    /history, /history/export     - Completed timers");
    info!("  GET    /status, /health              - Server status");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    manager.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}
