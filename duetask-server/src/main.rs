//! duetask server: WebSocket chat gateway plus daily digest scheduler.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:8080 with the digest at 09:00
//! cargo run --bin duetask-server
//!
//! # Custom address and digest time
//! cargo run --bin duetask-server -- --bind 127.0.0.1:9000 --reminder-time 07:30
//!
//! # Or via environment variable
//! DUETASK_ADDR=127.0.0.1:9000 cargo run --bin duetask-server
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use duetask::bot::Bot;
use duetask::clock::{Clock, SystemClock};
use duetask::conversation::Controller;
use duetask::reminder::ReminderScheduler;
use duetask::session::SessionStore;
use duetask::tasks::TaskStore;
use duetask_server::config::{ServerCliArgs, ServerConfig};
use duetask_server::gateway::WsGateway;
use duetask_server::server;
use tokio::sync::watch;
use tracing_appender::non_blocking::WorkerGuard;

/// How long open connections get to close after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let _guard = init_logging(&config.log_level, config.log_file.as_deref());

    tracing::info!(
        addr = %config.bind_addr,
        reminder_time = %config.reminder_time,
        "starting duetask server"
    );

    let store = Arc::new(TaskStore::new());
    let sessions = Arc::new(SessionStore::new());
    let gateway = Arc::new(WsGateway::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let controller = Controller::new(Arc::clone(&store), Arc::clone(&clock), config.names.clone());
    let bot = Arc::new(Bot::new(controller, Arc::clone(&sessions), Arc::clone(&gateway)));
    let scheduler = ReminderScheduler::new(store, sessions, Arc::clone(&gateway), clock, config.names)
        .at(config.reminder_time);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reminder = tokio::spawn(scheduler.run(shutdown_rx.clone()));

    let (bound_addr, server) =
        match server::start_server_with_state(&config.bind_addr, bot, shutdown_rx).await {
            Ok(started) => started,
            Err(e) => {
                tracing::error!(error = %e, "failed to start server");
                std::process::exit(1);
            }
        };
    tracing::info!(addr = %bound_addr, "server listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown requested");

    let _ = shutdown_tx.send(true);
    gateway.close_all_connections().await;

    if let Err(e) = reminder.await {
        tracing::error!(error = %e, "reminder task failed");
    }
    match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "server task failed"),
        Err(_) => tracing::warn!("connections still open after grace period, exiting"),
    }
    tracing::info!("duetask server stopped");
}

/// Initialize tracing.
///
/// With a log file, writes through a non-blocking appender and returns the
/// [`WorkerGuard`] that must be held until shutdown so buffered entries are
/// flushed. Otherwise logs to stderr.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let Some((log_path, file_name)) = file_path.and_then(|p| Some((p, p.file_name()?))) else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
        return None;
    };

    let log_dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
