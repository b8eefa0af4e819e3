//! # careopsd — `CareOps` daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (`careops.toml`, environment variables)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the email and SMS senders, the credential issuer and the
//!   automation engine
//! - Build the axum router, injecting application services
//! - Run the periodic reminder sweep
//! - Bind to a TCP port and serve, shutting down on SIGTERM/SIGINT
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;
use std::time::Duration;

use careops_adapter_email_smtp::SmtpEmailSender;
use careops_adapter_http_axum::AppState;
use careops_adapter_security::JwtCredentials;
use careops_adapter_sms_twilio::TwilioSmsSender;
use careops_adapter_storage_sqlite_sqlx::SqliteStore;
use careops_app::automation_engine::AutomationEngine;
use careops_app::notifier::ChannelNotifier;
use careops_app::ports::{Notifier, Store};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let db = careops_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let store = Arc::new(SqliteStore::new(db.pool().clone()));

    // Outbound channels
    let notifier = Arc::new(
        ChannelNotifier::new(
            SmtpEmailSender::new(config.smtp()),
            TwilioSmsSender::new(config.sms()),
        )
        .with_timeout(config.notify_timeout()),
    );

    let credentials = Arc::new(JwtCredentials::new(&config.security()));
    let engine = Arc::new(AutomationEngine::new(
        Arc::clone(&store),
        Arc::clone(&notifier),
        config.automation_settings(),
    ));

    let sweeper = config
        .sweep_interval()
        .map(|period| spawn_reminder_sweep(Arc::clone(&engine), period));

    // HTTP
    let state = AppState::new(store, notifier, credentials, engine);
    let app = careops_adapter_http_axum::build(state, &config.cors.allowed_origins);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "careopsd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    tracing::info!("careopsd stopped");

    Ok(())
}

/// Run the reminder sweep every `period`, starting one period after boot.
fn spawn_reminder_sweep<S, N>(engine: Arc<AutomationEngine<S, N>>, period: Duration) -> JoinHandle<()>
where
    S: Store,
    N: Notifier,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let report = engine.run_reminder_sweep().await;
            if report.already_running {
                tracing::debug!("previous reminder sweep still running");
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
