use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use servicedesk_api::config::ServerConfig;
use servicedesk_api::router::build_app_router;
use servicedesk_api::state::AppState;
use servicedesk_core::notify::Notifier;
use servicedesk_core::store::TicketStore;
use servicedesk_db::PgTicketStore;
use servicedesk_events::{EmailConfig, EmailDelivery, EventBus, EventLogger, EventNotifier};
use servicedesk_lifecycle::ServiceDesk;
use servicedesk_worker::{JobConfig, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "servicedesk_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");
    let job_config = JobConfig::from_env();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = servicedesk_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    servicedesk_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    servicedesk_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Event bus and notifications ---
    let event_bus = Arc::new(EventBus::default());
    let logger_handle = tokio::spawn(EventLogger::run(event_bus.subscribe()));

    let mut notifier = EventNotifier::new(Arc::clone(&event_bus));
    match EmailConfig::from_env() {
        Some(email) => {
            tracing::info!(smtp_host = %email.smtp_host, "Email delivery enabled");
            notifier = notifier.with_email(EmailDelivery::new(email));
        }
        None => tracing::info!("SMTP_HOST not set, email delivery disabled"),
    }

    // --- Lifecycle services and jobs ---
    let store: Arc<dyn TicketStore> = Arc::new(PgTicketStore::new(pool));
    let notifier: Arc<dyn Notifier> = Arc::new(notifier);
    let desk = ServiceDesk::new(Arc::clone(&store), notifier, job_config.settings());

    let jobs_enabled = job_config.enabled;
    let scheduler = Arc::new(JobScheduler::new(desk.clone(), job_config));
    let jobs_cancel = CancellationToken::new();
    let job_handles = if jobs_enabled {
        let handles = scheduler.spawn(jobs_cancel.clone());
        tracing::info!(jobs = handles.len(), "Job scheduler started");
        handles
    } else {
        tracing::info!("JOBS_ENABLED is false, periodic jobs not started");
        Vec::new()
    };

    // --- App state ---
    let state = AppState {
        store,
        desk,
        scheduler,
        config: Arc::new(config.clone()),
    };
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

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let grace = Duration::from_secs(config.shutdown_timeout_secs);

    jobs_cancel.cancel();
    for handle in job_handles {
        let _ = tokio::time::timeout(grace, handle).await;
    }
    tracing::info!("Job loops stopped");

    // Dropping the last bus sender closes the channel and ends the logger.
    drop(event_bus);
    let _ = tokio::time::timeout(grace, logger_handle).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or, on Unix, SIGTERM.
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
