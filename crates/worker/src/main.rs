use std::sync::Arc;
use std::time::Duration;

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

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "servicedesk_worker=debug,servicedesk_lifecycle=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = JobConfig::from_env();
    tracing::info!(
        escalation_interval_secs = config.escalation_interval.as_secs(),
        auto_close_interval_secs = config.auto_close_interval.as_secs(),
        "Loaded job configuration"
    );
    if !config.enabled {
        tracing::warn!("JOBS_ENABLED is false, worker has nothing to do");
        return;
    }

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = servicedesk_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    servicedesk_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    servicedesk_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- Notifications ---
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

    // --- Jobs ---
    let store: Arc<dyn TicketStore> = Arc::new(PgTicketStore::new(pool));
    let notifier: Arc<dyn Notifier> = Arc::new(notifier);
    let desk = ServiceDesk::new(store, notifier, config.settings());
    let scheduler = Arc::new(JobScheduler::new(desk, config));

    let cancel = CancellationToken::new();
    let handles = scheduler.spawn(cancel.clone());
    tracing::info!(jobs = handles.len(), "Worker started");

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl-C handler");
    tracing::info!("Received SIGINT (Ctrl-C), stopping job loops");

    cancel.cancel();
    for handle in handles {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    drop(scheduler);
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), logger_handle).await;
    tracing::info!("Worker stopped");
}
