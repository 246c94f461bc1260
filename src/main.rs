//! Gatherly service daemon
//!
//! Loads configuration, connects to the database and keeps the lifecycle
//! sweep running until shutdown. The HTTP boundary is hosted elsewhere;
//! this process owns the time-driven state transitions.

use std::sync::Arc;

use tracing::info;

use gatherly::config::Settings;
use gatherly::database::{connection, DatabaseService};
use gatherly::services::ServiceFactory;
use gatherly::utils::clock::SystemClock;
use gatherly::utils::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard must outlive the runtime
    let _guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", gatherly::info());

    // Initialize database connection
    info!("Connecting to database...");
    let pool_config = connection::PoolConfig::from_settings(&settings.database);
    let pool = connection::create_pool(&pool_config).await?;

    // Run database migrations
    connection::run_migrations(&pool).await?;

    // Initialize stores and services
    let database = DatabaseService::new(pool);
    let services = ServiceFactory::new(
        settings.clone(),
        database.user_store(),
        database.event_store(),
        database.participant_store(),
        Arc::new(SystemClock),
    )?;

    // Start the periodic lifecycle sweep
    info!(
        interval_secs = settings.lifecycle.sweep_interval_secs,
        "Starting lifecycle sweeper"
    );
    let sweeper = services.event_service.spawn_sweeper();

    // Run until interrupted
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping sweeper");
    sweeper.abort();

    info!("Gatherly has been shut down.");
    Ok(())
}
