//! Maintenance entry point: initializes the database and runs the
//! on-demand recurrence sweep for every couple. The user-facing surfaces
//! live elsewhere and consume the library APIs.

use couplet::config;
use couplet::core::{admin, recurring};
use couplet::entities::CouplePair;
use couplet::errors::Result;
use dotenvy::dotenv;
use sea_orm::EntityTrait;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "couplet.toml";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (as early as possible)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = config::load_config(CONFIG_PATH)?;
    let database_url = app_config.resolved_database_url();

    // 4. Initialize database
    let db = config::database::connect(&database_url)
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&db)
        .await
        .inspect(|()| info!("Database tables ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Promote the configured admin account, if any
    if let Some(admin_username) = app_config.admin_username.as_deref() {
        admin::bootstrap_admin(&db, admin_username).await?;
    }

    // 6. Sweep due recurring transactions for every couple
    let mut total = 0;
    for pair in CouplePair::find().all(&db).await? {
        let created = recurring::process_due(&db, pair.id)
            .await
            .inspect_err(|e| error!(couple_id = pair.id, "Recurrence sweep failed: {}", e))?;
        if created > 0 {
            info!(
                couple_id = pair.id,
                created, "Materialized due recurring transactions"
            );
        }
        total += created;
    }
    info!(total, "Recurrence sweep complete.");

    Ok(())
}
