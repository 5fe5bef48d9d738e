//! Stockflow worker
//!
//! Periodically scans every organization for products that reached their
//! reorder point and logs the recommended orders.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stockflow_backend::config::LogFormat;
use stockflow_backend::services::{InventoryService, ReplenishmentService};
use stockflow_backend::{AppResult, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    config.validate()?;

    init_tracing(config.logging.format);

    tracing::info!("Starting Stockflow worker");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    let state = AppState {
        db: db_pool,
        config: Arc::new(config),
    };

    let mut interval =
        tokio::time::interval(Duration::from_secs(state.config.planning.scan_interval_secs));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(err) = run_scan(&state).await {
                    tracing::error!(code = err.code(), error = %err, "replenishment scan failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    state.db.close().await;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stockflow_worker=debug,stockflow_backend=debug,sqlx=warn".into());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

/// One pass over every organization
async fn run_scan(state: &AppState) -> AppResult<()> {
    let replenishment = ReplenishmentService::new(state.db.clone(), state.config.planning.clone());
    let inventory = InventoryService::new(state.db.clone());
    let today = Utc::now().date_naive();

    for organization_id in replenishment.active_organizations().await? {
        let summary = inventory.summary(organization_id).await?;
        tracing::info!(
            %organization_id,
            total = summary.total,
            needs_reorder = summary.needs_reorder,
            overstocked = summary.overstocked,
            "stock status"
        );

        let plans = replenishment.scan(organization_id, today).await?;
        for plan in plans.iter().filter(|plan| plan.order.is_some()) {
            tracing::info!(
                %organization_id,
                product_id = %plan.product_id,
                status = %plan.status,
                quantity = plan.order.as_ref().map(|o| o.recommended_quantity),
                "order recommended"
            );
        }
    }

    Ok(())
}
