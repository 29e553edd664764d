//! Billing Service entry point.
//!
//! Runs one pass over every due subscription and exits. Schedule it externally.

use billing_service::config::BillingConfig;
use billing_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load configuration
    let config = BillingConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    // Initialize tracing
    init_tracing(
        &config.service_name,
        &config.common.log_level,
        config.common.log_format,
    );

    tracing::info!(
        version = %config.service_version,
        db_max_connections = %config.database.max_connections,
        db_min_connections = %config.database.min_connections,
        "Starting billing-service charge run"
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to build application");
        std::io::Error::other(format!("Application build error: {}", e))
    })?;

    app.db().health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        std::io::Error::other(format!("Health check error: {}", e))
    })?;

    let result = app.subscriptions().charge_subscriptions().await.map_err(|e| {
        tracing::error!(error = %e, "Charge run failed");
        std::io::Error::other(format!("Charge run error: {}", e))
    })?;

    tracing::info!(
        processed = result.processed,
        charged = result.charged,
        failed = result.failed,
        "Service shutdown complete"
    );
    Ok(())
}
