//! Configuration module for billing-service.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Upper bound on a single unit of work.
    pub transaction_timeout: Option<Duration>,
}

impl BillingConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. `DATABASE_URL` wins; without it the
    /// URL is assembled from `DATABASE_USERNAME`, `DATABASE_PASSWORD`,
    /// `DATABASE_HOST`, `DATABASE_PORT`, `DATABASE_NAME` and `DATABASE_SSLMODE`.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => database_url_from_parts(&lookup)?,
        };

        Ok(Self {
            common,
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| "billing-service".to_string()),
            service_version: lookup("SERVICE_VERSION")
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            database: DatabaseConfig {
                url,
                max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: lookup("DATABASE_MIN_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
                transaction_timeout: lookup("TRANSACTION_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_secs),
            },
        })
    }
}

fn database_url_from_parts<F>(lookup: &F) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let host = lookup("DATABASE_HOST").ok_or_else(|| {
        AppError::ConfigError(anyhow::anyhow!(
            "DATABASE_URL or DATABASE_HOST is required"
        ))
    })?;
    let name = lookup("DATABASE_NAME")
        .ok_or_else(|| AppError::ConfigError(anyhow::anyhow!("DATABASE_NAME is required")))?;
    let port = lookup("DATABASE_PORT").unwrap_or_else(|| "5432".to_string());
    let sslmode = lookup("DATABASE_SSLMODE").unwrap_or_else(|| "disable".to_string());

    let credentials = match (lookup("DATABASE_USERNAME"), lookup("DATABASE_PASSWORD")) {
        (Some(user), Some(password)) => format!("{}:{}@", user, password),
        (Some(user), None) => format!("{}@", user),
        _ => String::new(),
    };

    Ok(format!(
        "postgres://{}{}:{}/{}?sslmode={}",
        credentials, host, port, name, sslmode
    ))
}
