//! Application startup and wiring.

use crate::config::BillingConfig;
use crate::repositories::{subscription_repository, transaction_repository};
use crate::services::{init_metrics, Database, SubscriptionService, TransactionService};
use service_core::error::AppError;
use service_core::persistence::TransactionManager;
use service_core::utils::{SystemClock, UuidV4Generator};
use std::sync::Arc;

/// Application container holding the pool and the services built on it.
pub struct Application {
    db: Database,
    subscriptions: SubscriptionService<TransactionManager>,
    transactions: TransactionService,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: BillingConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations.
    /// Use this in tests when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: BillingConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: BillingConfig, run_migrations: bool) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;

        if run_migrations {
            db.run_migrations().await?;
        }

        let manager = db.manager();
        let subscriptions = subscription_repository(manager.clone());
        let transactions = transaction_repository(manager);

        let subscription_service = SubscriptionService::new(
            subscriptions,
            Arc::clone(&transactions),
            db.transaction_manager(config.database.transaction_timeout),
            Arc::new(SystemClock),
            Arc::new(UuidV4Generator),
        );
        let transaction_service = TransactionService::new(transactions);

        Ok(Self {
            db,
            subscriptions: subscription_service,
            transactions: transaction_service,
        })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn subscriptions(&self) -> &SubscriptionService<TransactionManager> {
        &self.subscriptions
    }

    pub fn transactions(&self) -> &TransactionService {
        &self.transactions
    }
}
