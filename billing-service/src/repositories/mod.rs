//! Postgres bindings for billing entities.

mod subscription;
mod transaction;

pub use subscription::{SubscriptionBinding, SubscriptionRow};
pub use transaction::{TransactionBinding, TransactionRow};

use crate::models::{Subscription, Transaction};
use crate::specifications::{SubscriptionSpecification, TransactionSpecification};
use service_core::persistence::{DatabaseManager, PostgresRepository, Repository};
use std::sync::Arc;

pub type SubscriptionRepository = Arc<dyn Repository<Subscription, SubscriptionSpecification>>;
pub type TransactionRepository = Arc<dyn Repository<Transaction, TransactionSpecification>>;

pub fn subscription_repository(db: DatabaseManager) -> SubscriptionRepository {
    Arc::new(PostgresRepository::<SubscriptionBinding>::new(db))
}

pub fn transaction_repository(db: DatabaseManager) -> TransactionRepository {
    Arc::new(PostgresRepository::<TransactionBinding>::new(db))
}
