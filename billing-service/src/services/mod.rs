//! Services module for billing-service.

pub mod database;
pub mod metrics;
pub mod pagination;
pub mod subscription;
pub mod transaction;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics, record_charge, record_subscription_operation};
pub use pagination::{PaginationParams, PaginationResult};
pub use subscription::{
    CancelSubscriptionParams, ChargeSubscriptionParams, ChargeSubscriptionsResult,
    CreateSubscriptionParams, GetSubscriptionParams, ListSubscriptionsParams,
    ListSubscriptionsResult, SubscriptionService,
};
pub use transaction::{
    GetTransactionParams, ListTransactionsParams, ListTransactionsResult, TransactionService,
};
