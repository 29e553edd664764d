//! Domain models for billing-service.

mod subscription;
mod transaction;

pub use subscription::{Subscription, SubscriptionType};
pub use transaction::Transaction;
