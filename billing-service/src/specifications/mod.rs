//! Query predicates for billing entities.

mod subscription;
mod transaction;

pub use subscription::SubscriptionSpecification;
pub use transaction::TransactionSpecification;
