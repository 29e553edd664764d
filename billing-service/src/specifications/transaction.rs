use crate::models::Transaction;
use chrono::{DateTime, Utc};
use service_core::persistence::Specification;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionSpecification {
    WithId(Uuid),
    /// Case-insensitive substring of the description.
    DescriptionLike(String),
    /// Inclusive on both bounds.
    CreatedBetween(DateTime<Utc>, DateTime<Utc>),
}

impl Specification<Transaction> for TransactionSpecification {
    fn is_satisfied_by(&self, t: &Transaction) -> bool {
        match self {
            TransactionSpecification::WithId(id) => t.id == *id,
            TransactionSpecification::DescriptionLike(needle) => t
                .description
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            TransactionSpecification::CreatedBetween(from, to) => {
                *from <= t.created_at && t.created_at <= *to
            }
        }
    }
}
