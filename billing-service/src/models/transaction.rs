//! Ledger transaction model.

use super::Subscription;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A ledger entry. Written once when a subscription is charged, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub description: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn for_charge(id: Uuid, subscription: &Subscription, now: DateTime<Utc>) -> Self {
        Self {
            id,
            description: subscription.charge_description(),
            amount: subscription.fee,
            created_at: now,
            updated_at: now,
        }
    }
}
