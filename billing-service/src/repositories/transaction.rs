use crate::models::Transaction;
use crate::specifications::TransactionSpecification;
use chrono::{DateTime, Utc};
use service_core::persistence::{Binding, Condition, Value};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TransactionRow {
    pub id: Option<Uuid>,
    pub description: Option<String>,
    pub amount: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct TransactionBinding;

impl Binding for TransactionBinding {
    type Entity = Transaction;
    type Specification = TransactionSpecification;
    type Row = TransactionRow;

    const TABLE: &'static str = "transactions";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] =
        &["id", "description", "amount", "created_at", "updated_at"];

    fn filter(specs: &[TransactionSpecification]) -> Condition {
        Condition::And(
            specs
                .iter()
                .map(|spec| match spec {
                    TransactionSpecification::WithId(id) => Condition::Eq("id", (*id).into()),
                    TransactionSpecification::DescriptionLike(text) => {
                        Condition::contains("description", text)
                    }
                    TransactionSpecification::CreatedBetween(from, to) => {
                        Condition::between("created_at", *from, *to)
                    }
                })
                .collect(),
        )
    }

    fn to_row(t: &Transaction) -> TransactionRow {
        TransactionRow {
            id: Some(t.id),
            description: Some(t.description.clone()),
            amount: Some(t.amount),
            created_at: Some(t.created_at),
            updated_at: Some(t.updated_at),
        }
    }

    fn to_entity(row: TransactionRow) -> Transaction {
        Transaction {
            id: row.id.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            amount: row.amount.unwrap_or_default(),
            created_at: row.created_at.unwrap_or_default(),
            updated_at: row.updated_at.unwrap_or_default(),
        }
    }

    fn values(row: TransactionRow) -> Vec<Value> {
        vec![
            row.id.into(),
            row.description.into(),
            row.amount.into(),
            row.created_at.into(),
            row.updated_at.into(),
        ]
    }
}
