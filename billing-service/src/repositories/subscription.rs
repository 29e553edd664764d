use crate::models::{Subscription, SubscriptionType};
use crate::specifications::SubscriptionSpecification;
use chrono::{DateTime, Utc};
use service_core::persistence::{Binding, Condition, Value};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored shape of a subscription. `subscription_type` is `NULL` for an invalid type.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SubscriptionRow {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub fee: Option<i64>,
    pub subscription_type: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct SubscriptionBinding;

fn type_value(t: SubscriptionType) -> Option<String> {
    t.is_valid().then(|| t.as_str().to_string())
}

/// Matches what reads back as [`SubscriptionType::Invalid`]: NULL or any unknown name.
fn invalid_type_condition() -> Condition {
    Condition::Or(vec![
        Condition::IsNull("subscription_type"),
        Condition::NotIn(
            "subscription_type",
            SubscriptionType::RECURRING
                .iter()
                .map(|t| t.as_str().into())
                .collect(),
        ),
    ])
}

impl Binding for SubscriptionBinding {
    type Entity = Subscription;
    type Specification = SubscriptionSpecification;
    type Row = SubscriptionRow;

    const TABLE: &'static str = "subscriptions";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "fee",
        "subscription_type",
        "started_at",
        "ended_at",
        "due_at",
        "created_at",
        "updated_at",
    ];

    fn filter(specs: &[SubscriptionSpecification]) -> Condition {
        Condition::And(
            specs
                .iter()
                .map(|spec| match spec {
                    SubscriptionSpecification::WithId(id) => Condition::Eq("id", (*id).into()),
                    SubscriptionSpecification::NameLike(name) => Condition::contains("name", name),
                    SubscriptionSpecification::NameIs(name) => {
                        Condition::Eq("name", name.as_str().into())
                    }
                    SubscriptionSpecification::TypeIs(SubscriptionType::Invalid) => {
                        invalid_type_condition()
                    }
                    SubscriptionSpecification::TypeIs(t) => {
                        Condition::Eq("subscription_type", type_value(*t).into())
                    }
                    SubscriptionSpecification::CreatedBetween(from, to) => {
                        Condition::between("created_at", *from, *to)
                    }
                    SubscriptionSpecification::UpdatedBetween(from, to) => {
                        Condition::between("updated_at", *from, *to)
                    }
                    SubscriptionSpecification::StartedBetween(from, to) => {
                        Condition::between("started_at", *from, *to)
                    }
                    SubscriptionSpecification::EndedBetween(from, to) => {
                        Condition::between("ended_at", *from, *to)
                    }
                    SubscriptionSpecification::DueBetween(from, to) => {
                        Condition::between("due_at", *from, *to)
                    }
                    SubscriptionSpecification::DueBefore(now) => {
                        Condition::Lt("due_at", (*now).into())
                    }
                    SubscriptionSpecification::NotEnded(now) => Condition::Or(vec![
                        Condition::GtOrEq("ended_at", (*now).into()),
                        Condition::IsNull("ended_at"),
                    ]),
                })
                .collect(),
        )
    }

    fn to_row(s: &Subscription) -> SubscriptionRow {
        SubscriptionRow {
            id: Some(s.id),
            name: Some(s.name.clone()),
            fee: Some(s.fee),
            subscription_type: type_value(s.subscription_type),
            started_at: Some(s.started_at),
            ended_at: s.ended_at,
            due_at: Some(s.due_at),
            created_at: Some(s.created_at),
            updated_at: Some(s.updated_at),
        }
    }

    fn to_entity(row: SubscriptionRow) -> Subscription {
        Subscription {
            id: row.id.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            fee: row.fee.unwrap_or_default(),
            subscription_type: row
                .subscription_type
                .as_deref()
                .map(SubscriptionType::from_string)
                .unwrap_or(SubscriptionType::Invalid),
            started_at: row.started_at.unwrap_or_default(),
            ended_at: row.ended_at,
            due_at: row.due_at.unwrap_or_default(),
            created_at: row.created_at.unwrap_or_default(),
            updated_at: row.updated_at.unwrap_or_default(),
        }
    }

    fn values(row: SubscriptionRow) -> Vec<Value> {
        vec![
            row.id.into(),
            row.name.into(),
            row.fee.into(),
            row.subscription_type.into(),
            row.started_at.into(),
            row.ended_at.into(),
            row.due_at.into(),
            row.created_at.into(),
            row.updated_at.into(),
        ]
    }
}
