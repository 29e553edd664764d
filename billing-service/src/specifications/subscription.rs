use crate::models::{Subscription, SubscriptionType};
use chrono::{DateTime, Days, NaiveTime, TimeDelta, Utc};
use service_core::persistence::Specification;
use uuid::Uuid;

/// Predicates over subscriptions. A list of them is combined with AND.
///
/// Every `*Between` variant is inclusive on both bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionSpecification {
    WithId(Uuid),
    /// Case-insensitive substring of the name.
    NameLike(String),
    NameIs(String),
    TypeIs(SubscriptionType),
    CreatedBetween(DateTime<Utc>, DateTime<Utc>),
    UpdatedBetween(DateTime<Utc>, DateTime<Utc>),
    StartedBetween(DateTime<Utc>, DateTime<Utc>),
    /// Never matches a subscription without an end.
    EndedBetween(DateTime<Utc>, DateTime<Utc>),
    DueBetween(DateTime<Utc>, DateTime<Utc>),
    /// Due strictly before the instant.
    DueBefore(DateTime<Utc>),
    /// No end, or an end at or after the instant.
    NotEnded(DateTime<Utc>),
}

impl SubscriptionSpecification {
    /// Due at any point of the UTC day containing `day`.
    pub fn due_in(day: DateTime<Utc>) -> Self {
        let start = day.date_naive().and_time(NaiveTime::MIN).and_utc();
        let end = start
            .checked_add_days(Days::new(1))
            .map(|next| next - TimeDelta::microseconds(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        SubscriptionSpecification::DueBetween(start, end)
    }
}

fn within(value: DateTime<Utc>, from: &DateTime<Utc>, to: &DateTime<Utc>) -> bool {
    *from <= value && value <= *to
}

impl Specification<Subscription> for SubscriptionSpecification {
    fn is_satisfied_by(&self, s: &Subscription) -> bool {
        match self {
            SubscriptionSpecification::WithId(id) => s.id == *id,
            SubscriptionSpecification::NameLike(needle) => s
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            SubscriptionSpecification::NameIs(name) => s.name == *name,
            SubscriptionSpecification::TypeIs(t) => s.subscription_type == *t,
            SubscriptionSpecification::CreatedBetween(from, to) => within(s.created_at, from, to),
            SubscriptionSpecification::UpdatedBetween(from, to) => within(s.updated_at, from, to),
            SubscriptionSpecification::StartedBetween(from, to) => within(s.started_at, from, to),
            SubscriptionSpecification::EndedBetween(from, to) => {
                s.ended_at.is_some_and(|ended_at| within(ended_at, from, to))
            }
            SubscriptionSpecification::DueBetween(from, to) => within(s.due_at, from, to),
            SubscriptionSpecification::DueBefore(now) => s.due_at < *now,
            SubscriptionSpecification::NotEnded(now) => {
                s.ended_at.is_none_or(|ended_at| ended_at >= *now)
            }
        }
    }
}
