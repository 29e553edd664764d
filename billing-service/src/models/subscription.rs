//! Subscription model.

use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recurrence of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Unset or unrecognized. Never valid on a new subscription.
    Invalid,
}

impl SubscriptionType {
    pub const RECURRING: [SubscriptionType; 4] = [
        SubscriptionType::Daily,
        SubscriptionType::Weekly,
        SubscriptionType::Monthly,
        SubscriptionType::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::Daily => "Daily",
            SubscriptionType::Weekly => "Weekly",
            SubscriptionType::Monthly => "Monthly",
            SubscriptionType::Yearly => "Yearly",
            SubscriptionType::Invalid => "Invalid",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "Daily" => SubscriptionType::Daily,
            "Weekly" => SubscriptionType::Weekly,
            "Monthly" => SubscriptionType::Monthly,
            "Yearly" => SubscriptionType::Yearly,
            _ => SubscriptionType::Invalid,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, SubscriptionType::Invalid)
    }

    /// The charge instant after `from`.
    ///
    /// Month arithmetic keeps the day of month and clamps it to the last day
    /// of a shorter month, so Jan 31 is followed by Feb 28 (or 29). Returns
    /// `None` for [`SubscriptionType::Invalid`] or on calendar overflow.
    pub fn next_due_at(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            SubscriptionType::Daily => from.checked_add_days(Days::new(1)),
            SubscriptionType::Weekly => from.checked_add_days(Days::new(7)),
            SubscriptionType::Monthly => from.checked_add_months(Months::new(1)),
            SubscriptionType::Yearly => from.checked_add_months(Months::new(12)),
            SubscriptionType::Invalid => None,
        }
    }
}

/// A recurring charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub name: String,
    /// Minor currency units.
    pub fee: i64,
    pub subscription_type: SubscriptionType,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub due_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Ended strictly before `now`. A subscription ending exactly now is still billable.
    pub fn is_ended(&self, now: DateTime<Utc>) -> bool {
        self.ended_at.is_some_and(|ended_at| ended_at < now)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at < now && !self.is_ended(now)
    }

    /// Copy of the subscription after a charge at `now`, or `None` when its
    /// type has no recurrence rule.
    pub fn charged(&self, now: DateTime<Utc>) -> Option<Subscription> {
        let due_at = self.subscription_type.next_due_at(now)?;
        Some(Subscription {
            due_at,
            updated_at: now,
            ..self.clone()
        })
    }

    pub fn charge_description(&self) -> String {
        format!(
            "Subscription fee payment for {}, amounting to {}.",
            self.name, self.fee
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
    }

    fn subscription(subscription_type: SubscriptionType) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            name: "Netflix".to_string(),
            fee: 54_000,
            subscription_type,
            started_at: at(2024, 1, 15),
            ended_at: None,
            due_at: at(2024, 2, 15),
            created_at: at(2024, 1, 15),
            updated_at: at(2024, 1, 15),
        }
    }

    #[test]
    fn test_next_due_at_per_type() {
        let from = at(2024, 2, 20);
        assert_eq!(SubscriptionType::Daily.next_due_at(from), Some(at(2024, 2, 21)));
        assert_eq!(SubscriptionType::Weekly.next_due_at(from), Some(at(2024, 2, 27)));
        assert_eq!(SubscriptionType::Monthly.next_due_at(from), Some(at(2024, 3, 20)));
        assert_eq!(SubscriptionType::Yearly.next_due_at(from), Some(at(2025, 2, 20)));
        assert_eq!(SubscriptionType::Invalid.next_due_at(from), None);
    }

    #[test]
    fn test_month_end_clamps() {
        assert_eq!(
            SubscriptionType::Monthly.next_due_at(at(2024, 1, 31)),
            Some(at(2024, 2, 29))
        );
        assert_eq!(
            SubscriptionType::Monthly.next_due_at(at(2023, 1, 31)),
            Some(at(2023, 2, 28))
        );
        assert_eq!(
            SubscriptionType::Yearly.next_due_at(at(2024, 2, 29)),
            Some(at(2025, 2, 28))
        );
    }

    #[test]
    fn test_type_names() {
        for t in SubscriptionType::RECURRING {
            assert_eq!(SubscriptionType::from_string(t.as_str()), t);
            assert!(t.is_valid());
        }
        assert_eq!(SubscriptionType::from_string("monthly"), SubscriptionType::Invalid);
        assert_eq!(SubscriptionType::from_string(""), SubscriptionType::Invalid);
        assert!(!SubscriptionType::Invalid.is_valid());
    }

    #[test]
    fn test_type_serializes_by_name() {
        let json = serde_json::to_string(&SubscriptionType::Monthly).unwrap();
        assert_eq!(json, "\"Monthly\"");
    }

    #[test]
    fn test_charged_advances_due_and_touches_updated() {
        let sub = subscription(SubscriptionType::Monthly);
        let now = at(2024, 2, 20);
        let charged = sub.charged(now).unwrap();

        assert_eq!(charged.due_at, at(2024, 3, 20));
        assert_eq!(charged.updated_at, now);
        assert_eq!(charged.created_at, sub.created_at);
        assert_eq!(charged.id, sub.id);

        assert!(subscription(SubscriptionType::Invalid).charged(now).is_none());
    }

    #[test]
    fn test_due_and_ended() {
        let now = at(2024, 2, 20);
        let mut sub = subscription(SubscriptionType::Monthly);
        assert!(sub.is_due(now));

        sub.ended_at = Some(now);
        assert!(!sub.is_ended(now));
        assert!(sub.is_due(now));

        sub.ended_at = Some(at(2024, 2, 19));
        assert!(sub.is_ended(now));
        assert!(!sub.is_due(now));

        sub.ended_at = None;
        sub.due_at = now;
        assert!(!sub.is_due(now));
    }

    #[test]
    fn test_charge_description_mentions_name_and_fee() {
        let sub = subscription(SubscriptionType::Monthly);
        assert_eq!(
            sub.charge_description(),
            "Subscription fee payment for Netflix, amounting to 54000."
        );
    }
}
