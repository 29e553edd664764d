//! Subscription use-cases and the charge engine.

use crate::errors::SubscriptionError;
use crate::models::{Subscription, SubscriptionType, Transaction};
use crate::repositories::{SubscriptionRepository, TransactionRepository};
use crate::services::metrics::{record_charge, record_subscription_operation};
use crate::services::pagination::{PaginationParams, PaginationResult};
use crate::specifications::SubscriptionSpecification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use service_core::persistence::{DbError, ListArgs, Session, Sort, UnitOfWork};
use service_core::utils::{Clock, IdGenerator};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriptionParams {
    pub name: String,
    pub fee: i64,
    pub subscription_type: SubscriptionType,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// First charge instant. Defaults to one period after `started_at`.
    pub due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetSubscriptionParams {
    pub id: Uuid,
}

/// Optional filters for listing. A date range applies only when both bounds are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSubscriptionsParams {
    pub name_like: Option<String>,
    pub type_is: Option<SubscriptionType>,
    pub started_from: Option<DateTime<Utc>>,
    pub started_to: Option<DateTime<Utc>>,
    pub ended_from: Option<DateTime<Utc>>,
    pub ended_to: Option<DateTime<Utc>>,
    pub due_from: Option<DateTime<Utc>>,
    pub due_to: Option<DateTime<Utc>>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub pagination: PaginationParams,
}

impl ListSubscriptionsParams {
    pub fn specifications(&self) -> Vec<SubscriptionSpecification> {
        let mut specs = Vec::new();
        if let Some(name) = &self.name_like {
            specs.push(SubscriptionSpecification::NameLike(name.clone()));
        }
        if let Some(t) = self.type_is {
            specs.push(SubscriptionSpecification::TypeIs(t));
        }
        if let (Some(from), Some(to)) = (self.started_from, self.started_to) {
            specs.push(SubscriptionSpecification::StartedBetween(from, to));
        }
        if let (Some(from), Some(to)) = (self.ended_from, self.ended_to) {
            specs.push(SubscriptionSpecification::EndedBetween(from, to));
        }
        if let (Some(from), Some(to)) = (self.due_from, self.due_to) {
            specs.push(SubscriptionSpecification::DueBetween(from, to));
        }
        if let (Some(from), Some(to)) = (self.created_from, self.created_to) {
            specs.push(SubscriptionSpecification::CreatedBetween(from, to));
        }
        specs
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListSubscriptionsResult {
    pub subscriptions: Vec<Subscription>,
    pub pagination: PaginationResult,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CancelSubscriptionParams {
    pub id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChargeSubscriptionParams {
    pub id: Uuid,
}

/// Outcome counts of one charge-all pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChargeSubscriptionsResult {
    pub processed: u64,
    pub charged: u64,
    pub failed: u64,
}

pub struct SubscriptionService<U> {
    subscriptions: SubscriptionRepository,
    transactions: TransactionRepository,
    unit_of_work: U,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl<U: UnitOfWork> SubscriptionService<U> {
    pub fn new(
        subscriptions: SubscriptionRepository,
        transactions: TransactionRepository,
        unit_of_work: U,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            subscriptions,
            transactions,
            unit_of_work,
            clock,
            ids,
        }
    }

    #[instrument(skip(self, params), fields(name = %params.name))]
    pub async fn create_subscription(
        &self,
        params: CreateSubscriptionParams,
    ) -> Result<Subscription, AppError> {
        if !params.subscription_type.is_valid() {
            record_subscription_operation("create", "invalid");
            return Err(SubscriptionError::InvalidType.into());
        }

        let due_at = match params.due_at {
            Some(due_at) => due_at,
            None => params
                .subscription_type
                .next_due_at(params.started_at)
                .ok_or(SubscriptionError::InvalidType)?,
        };

        let session = Session::new();
        let taken = self
            .subscriptions
            .exist(
                &session,
                &[SubscriptionSpecification::NameIs(params.name.clone())],
            )
            .await?;
        if taken {
            record_subscription_operation("create", "duplicate");
            return Err(SubscriptionError::AlreadyExists.into());
        }

        let now = self.clock.now();
        let subscription = Subscription {
            id: self.ids.generate(),
            name: params.name,
            fee: params.fee,
            subscription_type: params.subscription_type,
            started_at: params.started_at,
            ended_at: params.ended_at,
            due_at,
            created_at: now,
            updated_at: now,
        };

        // A concurrent create can take the name between the check and the insert.
        if let Err(e) = self.subscriptions.save(&session, &subscription).await {
            if e.is_unique_violation() {
                record_subscription_operation("create", "duplicate");
                return Err(SubscriptionError::AlreadyExists.into());
            }
            return Err(e.into());
        }

        record_subscription_operation("create", "success");
        info!(subscription_id = %subscription.id, due_at = %subscription.due_at, "Subscription created");

        Ok(subscription)
    }

    #[instrument(skip(self), fields(subscription_id = %params.id))]
    pub async fn get_subscription(
        &self,
        params: GetSubscriptionParams,
    ) -> Result<Subscription, AppError> {
        self.find(&Session::new(), params.id).await
    }

    #[instrument(skip(self, params))]
    pub async fn list_subscriptions(
        &self,
        params: ListSubscriptionsParams,
    ) -> Result<ListSubscriptionsResult, AppError> {
        let pagination = params.pagination.normalize();
        let specs = params.specifications();
        let session = Session::new();

        let size = self.subscriptions.size(&session, &specs).await?;
        let args = ListArgs::new(specs)
            .with_sort(Sort::asc("created_at"))
            .with_limit(pagination.limit())
            .with_offset(pagination.offset());
        let subscriptions = self.subscriptions.list(&session, &args).await?;

        Ok(ListSubscriptionsResult {
            subscriptions,
            pagination: PaginationResult::new(pagination, size),
        })
    }

    #[instrument(skip(self), fields(subscription_id = %params.id))]
    pub async fn cancel_subscription(&self, params: CancelSubscriptionParams) -> Result<(), AppError> {
        let session = Session::new();
        let subscription = self.find(&session, params.id).await?;

        self.subscriptions
            .delete(
                &session,
                &[SubscriptionSpecification::WithId(subscription.id)],
            )
            .await?;

        record_subscription_operation("cancel", "success");
        info!("Subscription cancelled");
        Ok(())
    }

    /// Charges one subscription regardless of its due date.
    #[instrument(skip(self), fields(subscription_id = %params.id))]
    pub async fn charge_subscription(
        &self,
        params: ChargeSubscriptionParams,
    ) -> Result<Subscription, AppError> {
        let subscription = self.find(&Session::new(), params.id).await?;

        match self.charge(&subscription).await {
            Ok(charged) => {
                record_charge("single", "success");
                Ok(charged)
            }
            Err(e) => {
                record_charge("single", "failure");
                Err(e)
            }
        }
    }

    /// Charges every subscription that is past due and not ended, one at a time.
    /// A subscription that fails is logged and skipped.
    #[instrument(skip(self))]
    pub async fn charge_subscriptions(&self) -> Result<ChargeSubscriptionsResult, AppError> {
        let now = self.clock.now();
        let args = ListArgs::new(vec![
            SubscriptionSpecification::DueBefore(now),
            SubscriptionSpecification::NotEnded(now),
        ]);
        let mut due = self.subscriptions.each(&Session::new(), &args).await?;

        let mut result = ChargeSubscriptionsResult::default();
        while let Some(item) = due.next().await {
            result.processed += 1;

            let subscription = match item {
                Ok(subscription) => subscription,
                Err(e) => {
                    result.failed += 1;
                    record_charge("batch", "failure");
                    warn!(error = %e, "Failed to read due subscription, skipping");
                    continue;
                }
            };

            match self.charge(&subscription).await {
                Ok(charged) => {
                    result.charged += 1;
                    record_charge("batch", "success");
                    info!(
                        subscription_id = %charged.id,
                        due_at = %charged.due_at,
                        "Subscription charged"
                    );
                }
                Err(e) => {
                    result.failed += 1;
                    record_charge("batch", "failure");
                    warn!(
                        subscription_id = %subscription.id,
                        error = %e,
                        "Failed to charge subscription, skipping"
                    );
                }
            }
        }

        info!(
            processed = result.processed,
            charged = result.charged,
            failed = result.failed,
            "Charge run completed"
        );

        Ok(result)
    }

    async fn find(&self, session: &Session, id: Uuid) -> Result<Subscription, AppError> {
        self.subscriptions
            .get(session, &[SubscriptionSpecification::WithId(id)])
            .await?
            .ok_or_else(|| SubscriptionError::NotFound.into())
    }

    /// Advances the due date and appends the ledger entry in one unit of work.
    async fn charge(&self, subscription: &Subscription) -> Result<Subscription, AppError> {
        let now = self.clock.now();
        let charged = subscription
            .charged(now)
            .ok_or(SubscriptionError::InvalidType)?;
        let entry = Transaction::for_charge(self.ids.generate(), &charged, now);

        let subscriptions = Arc::clone(&self.subscriptions);
        let transactions = Arc::clone(&self.transactions);
        let updated = charged.clone();

        self.unit_of_work
            .execute(&Session::new(), move |session| async move {
                subscriptions.save(&session, &updated).await?;
                transactions.save(&session, &entry).await?;
                Ok::<(), DbError>(())
            })
            .await
            .map_err(|e| {
                AppError::InternalError(anyhow::Error::new(e).context("failed to charge subscription"))
            })?;

        Ok(charged)
    }
}
