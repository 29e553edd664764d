//! Subscription use-case tests over in-memory persistence.

mod common;

use billing_service::errors::{subscription_error, SubscriptionError};
use billing_service::models::SubscriptionType;
use billing_service::services::{
    CancelSubscriptionParams, ChargeSubscriptionParams, CreateSubscriptionParams,
    GetSubscriptionParams, ListSubscriptionsParams, PaginationParams,
};
use common::{at, in_memory_services, subscription};
use service_core::error::AppError;
use uuid::Uuid;

fn create_params(name: &str, subscription_type: SubscriptionType) -> CreateSubscriptionParams {
    CreateSubscriptionParams {
        name: name.to_string(),
        fee: 186_000,
        subscription_type,
        started_at: at(2024, 1, 15),
        ended_at: None,
        due_at: None,
    }
}

#[tokio::test]
async fn create_computes_first_due_date_from_start() {
    let t = in_memory_services(at(2024, 1, 15));

    let created = t
        .service
        .create_subscription(create_params("Netflix", SubscriptionType::Monthly))
        .await
        .unwrap();

    assert_eq!(created.due_at, at(2024, 2, 15));
    assert_eq!(created.created_at, at(2024, 1, 15));
    assert_eq!(created.updated_at, at(2024, 1, 15));
    assert_eq!(t.subscriptions.all(), vec![created]);
}

#[tokio::test]
async fn create_keeps_explicit_due_date() {
    let t = in_memory_services(at(2024, 1, 15));
    let mut params = create_params("Spotify", SubscriptionType::Weekly);
    params.due_at = Some(at(2024, 1, 20));

    let created = t.service.create_subscription(params).await.unwrap();
    assert_eq!(created.due_at, at(2024, 1, 20));
}

#[tokio::test]
async fn create_rejects_invalid_type() {
    let t = in_memory_services(at(2024, 1, 15));

    let err = t
        .service
        .create_subscription(create_params("Netflix", SubscriptionType::Invalid))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(subscription_error(&err), Some(SubscriptionError::InvalidType));
    assert!(t.subscriptions.all().is_empty());
}

#[tokio::test]
async fn create_rejects_duplicate_name() {
    let t = in_memory_services(at(2024, 1, 15));
    t.service
        .create_subscription(create_params("Netflix", SubscriptionType::Monthly))
        .await
        .unwrap();

    let err = t
        .service
        .create_subscription(create_params("Netflix", SubscriptionType::Yearly))
        .await
        .unwrap_err();

    assert_eq!(subscription_error(&err), Some(SubscriptionError::AlreadyExists));
    assert_eq!(err.status_code().as_u16(), 422);
    assert_eq!(t.subscriptions.all().len(), 1);
}

#[tokio::test]
async fn get_returns_not_found_for_unknown_id() {
    let t = in_memory_services(at(2024, 1, 15));

    let err = t
        .service
        .get_subscription(GetSubscriptionParams { id: Uuid::new_v4() })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(subscription_error(&err), Some(SubscriptionError::NotFound));
}

#[tokio::test]
async fn cancel_removes_subscription() {
    let t = in_memory_services(at(2024, 1, 15));
    let created = t
        .service
        .create_subscription(create_params("Netflix", SubscriptionType::Monthly))
        .await
        .unwrap();

    t.service
        .cancel_subscription(CancelSubscriptionParams { id: created.id })
        .await
        .unwrap();
    assert!(t.subscriptions.all().is_empty());

    let err = t
        .service
        .cancel_subscription(CancelSubscriptionParams { id: created.id })
        .await
        .unwrap_err();
    assert_eq!(subscription_error(&err), Some(SubscriptionError::NotFound));
}

#[tokio::test]
async fn list_filters_and_paginates() {
    let t = in_memory_services(at(2024, 1, 15));
    for name in ["Netflix", "Netflix Kids", "Spotify", "YouTube Premium", "Netflix 4K"] {
        t.subscriptions
            .insert(subscription(name, SubscriptionType::Monthly, at(2024, 2, 1), None));
    }

    let page = t
        .service
        .list_subscriptions(ListSubscriptionsParams {
            name_like: Some("netflix".to_string()),
            pagination: PaginationParams::new(1, 2),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.subscriptions.len(), 2);
    assert_eq!(page.pagination.size, 3);
    assert_eq!(page.pagination.page_count, 2);
    assert!(page
        .subscriptions
        .iter()
        .all(|s| s.name.to_lowercase().contains("netflix")));

    let second = t
        .service
        .list_subscriptions(ListSubscriptionsParams {
            name_like: Some("netflix".to_string()),
            pagination: PaginationParams::new(2, 2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(second.subscriptions.len(), 1);
}

#[tokio::test]
async fn list_ignores_half_open_ranges() {
    let t = in_memory_services(at(2024, 1, 15));
    t.subscriptions
        .insert(subscription("Netflix", SubscriptionType::Monthly, at(2024, 2, 1), None));

    let params = ListSubscriptionsParams {
        due_from: Some(at(2030, 1, 1)),
        ..Default::default()
    };
    assert!(params.specifications().is_empty());

    let page = t.service.list_subscriptions(params).await.unwrap();
    assert_eq!(page.subscriptions.len(), 1);
}

/// Monthly subscription started 2024-01-15 and charged on 2024-02-20.
#[tokio::test]
async fn monthly_subscription_charge_scenario() {
    let t = in_memory_services(at(2024, 1, 15));
    let created = t
        .service
        .create_subscription(create_params("Netflix", SubscriptionType::Monthly))
        .await
        .unwrap();
    assert_eq!(created.due_at, at(2024, 2, 15));

    t.clock.set(at(2024, 2, 20));
    let charged = t
        .service
        .charge_subscription(ChargeSubscriptionParams { id: created.id })
        .await
        .unwrap();

    assert_eq!(charged.due_at, at(2024, 3, 20));
    assert_eq!(charged.updated_at, at(2024, 2, 20));

    let stored = t
        .service
        .get_subscription(GetSubscriptionParams { id: created.id })
        .await
        .unwrap();
    assert_eq!(stored, charged);

    let ledger = t.transactions.all();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].amount, created.fee);
    assert_eq!(ledger[0].created_at, at(2024, 2, 20));
    assert!(ledger[0].description.contains("Netflix"));
    assert!(ledger[0].description.contains("186000"));
}

#[tokio::test]
async fn charge_unknown_subscription_is_not_found() {
    let t = in_memory_services(at(2024, 2, 20));

    let err = t
        .service
        .charge_subscription(ChargeSubscriptionParams { id: Uuid::new_v4() })
        .await
        .unwrap_err();

    assert_eq!(subscription_error(&err), Some(SubscriptionError::NotFound));
    assert!(t.transactions.all().is_empty());
}
