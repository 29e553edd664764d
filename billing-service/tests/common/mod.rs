//! Common test utilities for billing-service integration tests.
//!
//! In-memory repositories and unit of work for service tests, plus a
//! PostgreSQL harness (one schema per test) for repository tests.

#![allow(dead_code)]

use async_trait::async_trait;
use billing_service::models::{Subscription, SubscriptionType, Transaction};
use billing_service::repositories::{
    subscription_repository, transaction_repository, SubscriptionRepository, TransactionRepository,
};
use billing_service::services::{Database, SubscriptionService, TransactionService};
use billing_service::specifications::{SubscriptionSpecification, TransactionSpecification};
use chrono::{DateTime, TimeZone, Utc};
use service_core::persistence::{
    satisfies_all, Cursor, DatabaseManager, DbError, ListArgs, Repository, Session, Specification,
    TransactionManager, UnitOfWork,
};
use service_core::utils::{Clock, FixedClock, UuidV4Generator};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,billing_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn subscription(
    name: &str,
    subscription_type: SubscriptionType,
    due_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
) -> Subscription {
    Subscription {
        id: Uuid::new_v4(),
        name: name.to_string(),
        fee: 100_000,
        subscription_type,
        started_at: at(2024, 1, 1),
        ended_at,
        due_at,
        created_at: at(2024, 1, 1),
        updated_at: at(2024, 1, 1),
    }
}

// =========================================================================
// In-memory persistence
// =========================================================================

/// Vec-backed repository that evaluates specifications with `is_satisfied_by`.
pub struct InMemoryRepository<E, S> {
    rows: Arc<Mutex<Vec<E>>>,
    key: fn(&E) -> Uuid,
    fail_saves: Arc<AtomicBool>,
    _spec: PhantomData<fn(S)>,
}

impl<E, S> Clone for InMemoryRepository<E, S> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            key: self.key,
            fail_saves: Arc::clone(&self.fail_saves),
            _spec: PhantomData,
        }
    }
}

impl<E: Clone, S> InMemoryRepository<E, S> {
    pub fn new(key: fn(&E) -> Uuid) -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
            key,
            fail_saves: Arc::new(AtomicBool::new(false)),
            _spec: PhantomData,
        }
    }

    pub fn all(&self) -> Vec<E> {
        self.rows.lock().unwrap().clone()
    }

    pub fn insert(&self, entity: E) {
        self.rows.lock().unwrap().push(entity);
    }

    /// Makes every subsequent `save` fail until reset.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    fn snapshot(&self) -> Vec<E> {
        self.all()
    }

    fn restore(&self, rows: Vec<E>) {
        *self.rows.lock().unwrap() = rows;
    }

    fn matching(&self, specs: &[S]) -> Vec<E>
    where
        S: Specification<E>,
    {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|e| satisfies_all(specs, *e))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl<E, S> Repository<E, S> for InMemoryRepository<E, S>
where
    E: Clone + Send + Sync + 'static,
    S: Specification<E> + 'static,
{
    async fn save(&self, _session: &Session, entity: &E) -> Result<(), DbError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        let key = (self.key)(entity);
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|row| (self.key)(row) == key) {
            Some(existing) => *existing = entity.clone(),
            None => rows.push(entity.clone()),
        }
        Ok(())
    }

    async fn get(&self, _session: &Session, specs: &[S]) -> Result<Option<E>, DbError> {
        Ok(self.matching(specs).into_iter().next())
    }

    async fn exist(&self, _session: &Session, specs: &[S]) -> Result<bool, DbError> {
        Ok(!self.matching(specs).is_empty())
    }

    async fn delete(&self, _session: &Session, specs: &[S]) -> Result<(), DbError> {
        self.rows
            .lock()
            .unwrap()
            .retain(|e| !satisfies_all(specs, e));
        Ok(())
    }

    async fn list(&self, _session: &Session, args: &ListArgs<S>) -> Result<Vec<E>, DbError> {
        let offset = args.offset.unwrap_or(0) as usize;
        let limit = args.limit.map(|n| n as usize).unwrap_or(usize::MAX);
        Ok(self
            .matching(&args.filters)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn each(&self, session: &Session, args: &ListArgs<S>) -> Result<Cursor<E>, DbError> {
        Ok(Cursor::from_vec(self.list(session, args).await?))
    }

    async fn size(&self, _session: &Session, specs: &[S]) -> Result<u64, DbError> {
        Ok(self.matching(specs).len() as u64)
    }
}

pub type InMemorySubscriptions = InMemoryRepository<Subscription, SubscriptionSpecification>;
pub type InMemoryTransactions = InMemoryRepository<Transaction, TransactionSpecification>;

/// Unit of work over the in-memory stores: snapshot before, restore on error.
#[derive(Clone)]
pub struct InMemoryUnitOfWork {
    subscriptions: InMemorySubscriptions,
    transactions: InMemoryTransactions,
    pub commits: Arc<AtomicU64>,
    pub rollbacks: Arc<AtomicU64>,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn execute<T, E, F, Fut>(&self, session: &Session, work: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
        F: FnOnce(Session) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        if session.in_transaction() {
            return Err(DbError::NestedTransaction.into());
        }

        let subscriptions = self.subscriptions.snapshot();
        let transactions = self.transactions.snapshot();

        match work(Session::new()).await {
            Ok(value) => {
                self.commits.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            }
            Err(e) => {
                self.subscriptions.restore(subscriptions);
                self.transactions.restore(transactions);
                self.rollbacks.fetch_add(1, Ordering::SeqCst);
                Err(e)
            }
        }
    }
}

/// Services wired to in-memory stores and a fixed clock.
pub struct TestServices {
    pub subscriptions: InMemorySubscriptions,
    pub transactions: InMemoryTransactions,
    pub unit_of_work: InMemoryUnitOfWork,
    pub clock: Arc<FixedClock>,
    pub service: SubscriptionService<InMemoryUnitOfWork>,
    pub transaction_service: TransactionService,
}

pub fn in_memory_services(now: DateTime<Utc>) -> TestServices {
    init_tracing();

    let subscriptions: InMemorySubscriptions = InMemoryRepository::new(|s: &Subscription| s.id);
    let transactions: InMemoryTransactions = InMemoryRepository::new(|t: &Transaction| t.id);
    let unit_of_work = InMemoryUnitOfWork {
        subscriptions: subscriptions.clone(),
        transactions: transactions.clone(),
        commits: Arc::new(AtomicU64::new(0)),
        rollbacks: Arc::new(AtomicU64::new(0)),
    };
    let clock = Arc::new(FixedClock::new(now));

    let subscription_repo: SubscriptionRepository = Arc::new(subscriptions.clone());
    let transaction_repo: TransactionRepository = Arc::new(transactions.clone());

    let service = SubscriptionService::new(
        Arc::clone(&subscription_repo),
        Arc::clone(&transaction_repo),
        unit_of_work.clone(),
        Arc::clone(&clock) as Arc<dyn Clock>,
        Arc::new(UuidV4Generator),
    );
    let transaction_service = TransactionService::new(transaction_repo);

    TestServices {
        subscriptions,
        transactions,
        unit_of_work,
        clock,
        service,
        transaction_service,
    }
}

// =========================================================================
// PostgreSQL harness
// =========================================================================

// Counter for unique schema names
static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a unique schema name for test isolation.
fn unique_schema_name() -> String {
    let counter = SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("test_billing_{}_{}", std::process::id(), counter)
}

/// A migrated database whose search path points at a fresh schema.
pub struct TestDb {
    pub db: Database,
    pub manager: DatabaseManager,
    pub schema_name: String,
}

impl TestDb {
    pub async fn new() -> Self {
        init_tracing();

        let base_url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must be set to run database tests");
        let schema_name = unique_schema_name();

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(&base_url)
            .await
            .expect("Failed to connect to test database");
        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
            .execute(&pool)
            .await
            .ok();
        sqlx::query(&format!("CREATE SCHEMA {}", schema_name))
            .execute(&pool)
            .await
            .expect("Failed to create test schema");
        pool.close().await;

        // Use ? or & depending on whether URL already has query parameters
        let separator = if base_url.contains('?') { "&" } else { "?" };
        let url = format!(
            "{}{}options=-c search_path%3D{}",
            base_url, separator, schema_name
        );

        let db = Database::new(&url, 5, 1)
            .await
            .expect("Failed to create test database");
        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        Self {
            manager: db.manager(),
            db,
            schema_name,
        }
    }

    /// Subscription service on this database with a clock pinned at `now`.
    pub fn services(
        &self,
        now: DateTime<Utc>,
    ) -> (SubscriptionService<TransactionManager>, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(now));
        let service = SubscriptionService::new(
            subscription_repository(self.manager.clone()),
            transaction_repository(self.manager.clone()),
            self.db.transaction_manager(None),
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::new(UuidV4Generator),
        );
        (service, clock)
    }
}
