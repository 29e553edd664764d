//! All-or-nothing units of work.

use super::error::DbError;
use super::manager::Session;
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// Runs a function so that every repository call it makes through the session
/// it receives commits together or not at all.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Runs `work` inside a new transaction. `Ok` commits, `Err` rolls back and
    /// returns the error unchanged. Dropping the returned future rolls back.
    async fn execute<T, E, F, Fut>(&self, session: &Session, work: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
        F: FnOnce(Session) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static;
}

#[derive(Clone)]
pub struct TransactionManager {
    pool: PgPool,
    timeout: Option<Duration>,
}

impl TransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            timeout: None,
        }
    }

    /// Bounds how long a unit of work may run before it is abandoned and rolled back.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl UnitOfWork for TransactionManager {
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

        let tx = self.pool.begin().await.map_err(DbError::from)?;
        let handle = Arc::new(Mutex::new(tx));
        let scoped = Session::with_transaction(Arc::clone(&handle));
        debug!("Transaction started");

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, work(scoped)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout_ms = limit.as_millis() as u64, "Unit of work timed out");
                    Err(DbError::Timeout(limit).into())
                }
            },
            None => work(scoped).await,
        };

        // A session or cursor that outlived `work` still owns the transaction.
        // It rolls back when that last handle drops.
        let tx = match Arc::try_unwrap(handle) {
            Ok(tx) => tx.into_inner(),
            Err(_) => {
                warn!("Transaction still referenced after unit of work, abandoning it");
                return match outcome {
                    Err(e) => Err(e),
                    Ok(_) => Err(DbError::TransactionInUse.into()),
                };
            }
        };

        match outcome {
            Ok(value) => {
                tx.commit().await.map_err(DbError::from)?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(error = %rollback_err, "Failed to roll back transaction");
                } else {
                    debug!("Transaction rolled back");
                }
                Err(e)
            }
        }
    }
}
