//! Executor resolution and pagination.

use super::error::DbError;
use super::specification::Paging;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnection, PgPool};
use sqlx::{Postgres, QueryBuilder, Transaction};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub(crate) type SharedTransaction = Arc<Mutex<Transaction<'static, Postgres>>>;

/// Execution carrier handed to every repository call.
///
/// A default session runs each statement on its own pooled connection. A
/// session produced by a unit of work routes every statement through that
/// unit's transaction.
#[derive(Clone, Default)]
pub struct Session {
    transaction: Option<SharedTransaction>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    pub(crate) fn with_transaction(transaction: SharedTransaction) -> Self {
        Self {
            transaction: Some(transaction),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}

/// A connection checked out for one statement or one cursor.
///
/// Holding a transaction-backed connection holds the transaction lock. Another
/// call on the same session fails with [`DbError::TransactionBusy`] until it is
/// dropped.
pub enum Connection {
    Pooled(PoolConnection<Postgres>),
    Transaction(OwnedMutexGuard<Transaction<'static, Postgres>>),
}

impl Deref for Connection {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        match self {
            Connection::Pooled(conn) => &**conn,
            Connection::Transaction(tx) => &***tx,
        }
    }
}

impl DerefMut for Connection {
    fn deref_mut(&mut self) -> &mut PgConnection {
        match self {
            Connection::Pooled(conn) => &mut **conn,
            Connection::Transaction(tx) => &mut ***tx,
        }
    }
}

#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Resolves where a statement for `session` runs: the session's transaction
    /// when it has one, a pooled connection otherwise.
    ///
    /// A transaction runs one statement at a time. While an open cursor or a
    /// concurrent call holds it, this returns [`DbError::TransactionBusy`].
    pub async fn connection(&self, session: &Session) -> Result<Connection, DbError> {
        match &session.transaction {
            Some(tx) => Arc::clone(tx)
                .try_lock_owned()
                .map(Connection::Transaction)
                .map_err(|_| DbError::TransactionBusy),
            None => Ok(Connection::Pooled(self.pool.acquire().await?)),
        }
    }

    /// Appends `LIMIT`/`OFFSET` for the paging markers. When a marker repeats the
    /// last one wins. Ordering is the repository's job; `Sort` is ignored here.
    pub fn paginate(builder: &mut QueryBuilder<'_, Postgres>, paging: &[Paging]) {
        let mut limit = None;
        let mut offset = None;
        for marker in paging {
            match marker {
                Paging::Limit(n) => limit = Some(*n),
                Paging::Offset(n) => offset = Some(*n),
                Paging::Sort(_) => {}
            }
        }

        if let Some(n) = limit {
            builder.push(" LIMIT ").push_bind(to_i64(n));
        }
        if let Some(n) = offset {
            builder.push(" OFFSET ").push_bind(to_i64(n));
        }
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
