//! Specification-driven persistence on Postgres.
//!
//! Callers describe what they want as a list of specification values, and a
//! [`PostgresRepository`] turns them into SQL for any entity that implements
//! [`Binding`]. Statements run on a pooled connection or, inside a
//! [`UnitOfWork`], on the unit's transaction; the [`Session`] passed to every
//! call decides which.

pub mod error;
pub mod manager;
pub mod postgres;
pub mod repository;
pub mod specification;
pub mod sql;
pub mod transaction;

pub use error::DbError;
pub use manager::{Connection, DatabaseManager, Session};
pub use postgres::{Binding, PostgresRepository};
pub use repository::{Cursor, ListArgs, Repository};
pub use specification::{Paging, Sort, SortOrder, Specification, satisfies_all};
pub use sql::{Condition, Value};
pub use transaction::{TransactionManager, UnitOfWork};
