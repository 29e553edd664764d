//! One repository implementation for every entity.
//!
//! An entity opts in by implementing [`Binding`]: its table, columns, primary
//! key, row type, row/entity mappers and the translation of its specification
//! enum into a [`Condition`]. [`PostgresRepository`] does the rest.

use super::error::DbError;
use super::manager::{DatabaseManager, Session};
use super::repository::{Cursor, ListArgs, Repository};
use super::specification::Paging;
use super::sql::{Condition, Value};
use crate::observability::DB_QUERY_DURATION;
use async_stream::try_stream;
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Postgres, QueryBuilder};
use std::marker::PhantomData;
use tracing::{instrument, warn};

pub trait Binding: Send + Sync + 'static {
    type Entity: Send + Sync + 'static;
    type Specification: Send + Sync + 'static;
    type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static;

    const TABLE: &'static str;
    const PRIMARY_KEY: &'static str;
    /// Every persisted column, primary key included, in `values` order.
    const COLUMNS: &'static [&'static str];

    /// AND of the conditions for each specification.
    fn filter(specs: &[Self::Specification]) -> Condition;

    fn scan(row: &PgRow) -> Result<Self::Row, sqlx::Error> {
        Self::Row::from_row(row)
    }

    fn to_row(entity: &Self::Entity) -> Self::Row;

    fn to_entity(row: Self::Row) -> Self::Entity;

    fn values(row: Self::Row) -> Vec<Value>;
}

/// Statement prefixes derived once from a binding.
#[derive(Debug, Clone)]
struct Statements {
    select: String,
    insert: String,
    upsert: String,
    delete: String,
    count: String,
    exist: String,
}

impl Statements {
    fn for_binding<B: Binding>() -> Self {
        let columns = B::COLUMNS.join(", ");
        let updates = B::COLUMNS
            .iter()
            .filter(|column| **column != B::PRIMARY_KEY)
            .map(|column| format!("{column} = excluded.{column}"))
            .collect::<Vec<_>>()
            .join(", ");
        let upsert = if updates.is_empty() {
            format!("ON CONFLICT ({}) DO NOTHING", B::PRIMARY_KEY)
        } else {
            format!("ON CONFLICT ({}) DO UPDATE SET {}", B::PRIMARY_KEY, updates)
        };

        Self {
            select: format!("SELECT {} FROM {}", columns, B::TABLE),
            insert: format!("INSERT INTO {} ({}) VALUES (", B::TABLE, columns),
            upsert,
            delete: format!("DELETE FROM {}", B::TABLE),
            count: format!("SELECT COUNT(*) FROM {}", B::TABLE),
            exist: format!("SELECT EXISTS(SELECT 1 FROM {}", B::TABLE),
        }
    }

    fn save<B: Binding>(&self, entity: &B::Entity) -> QueryBuilder<'static, Postgres> {
        let values = B::values(B::to_row(entity));
        debug_assert_eq!(values.len(), B::COLUMNS.len());

        let mut builder = QueryBuilder::new(self.insert.clone());
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            value.bind_to(&mut builder);
        }
        builder.push(") ").push(&self.upsert);
        builder
    }

    fn select<B: Binding>(
        &self,
        specs: &[B::Specification],
        paging: &[Paging],
    ) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(self.select.clone());
        B::filter(specs).push_where(&mut builder);
        push_order_by::<B>(&mut builder, paging);
        DatabaseManager::paginate(&mut builder, paging);
        builder
    }

    fn filtered<B: Binding>(
        prefix: &str,
        specs: &[B::Specification],
    ) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(prefix.to_string());
        B::filter(specs).push_where(&mut builder);
        builder
    }

    fn exist<B: Binding>(&self, specs: &[B::Specification]) -> QueryBuilder<'static, Postgres> {
        let mut builder = Self::filtered::<B>(&self.exist, specs);
        builder.push(")");
        builder
    }
}

/// Columns outside the binding's column list are dropped, so a caller-chosen
/// sort key never reaches the statement text.
fn push_order_by<B: Binding>(builder: &mut QueryBuilder<'static, Postgres>, paging: &[Paging]) {
    let mut first = true;
    for marker in paging {
        let Paging::Sort(sort) = marker else {
            continue;
        };
        if !B::COLUMNS.contains(&sort.column.as_str()) {
            warn!(table = B::TABLE, column = %sort.column, "Ignoring sort on unknown column");
            continue;
        }
        builder.push(if first { " ORDER BY " } else { ", " });
        builder.push(&sort.column).push(" ").push(sort.order.as_str());
        first = false;
    }
}

pub struct PostgresRepository<B: Binding> {
    db: DatabaseManager,
    statements: Statements,
    _binding: PhantomData<fn() -> B>,
}

impl<B: Binding> Clone for PostgresRepository<B> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            statements: self.statements.clone(),
            _binding: PhantomData,
        }
    }
}

impl<B: Binding> PostgresRepository<B> {
    pub fn new(db: DatabaseManager) -> Self {
        Self {
            db,
            statements: Statements::for_binding::<B>(),
            _binding: PhantomData,
        }
    }

    fn map_row(row: &PgRow) -> Result<B::Entity, DbError> {
        Ok(B::to_entity(B::scan(row)?))
    }
}

#[async_trait]
impl<B: Binding> Repository<B::Entity, B::Specification> for PostgresRepository<B> {
    #[instrument(skip_all, fields(table = B::TABLE))]
    async fn save(&self, session: &Session, entity: &B::Entity) -> Result<(), DbError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[B::TABLE, "save"])
            .start_timer();

        let mut builder = self.statements.save::<B>(entity);
        let mut conn = self.db.connection(session).await?;
        builder.build().execute(&mut *conn).await?;

        timer.observe_duration();
        Ok(())
    }

    #[instrument(skip_all, fields(table = B::TABLE))]
    async fn get(
        &self,
        session: &Session,
        specs: &[B::Specification],
    ) -> Result<Option<B::Entity>, DbError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[B::TABLE, "get"])
            .start_timer();

        let mut builder = self.statements.select::<B>(specs, &[Paging::Limit(1)]);
        let mut conn = self.db.connection(session).await?;
        let row = builder.build().fetch_optional(&mut *conn).await?;

        timer.observe_duration();
        row.as_ref().map(Self::map_row).transpose()
    }

    #[instrument(skip_all, fields(table = B::TABLE))]
    async fn exist(&self, session: &Session, specs: &[B::Specification]) -> Result<bool, DbError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[B::TABLE, "exist"])
            .start_timer();

        let mut builder = self.statements.exist::<B>(specs);
        let mut conn = self.db.connection(session).await?;
        let exists: bool = builder.build_query_scalar().fetch_one(&mut *conn).await?;

        timer.observe_duration();
        Ok(exists)
    }

    #[instrument(skip_all, fields(table = B::TABLE))]
    async fn delete(&self, session: &Session, specs: &[B::Specification]) -> Result<(), DbError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[B::TABLE, "delete"])
            .start_timer();

        let mut builder = Statements::filtered::<B>(&self.statements.delete, specs);
        let mut conn = self.db.connection(session).await?;
        builder.build().execute(&mut *conn).await?;

        timer.observe_duration();
        Ok(())
    }

    #[instrument(skip_all, fields(table = B::TABLE))]
    async fn list(
        &self,
        session: &Session,
        args: &ListArgs<B::Specification>,
    ) -> Result<Vec<B::Entity>, DbError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[B::TABLE, "list"])
            .start_timer();

        let mut builder = self.statements.select::<B>(&args.filters, &args.paging());
        let mut conn = self.db.connection(session).await?;
        let rows = builder.build().fetch_all(&mut *conn).await?;

        timer.observe_duration();
        rows.iter().map(Self::map_row).collect()
    }

    #[instrument(skip_all, fields(table = B::TABLE))]
    async fn each(
        &self,
        session: &Session,
        args: &ListArgs<B::Specification>,
    ) -> Result<Cursor<B::Entity>, DbError> {
        let mut builder = self.statements.select::<B>(&args.filters, &args.paging());
        let mut conn = self.db.connection(session).await?;

        let stream = try_stream! {
            let _timer = DB_QUERY_DURATION
                .with_label_values(&[B::TABLE, "each"])
                .start_timer();
            let mut rows = builder.build().fetch(&mut *conn);
            while let Some(row) = rows.try_next().await.map_err(DbError::from)? {
                yield Self::map_row(&row)?;
            }
        };

        Ok(Cursor::new(stream))
    }

    #[instrument(skip_all, fields(table = B::TABLE))]
    async fn size(&self, session: &Session, specs: &[B::Specification]) -> Result<u64, DbError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[B::TABLE, "size"])
            .start_timer();

        let mut builder = Statements::filtered::<B>(&self.statements.count, specs);
        let mut conn = self.db.connection(session).await?;
        let count: i64 = builder.build_query_scalar().fetch_one(&mut *conn).await?;

        timer.observe_duration();
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
