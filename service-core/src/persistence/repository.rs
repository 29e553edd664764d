use super::error::DbError;
use super::manager::Session;
use super::specification::{Paging, Sort};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Arguments of a multi-row read.
#[derive(Debug, Clone)]
pub struct ListArgs<S> {
    pub filters: Vec<S>,
    pub sort: Option<Sort>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl<S> Default for ListArgs<S> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort: None,
            limit: None,
            offset: None,
        }
    }
}

impl<S> ListArgs<S> {
    pub fn new(filters: Vec<S>) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sort, limit and offset as paging markers.
    pub fn paging(&self) -> Vec<Paging> {
        let mut paging = Vec::with_capacity(3);
        if let Some(sort) = &self.sort {
            paging.push(Paging::Sort(sort.clone()));
        }
        if let Some(limit) = self.limit {
            paging.push(Paging::Limit(limit));
        }
        if let Some(offset) = self.offset {
            paging.push(Paging::Offset(offset));
        }
        paging
    }
}

/// Forward-only stream of entities.
///
/// A database-backed cursor keeps its connection (or its session's
/// transaction) until it is exhausted, closed or dropped.
pub struct Cursor<E> {
    inner: BoxStream<'static, Result<E, DbError>>,
}

impl<E: Send + 'static> Cursor<E> {
    pub fn new<St>(stream: St) -> Self
    where
        St: Stream<Item = Result<E, DbError>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    pub fn from_vec(items: Vec<E>) -> Self {
        Self::new(stream::iter(items.into_iter().map(Ok)))
    }

    pub async fn next(&mut self) -> Option<Result<E, DbError>> {
        self.inner.next().await
    }

    /// Releases the underlying connection before the stream is exhausted.
    pub fn close(self) {}
}

impl<E> Stream for Cursor<E> {
    type Item = Result<E, DbError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Specification-driven persistence for one entity type.
///
/// Read operations combine the specifications with logical AND; an empty list
/// matches every row. Errors are never translated.
#[async_trait]
pub trait Repository<E, S>: Send + Sync
where
    E: Send + Sync + 'static,
    S: Send + Sync + 'static,
{
    /// Inserts the entity, or overwrites every non-key column of the row with the same key.
    async fn save(&self, session: &Session, entity: &E) -> Result<(), DbError>;

    /// First matching entity, or `None` when nothing matches.
    async fn get(&self, session: &Session, specs: &[S]) -> Result<Option<E>, DbError>;

    async fn exist(&self, session: &Session, specs: &[S]) -> Result<bool, DbError>;

    /// Removes every matching row. Matching nothing is not an error.
    async fn delete(&self, session: &Session, specs: &[S]) -> Result<(), DbError>;

    async fn list(&self, session: &Session, args: &ListArgs<S>) -> Result<Vec<E>, DbError>;

    async fn each(&self, session: &Session, args: &ListArgs<S>) -> Result<Cursor<E>, DbError>;

    async fn size(&self, session: &Session, specs: &[S]) -> Result<u64, DbError>;
}
