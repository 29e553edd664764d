//! Declarative query intent.
//!
//! Entity-specific predicates are closed enums implementing [`Specification`];
//! pagination and ordering are shared by every entity and live in [`Paging`].

use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Pagination markers understood by every repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paging {
    Limit(u64),
    Offset(u64),
    Sort(Sort),
}

/// A predicate over an entity.
///
/// `is_satisfied_by` is the in-memory meaning of the predicate. Repository
/// bindings translate the same predicate to SQL and must agree with it.
pub trait Specification<E>: Debug + Send + Sync {
    fn is_satisfied_by(&self, entity: &E) -> bool;
}

/// Logical AND over a list of specifications. An empty list matches everything.
pub fn satisfies_all<E, S: Specification<E>>(specs: &[S], entity: &E) -> bool {
    specs.iter().all(|spec| spec.is_satisfied_by(entity))
}
