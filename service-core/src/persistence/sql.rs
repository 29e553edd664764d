//! SQL predicate building blocks.
//!
//! Bindings describe their filters as a [`Condition`] tree. Rendering pushes
//! every value as a bound parameter; nothing user supplied is spliced into the
//! statement text.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// A bindable column value. `None` is SQL `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uuid(Option<Uuid>),
    Text(Option<String>),
    BigInt(Option<i64>),
    Timestamp(Option<DateTime<Utc>>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Uuid(v) => v.is_none(),
            Value::Text(v) => v.is_none(),
            Value::BigInt(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
        }
    }

    pub(crate) fn bind_to(self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Value::Uuid(v) => {
                builder.push_bind(v);
            }
            Value::Text(v) => {
                builder.push_bind(v);
            }
            Value::BigInt(v) => {
                builder.push_bind(v);
            }
            Value::Timestamp(v) => {
                builder.push_bind(v);
            }
        }
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(Some(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(Some(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(Some(v.to_string()))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(Some(v))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(Some(v))
    }
}

impl From<Option<Uuid>> for Value {
    fn from(v: Option<Uuid>) -> Self {
        Value::Uuid(v)
    }
}

impl From<Option<String>> for Value {
    fn from(v: Option<String>) -> Self {
        Value::Text(v)
    }
}

impl From<Option<i64>> for Value {
    fn from(v: Option<i64>) -> Self {
        Value::BigInt(v)
    }
}

impl From<Option<DateTime<Utc>>> for Value {
    fn from(v: Option<DateTime<Utc>>) -> Self {
        Value::Timestamp(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `col = $n`, or `col IS NULL` when the value is null.
    Eq(&'static str, Value),
    /// `col ILIKE $n` with a ready-made pattern.
    ILike(&'static str, String),
    Lt(&'static str, Value),
    LtOrEq(&'static str, Value),
    GtOrEq(&'static str, Value),
    IsNull(&'static str),
    /// `col NOT IN ($n, ...)`. Rows where `col` is NULL do not match.
    NotIn(&'static str, Vec<Value>),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    /// Inclusive on both ends.
    pub fn between(column: &'static str, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Condition::And(vec![
            Condition::GtOrEq(column, from.into()),
            Condition::LtOrEq(column, to.into()),
        ])
    }

    /// Case-insensitive substring match. LIKE wildcards in `needle` match literally.
    pub fn contains(column: &'static str, needle: &str) -> Self {
        Condition::ILike(column, format!("%{}%", escape_like(needle)))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Condition::And(items) if items.is_empty())
    }

    /// Appends ` WHERE <condition>` unless the condition is empty.
    pub fn push_where(self, builder: &mut QueryBuilder<'_, Postgres>) {
        if self.is_empty() {
            return;
        }
        builder.push(" WHERE ");
        self.push_to(builder);
    }

    pub fn push_to(self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Condition::Eq(column, value) if value.is_null() => {
                builder.push(column).push(" IS NULL");
            }
            Condition::Eq(column, value) => push_comparison(builder, column, "=", value),
            Condition::ILike(column, pattern) => {
                builder.push(column).push(" ILIKE ").push_bind(pattern);
            }
            Condition::Lt(column, value) => push_comparison(builder, column, "<", value),
            Condition::LtOrEq(column, value) => push_comparison(builder, column, "<=", value),
            Condition::GtOrEq(column, value) => push_comparison(builder, column, ">=", value),
            Condition::IsNull(column) => {
                builder.push(column).push(" IS NULL");
            }
            Condition::NotIn(_, values) if values.is_empty() => {
                builder.push("TRUE");
            }
            Condition::NotIn(column, values) => {
                builder.push(column).push(" NOT IN (");
                for (i, value) in values.into_iter().enumerate() {
                    if i > 0 {
                        builder.push(", ");
                    }
                    value.bind_to(builder);
                }
                builder.push(")");
            }
            Condition::And(items) => push_group(builder, items, " AND ", "TRUE"),
            Condition::Or(items) => push_group(builder, items, " OR ", "FALSE"),
        }
    }

    /// Statement text the condition renders to, placeholders included.
    pub fn to_sql(&self) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("");
        self.clone().push_to(&mut builder);
        builder.sql().to_string()
    }
}

fn push_comparison(
    builder: &mut QueryBuilder<'_, Postgres>,
    column: &'static str,
    operator: &str,
    value: Value,
) {
    builder.push(column).push(" ").push(operator).push(" ");
    value.bind_to(builder);
}

fn push_group(
    builder: &mut QueryBuilder<'_, Postgres>,
    mut items: Vec<Condition>,
    separator: &str,
    identity: &str,
) {
    match items.len() {
        0 => {
            builder.push(identity);
        }
        1 => {
            if let Some(item) = items.pop() {
                item.push_to(builder);
            }
        }
        _ => {
            builder.push("(");
            for (i, item) in items.into_iter().enumerate() {
                if i > 0 {
                    builder.push(separator);
                }
                item.push_to(builder);
            }
            builder.push(")");
        }
    }
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
