//! Dialect-binding wrapper.
//!
//! The original implementation ties a query to a dialect through dynamic
//! attribute delegation: any builder call on the wrapper is forwarded to the
//! inner query, and any query-shaped result is re-wrapped with the same tag.
//! Rust has no such delegation story, so the six query kinds are enumerated
//! explicitly and each gets its own re-wrapping inherent methods — the
//! delegation becomes exhaustive pattern matching instead of `__getattr__`.

use crate::error::{SqlStratumError, UnsupportedDialectFeature};
use crate::sql::dialect::Dialect;
use crate::sql::dml::{DeleteQuery, InsertQuery, UpdateQuery};
use crate::sql::expr::{OrderItem, Predicate};
use crate::sql::query::{SelectQuery, SetQuery, Source};

/// Any one of the six statement kinds, carrying an explicit dialect tag.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundQuery {
    Select(SelectQuery),
    Set(SetQuery),
    Insert(InsertQuery),
    Update(UpdateQuery),
    Delete(DeleteQuery),
}

/// A query value bound to a specific dialect, preventing it from being
/// compiled against a different one by accident.
#[derive(Debug, Clone, PartialEq)]
pub struct DialectBoundQuery {
    pub query: BoundQuery,
    pub dialect: Dialect,
}

/// Anything `with_dialect` accepts: a fresh statement, or a query that is
/// already bound to a dialect. Nesting the latter is how
/// `with_dialect(with_dialect(q, Sqlite), MySql)` gets constructed at all —
/// the conflict between the two tags is then checked by `with_dialect`
/// itself via `require_same_dialect`.
pub enum Bindable {
    Fresh(BoundQuery),
    Nested(DialectBoundQuery),
}

pub fn with_dialect(
    query: impl Into<Bindable>,
    dialect: Dialect,
) -> Result<DialectBoundQuery, SqlStratumError> {
    match query.into() {
        Bindable::Fresh(query) => Ok(DialectBoundQuery { query, dialect }),
        Bindable::Nested(inner) => {
            require_same_dialect(dialect, inner.dialect)?;
            Ok(DialectBoundQuery {
                query: inner.query,
                dialect,
            })
        }
    }
}

impl From<SelectQuery> for BoundQuery {
    fn from(q: SelectQuery) -> Self {
        BoundQuery::Select(q)
    }
}

impl From<SetQuery> for BoundQuery {
    fn from(q: SetQuery) -> Self {
        BoundQuery::Set(q)
    }
}

impl From<InsertQuery> for BoundQuery {
    fn from(q: InsertQuery) -> Self {
        BoundQuery::Insert(q)
    }
}

impl From<UpdateQuery> for BoundQuery {
    fn from(q: UpdateQuery) -> Self {
        BoundQuery::Update(q)
    }
}

impl From<DeleteQuery> for BoundQuery {
    fn from(q: DeleteQuery) -> Self {
        BoundQuery::Delete(q)
    }
}

impl From<SelectQuery> for Bindable {
    fn from(q: SelectQuery) -> Self {
        Bindable::Fresh(q.into())
    }
}

impl From<SetQuery> for Bindable {
    fn from(q: SetQuery) -> Self {
        Bindable::Fresh(q.into())
    }
}

impl From<InsertQuery> for Bindable {
    fn from(q: InsertQuery) -> Self {
        Bindable::Fresh(q.into())
    }
}

impl From<UpdateQuery> for Bindable {
    fn from(q: UpdateQuery) -> Self {
        Bindable::Fresh(q.into())
    }
}

impl From<DeleteQuery> for Bindable {
    fn from(q: DeleteQuery) -> Self {
        Bindable::Fresh(q.into())
    }
}

impl From<DialectBoundQuery> for Bindable {
    fn from(q: DialectBoundQuery) -> Self {
        Bindable::Nested(q)
    }
}

impl DialectBoundQuery {
    /// Verifies `requested` agrees with the bound tag. Returns the
    /// "query bound to dialect 'X'" diagnostic otherwise.
    pub fn require(&self, requested: Dialect) -> Result<&BoundQuery, SqlStratumError> {
        if self.dialect != requested {
            return Err(SqlStratumError::UnsupportedDialectFeature(
                UnsupportedDialectFeature::new(
                    requested.to_string(),
                    format!("query bound to dialect '{}'", self.dialect),
                )
                .with_hint(format!(
                    "Compile/execute this query with dialect='{}'.",
                    self.dialect
                )),
            ));
        }
        Ok(&self.query)
    }

    /// Delegates `.where_(...)` to the inner `SelectQuery`/`SetQuery`,
    /// re-wrapping the result with the same tag.
    ///
    /// # Panics
    ///
    /// Panics if the inner query is not a `Select` — `WHERE` is not a valid
    /// operation on INSERT/UPDATE/DELETE/SET statements constructed this way.
    pub fn where_(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.query = match self.query {
            BoundQuery::Select(q) => BoundQuery::Select(q.where_(predicates)),
            other => panic!("where_ is not defined on {other:?}"),
        };
        self
    }

    pub fn join(mut self, source: impl Into<Source>, on: Predicate) -> Self {
        self.query = match self.query {
            BoundQuery::Select(q) => BoundQuery::Select(q.join(source, on)),
            other => panic!("join is not defined on {other:?}"),
        };
        self
    }

    pub fn left_join(mut self, source: impl Into<Source>, on: Predicate) -> Self {
        self.query = match self.query {
            BoundQuery::Select(q) => BoundQuery::Select(q.left_join(source, on)),
            other => panic!("left_join is not defined on {other:?}"),
        };
        self
    }

    pub fn order_by(
        self,
        items: impl IntoIterator<Item = impl Into<OrderItem>>,
    ) -> Result<Self, SqlStratumError> {
        let dialect = self.dialect;
        let query = match self.query {
            BoundQuery::Select(q) => BoundQuery::Select(q.order_by(items)?),
            BoundQuery::Set(q) => BoundQuery::Set(q.order_by(items)?),
            other => panic!("order_by is not defined on {other:?}"),
        };
        Ok(DialectBoundQuery { query, dialect })
    }

    pub fn asc(mut self) -> Self {
        self.query = match self.query {
            BoundQuery::Select(q) => BoundQuery::Select(q.asc()),
            BoundQuery::Set(q) => BoundQuery::Set(q.asc()),
            other => panic!("asc is not defined on {other:?}"),
        };
        self
    }

    pub fn desc(mut self) -> Self {
        self.query = match self.query {
            BoundQuery::Select(q) => BoundQuery::Select(q.desc()),
            BoundQuery::Set(q) => BoundQuery::Set(q.desc()),
            other => panic!("desc is not defined on {other:?}"),
        };
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.query = match self.query {
            BoundQuery::Select(q) => BoundQuery::Select(q.limit(n)),
            BoundQuery::Set(q) => BoundQuery::Set(q.limit(n)),
            other => panic!("limit is not defined on {other:?}"),
        };
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.query = match self.query {
            BoundQuery::Select(q) => BoundQuery::Select(q.offset(n)),
            BoundQuery::Set(q) => BoundQuery::Set(q.offset(n)),
            other => panic!("offset is not defined on {other:?}"),
        };
        self
    }
}

/// Double-wrapping with a conflicting tag raises "conflicting nested dialect
/// bindings" — `with_dialect(with_dialect(q, Sqlite), MySql)` is rejected the
/// moment the outer wrap is constructed. Re-wrapping with the same tag is a
/// no-op: `with_dialect(with_dialect(q, Sqlite), Sqlite)` just collapses back
/// to a single wrapper.
pub fn require_same_dialect(outer: Dialect, inner: Dialect) -> Result<(), SqlStratumError> {
    if outer != inner {
        return Err(SqlStratumError::UnsupportedDialectFeature(
            UnsupportedDialectFeature::new(
                outer.to_string(),
                format!("conflicting nested dialect bindings ('{outer}' and '{inner}')"),
            )
            .with_hint("Use a single dialect wrapper for a query."),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::meta::{Table, ValueType};
    use crate::sql::query::select;

    fn users() -> Table {
        Table::new(
            "users",
            vec![("id", ValueType::Int), ("email", ValueType::Text)],
        )
    }

    #[test]
    fn require_rejects_mismatched_dialect() {
        let bound = with_dialect(
            select(vec![users().col("id").into_expr()]).from_(users()),
            Dialect::Sqlite,
        )
        .unwrap();
        let err = bound.require(Dialect::MySql).unwrap_err();
        match err {
            SqlStratumError::UnsupportedDialectFeature(f) => {
                assert!(f.feature.contains("query bound to dialect 'sqlite'"));
            }
            _ => panic!("expected UnsupportedDialectFeature"),
        }
    }

    #[test]
    fn chained_methods_preserve_dialect_tag() {
        let bound = with_dialect(
            select(vec![users().col("id").into_expr()]).from_(users()),
            Dialect::Sqlite,
        )
        .unwrap()
        .where_(vec![users().col("id").into_expr().eq(1i64)])
        .limit(10);
        assert_eq!(bound.dialect, Dialect::Sqlite);
        match bound.query {
            BoundQuery::Select(q) => assert_eq!(q.limit, Some(10)),
            _ => panic!("expected Select"),
        }
    }

    #[test]
    fn require_same_dialect_detects_conflict() {
        let err = require_same_dialect(Dialect::Sqlite, Dialect::MySql).unwrap_err();
        match err {
            SqlStratumError::UnsupportedDialectFeature(f) => {
                assert!(f.feature.contains("conflicting nested dialect bindings"));
            }
            _ => panic!("expected UnsupportedDialectFeature"),
        }
    }

    #[test]
    fn nested_same_wrapper_is_allowed() {
        let once = with_dialect(
            select(vec![users().col("id").into_expr()]).from_(users()),
            Dialect::Sqlite,
        )
        .unwrap();
        let twice = with_dialect(once, Dialect::Sqlite).unwrap();
        assert_eq!(twice.dialect, Dialect::Sqlite);
        match twice.query {
            BoundQuery::Select(_) => {}
            _ => panic!("expected Select"),
        }
    }

    #[test]
    fn nested_conflicting_wrapper_raises() {
        let inner = with_dialect(
            select(vec![users().col("id").into_expr()]).from_(users()),
            Dialect::MySql,
        )
        .unwrap();
        let err = with_dialect(inner, Dialect::Sqlite).unwrap_err();
        match err {
            SqlStratumError::UnsupportedDialectFeature(f) => {
                assert!(f.feature.contains("conflicting nested dialect bindings"));
                assert!(f.feature.contains("'sqlite'"));
                assert!(f.feature.contains("'mysql'"));
            }
            _ => panic!("expected UnsupportedDialectFeature"),
        }
    }
}
