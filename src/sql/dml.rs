//! `INSERT` / `UPDATE` / `DELETE` statements and their builders.
//!
//! Construction is staged the way the original DSL's monkey-patched chain
//! was staged (`INSERT(table).VALUES(...)`, `UPDATE(table).SET(...).WHERE(...)`,
//! `DELETE(table).WHERE(...)`), expressed here as a sequence of distinct
//! builder types rather than a single mutable object, so each stage's
//! required fields are enforced by the type system instead of at runtime.

use crate::sql::expr::Predicate;
use crate::sql::meta::Table;
use crate::sql::value::Value;

/// An immutable `INSERT` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertQuery {
    pub table: Table,
    pub values: Vec<(String, Value)>,
}

/// `INSERT(table)` — awaiting `.values(...)`.
pub struct InsertBuilder {
    table: Table,
}

pub fn insert(table: Table) -> InsertBuilder {
    InsertBuilder { table }
}

impl InsertBuilder {
    pub fn values(self, values: impl IntoIterator<Item = (&'static str, Value)>) -> InsertQuery {
        InsertQuery {
            table: self.table,
            values: values
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}

/// An immutable `UPDATE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQuery {
    pub table: Table,
    pub values: Vec<(String, Value)>,
    pub where_clauses: Vec<Predicate>,
}

/// `UPDATE(table)` — awaiting `.set(...)`.
pub struct UpdateBuilder {
    table: Table,
}

pub fn update(table: Table) -> UpdateBuilder {
    UpdateBuilder { table }
}

impl UpdateBuilder {
    pub fn set(self, values: impl IntoIterator<Item = (&'static str, Value)>) -> UpdateWhereBuilder {
        UpdateWhereBuilder {
            table: self.table,
            values: values
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}

/// `UPDATE(table).SET(...)` — awaiting `.where_(...)`.
pub struct UpdateWhereBuilder {
    table: Table,
    values: Vec<(String, Value)>,
}

impl UpdateWhereBuilder {
    pub fn where_(self, predicates: impl IntoIterator<Item = Predicate>) -> UpdateQuery {
        UpdateQuery {
            table: self.table,
            values: self.values,
            where_clauses: predicates.into_iter().collect(),
        }
    }
}

/// An immutable `DELETE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteQuery {
    pub table: Table,
    pub where_clauses: Vec<Predicate>,
}

/// `DELETE(table)` — awaiting `.where_(...)`.
pub struct DeleteBuilder {
    table: Table,
}

pub fn delete(table: Table) -> DeleteBuilder {
    DeleteBuilder { table }
}

impl DeleteBuilder {
    pub fn where_(self, predicates: impl IntoIterator<Item = Predicate>) -> DeleteQuery {
        DeleteQuery {
            table: self.table,
            where_clauses: predicates.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::meta::ValueType;

    fn users() -> Table {
        Table::new(
            "users",
            vec![("id", ValueType::Int), ("email", ValueType::Text)],
        )
    }

    #[test]
    fn insert_collects_column_value_pairs() {
        let q = insert(users()).values(vec![("email", Value::Text("a@b.com".into()))]);
        assert_eq!(q.values.len(), 1);
        assert_eq!(q.values[0].0, "email");
    }

    #[test]
    fn update_requires_set_then_where() {
        let q = update(users())
            .set(vec![("email", Value::Text("a@b.com".into()))])
            .where_(vec![users().col("id").into_expr().eq(1i64)]);
        assert_eq!(q.values.len(), 1);
        assert_eq!(q.where_clauses.len(), 1);
    }

    #[test]
    fn delete_requires_where() {
        let q = delete(users()).where_(vec![users().col("id").into_expr().eq(1i64)]);
        assert_eq!(q.where_clauses.len(), 1);
    }
}
