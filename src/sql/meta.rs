//! Named tables and typed columns.
//!
//! Columns are expression leaves that also carry a back-reference to their
//! owning table. Rather than model that as an inheritance hierarchy (or a
//! cyclic `Rc<Table>` pointer), each `Column` stores a lightweight
//! [`TableRef`] — just the table's name and alias — so the table/column graph
//! stays acyclic from an ownership standpoint. `Table` itself owns the
//! authoritative `Vec<Column>`.

use crate::sql::expr::Expr;

/// The declared type of a column's values. Purely descriptive; the compiler
/// does not use it to pick rendering behavior (see Design Notes: `is_true`
/// and `is_false` deliberately bind `TRUE`/`FALSE` regardless of the
/// underlying storage type).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    Float,
    Text,
    Bool,
}

/// A lightweight reference to the table a column belongs to, independent of
/// the `Table` value itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    /// The identifier a compiler should qualify this table's columns with:
    /// the alias if present, else the bare name.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A typed column, declared once against a [`Table`] and then reused as an
/// expression leaf throughout query construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub value_type: ValueType,
    pub table: TableRef,
}

impl Column {
    /// Identity used for equality/lookup purposes: `(table.name, table.alias,
    /// column.name)`.
    pub fn identity(&self) -> (&str, Option<&str>, &str) {
        (
            self.table.name.as_str(),
            self.table.alias.as_deref(),
            self.name.as_str(),
        )
    }

    /// Lift this column into the general expression algebra.
    pub fn into_expr(self) -> Expr {
        Expr::Column(self)
    }
}

/// A declared named table, optionally aliased, owning its column
/// declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub alias: Option<String>,
    columns: Vec<Column>,
}

impl Table {
    /// Declare a table with the given column names and types. Column order
    /// is preserved for `.columns()` but lookup by `col()` is by name.
    pub fn new(name: impl Into<String>, columns: Vec<(&str, ValueType)>) -> Self {
        let name = name.into();
        let table_ref = TableRef {
            name: name.clone(),
            alias: None,
        };
        let columns = columns
            .into_iter()
            .map(|(col_name, value_type)| Column {
                name: col_name.to_string(),
                value_type,
                table: table_ref.clone(),
            })
            .collect();
        Table {
            name,
            alias: None,
            columns,
        }
    }

    /// Returns a new table value with the same columns rebound to `alias`.
    /// The receiver is unchanged.
    pub fn alias(&self, alias: impl Into<String>) -> Table {
        let alias = alias.into();
        let table_ref = TableRef {
            name: self.name.clone(),
            alias: Some(alias.clone()),
        };
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                value_type: c.value_type,
                table: table_ref.clone(),
            })
            .collect();
        Table {
            name: self.name.clone(),
            alias: Some(alias),
            columns,
        }
    }

    /// Look up a declared column by name.
    ///
    /// # Panics
    ///
    /// Panics if no column with this name was declared on the table — this
    /// mirrors a declaration-time programmer error (referencing a column
    /// that does not exist), not a runtime data error.
    pub fn col(&self, name: &str) -> Column {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("unknown column '{name}' on table '{}'", self.name))
            .clone()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef {
            name: self.name.clone(),
            alias: self.alias.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Table {
        Table::new(
            "users",
            vec![("id", ValueType::Int), ("email", ValueType::Text)],
        )
    }

    #[test]
    fn alias_rebinds_columns_without_mutating_original() {
        let users = users();
        let aliased = users.alias("u");

        assert_eq!(users.alias, None);
        assert_eq!(users.col("id").table.alias, None);

        assert_eq!(aliased.alias, Some("u".to_string()));
        assert_eq!(aliased.col("id").table.alias, Some("u".to_string()));
        assert_eq!(aliased.col("id").table.qualifier(), "u");
    }

    #[test]
    fn column_identity_includes_table_alias() {
        let u1 = users().col("id");
        let u2 = users().alias("u").col("id");
        assert_ne!(u1.identity(), u2.identity());
    }
}
