//! Test utilities for SQL emission validation.
//!
//! Narrowed from the teacher's eight-dialect version down to the two this
//! crate targets: every compiled statement is round-tripped through
//! `sqlparser`'s dialect parser as a syntactic sanity check.

use sqlparser::dialect::{MySqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use super::dialect::Dialect;

/// Validates that a SQL string is syntactically valid for the given dialect.
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
    };

    Parser::parse_sql(&*parser_dialect, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid SQL for {:?}: {}\nSQL: {}", dialect, e, sql))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_well_formed_select() {
        validate_sql("SELECT * FROM users", Dialect::Sqlite).unwrap();
        validate_sql("SELECT * FROM users", Dialect::MySql).unwrap();
    }

    #[test]
    fn rejects_malformed_sql() {
        let result = validate_sql("SELEC * FORM users", Dialect::Sqlite);
        assert!(result.is_err());
    }

    #[test]
    fn validates_named_placeholder_forms() {
        validate_sql(
            r#"SELECT "users"."id" FROM "users" WHERE "users"."id" = :p0"#,
            Dialect::Sqlite,
        )
        .unwrap();
    }
}
