//! SQL dialect definitions and capability gating.
//!
//! Only two dialects are modeled — `sqlite` and `mysql` — each implementing
//! [`SqlDialect`] with the narrow set of capability flags the compiler needs
//! to render SQL and to reject unsupported constructs with a precise
//! diagnostic, rather than the broad multi-database surface a general query
//! builder would carry.

pub mod helpers;
mod mysql;
mod sqlite;

pub use mysql::MySql;
pub use sqlite::Sqlite;

/// Per-dialect rendering rules and capability flags.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name as used in diagnostics and the dialect registry.
    fn name(&self) -> &'static str;

    /// Quote a table/column/alias identifier.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Render a single parameter placeholder for the given bound name.
    fn placeholder(&self, name: &str) -> String;

    /// Whether `RIGHT JOIN` is supported.
    fn supports_right_join(&self) -> bool;

    /// Whether `FULL JOIN` is supported.
    fn supports_full_join(&self) -> bool;

    /// Whether the SQLite-only `TOTAL()` aggregate is supported.
    fn supports_total_aggregate(&self) -> bool;

    /// Whether the SQLite-only `GROUP_CONCAT()` aggregate is supported.
    fn supports_group_concat_aggregate(&self) -> bool;

    /// Whether an `OFFSET` clause requires an accompanying `LIMIT`.
    fn requires_limit_for_offset(&self) -> bool;
}

/// The two supported dialects, selectable at compile time by name via the
/// dialect registry (see [`crate::compile`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    MySql,
}

impl Dialect {
    pub fn compiler(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Sqlite => &Sqlite,
            Dialect::MySql => &MySql,
        }
    }

    pub fn by_name(name: &str) -> Option<Dialect> {
        match name {
            "sqlite" => Some(Dialect::Sqlite),
            "mysql" => Some(Dialect::MySql),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.compiler().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_name_recognizes_both_dialects() {
        assert_eq!(Dialect::by_name("sqlite"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::by_name("mysql"), Some(Dialect::MySql));
        assert_eq!(Dialect::by_name("postgres"), None);
    }

    #[test]
    fn display_matches_registry_name() {
        assert_eq!(Dialect::Sqlite.to_string(), "sqlite");
        assert_eq!(Dialect::MySql.to_string(), "mysql");
    }
}
