//! SQLite dialect: `"double-quoted"` identifiers, `:name` placeholders.

use super::helpers::quote_double;
use super::SqlDialect;

#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_double(ident)
    }

    fn placeholder(&self, name: &str) -> String {
        format!(":{name}")
    }

    fn supports_right_join(&self) -> bool {
        false
    }

    fn supports_full_join(&self) -> bool {
        false
    }

    fn supports_total_aggregate(&self) -> bool {
        true
    }

    fn supports_group_concat_aggregate(&self) -> bool {
        true
    }

    fn requires_limit_for_offset(&self) -> bool {
        false
    }
}
