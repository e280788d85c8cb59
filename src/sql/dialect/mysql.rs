//! MySQL dialect: `` `backtick-quoted` `` identifiers, `%(name)s` placeholders.

use super::helpers::quote_backtick;
use super::SqlDialect;

#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_backtick(ident)
    }

    fn placeholder(&self, name: &str) -> String {
        format!("%({name})s")
    }

    fn supports_right_join(&self) -> bool {
        true
    }

    fn supports_full_join(&self) -> bool {
        false
    }

    fn supports_total_aggregate(&self) -> bool {
        false
    }

    fn supports_group_concat_aggregate(&self) -> bool {
        false
    }

    fn requires_limit_for_offset(&self) -> bool {
        true
    }
}
