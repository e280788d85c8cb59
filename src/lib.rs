//! sqlstratum: a typed query-construction and compilation core.
//!
//! Application code builds statements as immutable algebraic values through
//! [`sql::query`], [`sql::dml`], and [`sql::expr`], then compiles them via
//! [`compile`] into dialect-specific `(sql, params)` pairs. Two dialects ship
//! built in — `sqlite` (`:name` placeholders, double-quoted identifiers) and
//! `mysql` (`%(name)s` placeholders, backtick-quoted identifiers) — with
//! capability gating that rejects unsupported constructs at compile time
//! rather than emitting SQL the target database would reject.

pub mod compile;
pub mod config;
pub mod error;
pub mod sql;

#[cfg(feature = "sqlite-runner")]
pub mod runner;

pub use compile::{compile_bound, get_dialect, list_dialects, register_dialect, Compile};
pub use error::{SqlStratumError, SqlStratumResult, UnsupportedDialectFeature};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::Compile;
    pub use crate::error::{SqlStratumError, SqlStratumResult};
    pub use crate::sql::bind::{with_dialect, DialectBoundQuery};
    pub use crate::sql::dialect::Dialect;
    pub use crate::sql::dml::{delete, insert, update};
    pub use crate::sql::expr::{
        and, avg, count, count_of, exists, group_concat, max, min, not, not_exists, or, sum, total,
    };
    pub use crate::sql::hydrate::HydrationTarget;
    pub use crate::sql::meta::{Table, ValueType};
    pub use crate::sql::query::{select, SetOps};
    pub use crate::sql::value::Value;
}
