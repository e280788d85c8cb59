//! Query construction and compilation core.
//!
//! - [`meta`] - tables and typed columns
//! - [`value`] - parameter payload values
//! - [`expr`] - expression/predicate algebra
//! - [`query`] - SELECT statement algebra, joins, subqueries, set operations
//! - [`dml`] - INSERT/UPDATE/DELETE statements
//! - [`dialect`] - per-dialect capability gating and rendering rules
//! - [`compiler`] - the statement-tree-to-`(sql, params)` visitor
//! - [`bind`] - the dialect-binding wrapper
//! - [`hydrate`] - row-hydration contract

pub mod bind;
pub mod compiler;
pub mod dialect;
pub mod dml;
pub mod expr;
pub mod hydrate;
pub mod meta;
pub mod query;
pub mod value;

#[cfg(test)]
pub mod test_utils;

pub use bind::{with_dialect, Bindable, BoundQuery, DialectBoundQuery};
pub use compiler::Compiled;
pub use dialect::{Dialect, SqlDialect};
pub use dml::{delete, insert, update, DeleteQuery, InsertQuery, UpdateQuery};
pub use expr::{
    and, avg, count, count_of, exists, group_concat, max, min, not, not_exists, or, sum, total,
    Expr, Predicate,
};
pub use hydrate::{hydrate_rows, projection_keys, Hydrated, HydrationTarget, RowMap};
pub use meta::{Column, Table, TableRef, ValueType};
pub use query::{select, JoinKind, SelectQuery, SetOp, SetOps, SetQuery, Source, Subquery};
pub use value::{Params, Value};
