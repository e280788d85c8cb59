//! Row-hydration contract.
//!
//! Compilers emit alias information (the projection list) that a runner's
//! row-hydration step depends on; this module defines that minimal contract
//! without taking a position on how rows actually arrive (that is the
//! runner's concern, see [`crate::runner`]).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::SqlStratumError;
use crate::sql::expr::Expr;
use crate::sql::value::Value;

/// A single raw result row, keyed by column/alias name.
pub type RowMap = BTreeMap<String, Value>;

/// How a runner should reshape hydrated rows.
#[derive(Clone)]
pub enum HydrationTarget {
    /// Return the row mapping unchanged.
    Raw,
    /// Apply a user-supplied callable per row. This is how record/model
    /// construction is expressed — the caller supplies a closure that
    /// builds their own type from a `RowMap`, the same pattern
    /// `hydrate/pydantic.py`'s `using_pydantic` wraps around
    /// `model_cls.model_validate`.
    Mapper(Arc<dyn Fn(&RowMap) -> Value + Send + Sync>),
}

impl fmt::Debug for HydrationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HydrationTarget::Raw => write!(f, "HydrationTarget::Raw"),
            HydrationTarget::Mapper(_) => write!(f, "HydrationTarget::Mapper(..)"),
        }
    }
}

impl PartialEq for HydrationTarget {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HydrationTarget::Raw, HydrationTarget::Raw) => true,
            (HydrationTarget::Mapper(a), HydrationTarget::Mapper(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Resolve the ordered list of output names for a projection list: the
/// `AliasExpr` alias if present, else the bare `Column` name, else an error.
/// Rejects a bare aggregate (`Function`) projection and duplicate names.
pub fn projection_keys(projections: &[Expr]) -> Result<Vec<String>, SqlStratumError> {
    let mut keys = Vec::with_capacity(projections.len());
    for proj in projections {
        let key = projection_key(proj)?;
        if keys.contains(&key) {
            return Err(SqlStratumError::Hydration(format!(
                "Duplicate projection key '{key}'. Use AS() to disambiguate."
            )));
        }
        keys.push(key);
    }
    Ok(keys)
}

fn projection_key(proj: &Expr) -> Result<String, SqlStratumError> {
    match proj {
        Expr::Alias(_, alias) => Ok(alias.clone()),
        Expr::Column(col) => Ok(col.name.clone()),
        Expr::Function(..) => Err(SqlStratumError::Hydration(
            "Aggregate expressions require AS('alias') for hydration".to_string(),
        )),
        _ => Err(SqlStratumError::Hydration(
            "Projection requires AS('alias') for hydration".to_string(),
        )),
    }
}

/// The result of reshaping raw rows per a [`HydrationTarget`].
#[derive(Debug)]
pub enum Hydrated {
    /// The row mappings, narrowed to the projection keys, unchanged.
    Raw(Vec<RowMap>),
    /// The result of applying the target's mapper closure to each row.
    Mapped(Vec<Value>),
}

/// Reshape raw rows into the target's shape.
pub fn hydrate_rows(
    rows: impl IntoIterator<Item = RowMap>,
    projections: &[Expr],
    target: &HydrationTarget,
) -> Result<Hydrated, SqlStratumError> {
    let keys = projection_keys(projections)?;
    let mapped_rows: Vec<RowMap> = rows
        .into_iter()
        .map(|row| {
            keys.iter()
                .map(|k| (k.clone(), row.get(k).cloned().unwrap_or(Value::Null)))
                .collect()
        })
        .collect();
    match target {
        HydrationTarget::Raw => Ok(Hydrated::Raw(mapped_rows)),
        HydrationTarget::Mapper(f) => {
            Ok(Hydrated::Mapped(mapped_rows.iter().map(|r| f(r)).collect()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::meta::{Table, ValueType};

    fn users() -> Table {
        Table::new(
            "users",
            vec![("id", ValueType::Int), ("email", ValueType::Text)],
        )
    }

    #[test]
    fn projection_keys_prefers_alias() {
        let projections = vec![
            users().col("id").into_expr(),
            users().col("email").into_expr().alias("contact"),
        ];
        assert_eq!(
            projection_keys(&projections).unwrap(),
            vec!["id".to_string(), "contact".to_string()]
        );
    }

    #[test]
    fn bare_function_projection_is_rejected() {
        let projections = vec![crate::sql::expr::count()];
        let err = projection_keys(&projections).unwrap_err();
        assert!(matches!(err, SqlStratumError::Hydration(_)));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let projections = vec![users().col("id").into_expr(), users().col("id").into_expr()];
        let err = projection_keys(&projections).unwrap_err();
        match err {
            SqlStratumError::Hydration(msg) => assert!(msg.contains("Duplicate projection key")),
            _ => panic!("expected hydration error"),
        }
    }
}
