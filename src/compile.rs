//! Public compilation entrypoint and the process-wide dialect registry.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{SqlStratumError, UnsupportedDialectFeature};
use crate::sql::bind::{BoundQuery, DialectBoundQuery};
use crate::sql::compiler::{
    compile_delete, compile_insert, compile_select, compile_set_query, compile_update, Compiled,
};
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::dml::{DeleteQuery, InsertQuery, UpdateQuery};
use crate::sql::query::{SelectQuery, SetQuery};

static REGISTRY: Lazy<RwLock<BTreeMap<String, Dialect>>> = Lazy::new(|| {
    let mut m = BTreeMap::new();
    m.insert("sqlite".to_string(), Dialect::Sqlite);
    m.insert("mysql".to_string(), Dialect::MySql);
    RwLock::new(m)
});

/// Registers an additional dialect name, permitting extension beyond the
/// two built-in dialects.
pub fn register_dialect(name: impl Into<String>, dialect: Dialect) {
    REGISTRY
        .write()
        .expect("dialect registry lock poisoned")
        .insert(name.into().to_lowercase(), dialect);
}

/// Looks up a dialect by (case-insensitive) name.
pub fn get_dialect(name: &str) -> Result<Dialect, SqlStratumError> {
    let key = name.to_lowercase();
    let registry = REGISTRY.read().expect("dialect registry lock poisoned");
    registry.get(&key).copied().ok_or_else(|| {
        let supported = registry.keys().cloned().collect::<Vec<_>>().join(", ");
        UnsupportedDialectFeature::new(name, "dialect")
            .with_hint(format!("Supported dialects: {supported}"))
            .into()
    })
}

/// Returns every registered dialect name, sorted lexicographically.
pub fn list_dialects() -> Vec<String> {
    REGISTRY
        .read()
        .expect("dialect registry lock poisoned")
        .keys()
        .cloned()
        .collect()
}

/// Anything that can be compiled against a named dialect.
pub trait Compile {
    fn compile(&self, dialect: &str) -> Result<Compiled, SqlStratumError>;
}

impl Compile for SelectQuery {
    fn compile(&self, dialect: &str) -> Result<Compiled, SqlStratumError> {
        compile_select(self, get_dialect(dialect)?.compiler())
    }
}

impl Compile for SetQuery {
    fn compile(&self, dialect: &str) -> Result<Compiled, SqlStratumError> {
        compile_set_query(self, get_dialect(dialect)?.compiler())
    }
}

impl Compile for InsertQuery {
    fn compile(&self, dialect: &str) -> Result<Compiled, SqlStratumError> {
        compile_insert(self, get_dialect(dialect)?.compiler())
    }
}

impl Compile for UpdateQuery {
    fn compile(&self, dialect: &str) -> Result<Compiled, SqlStratumError> {
        compile_update(self, get_dialect(dialect)?.compiler())
    }
}

impl Compile for DeleteQuery {
    fn compile(&self, dialect: &str) -> Result<Compiled, SqlStratumError> {
        compile_delete(self, get_dialect(dialect)?.compiler())
    }
}

/// Compiles a [`DialectBoundQuery`] against `requested_dialect`. If no
/// dialect name is given, the wrapper's own tag is used. A mismatch between
/// the two raises the `query bound to dialect 'X'` diagnostic.
pub fn compile_bound(
    bound: &DialectBoundQuery,
    requested_dialect: Option<&str>,
) -> Result<Compiled, SqlStratumError> {
    let dialect = match requested_dialect {
        Some(name) => {
            let requested = get_dialect(name)?;
            bound.require(requested)?;
            requested
        }
        None => bound.dialect,
    };
    let compiler = dialect.compiler();
    match &bound.query {
        BoundQuery::Select(q) => compile_select(q, compiler),
        BoundQuery::Set(q) => compile_set_query(q, compiler),
        BoundQuery::Insert(q) => compile_insert(q, compiler),
        BoundQuery::Update(q) => compile_update(q, compiler),
        BoundQuery::Delete(q) => compile_delete(q, compiler),
    }
}
