//! Synchronous SQLite execution path, demonstrating the compile → execute →
//! hydrate pipeline end to end.
//!
//! Feature-gated behind `sqlite-runner`; grounded in `runner.py`'s
//! `SQLiteRunner`. Debug instrumentation uses `tracing` instead of a
//! hand-rolled `SQLSTRATUM_DEBUG` environment check — the level filter a
//! `tracing` subscriber applies already gives callers that opt-out for free.

use std::time::Instant;

use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::error::SqlStratumError;
use crate::sql::compiler::Compiled;
use crate::sql::expr::Expr;
use crate::sql::hydrate::{hydrate_rows, Hydrated, HydrationTarget, RowMap};
use crate::sql::query::{SelectQuery, SetQuery};
use crate::sql::value::{Params, Value};

/// Result of a non-row-returning execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    pub rows_affected: usize,
    pub last_insert_rowid: i64,
}

/// Anything a `SELECT`-shaped execution can read its output contract from.
trait OutputShape {
    fn projections(&self) -> &[Expr];
    fn hydration(&self) -> Option<&HydrationTarget>;
}

impl OutputShape for SelectQuery {
    fn projections(&self) -> &[Expr] {
        &self.projections
    }

    fn hydration(&self) -> Option<&HydrationTarget> {
        self.hydration.as_ref()
    }
}

impl OutputShape for SetQuery {
    fn projections(&self) -> &[Expr] {
        match &self.left {
            crate::sql::query::SetOperand::Select(q) => &q.projections,
            crate::sql::query::SetOperand::Set(q) => q.projections(),
        }
    }

    fn hydration(&self) -> Option<&HydrationTarget> {
        self.effective_hydration()
    }
}

pub struct SqliteRunner {
    connection: Connection,
    tx_depth: u32,
}

impl SqliteRunner {
    /// Opens a connection at `path`, or `:memory:` for an in-memory database.
    pub fn connect(path: &str) -> Result<Self, SqlStratumError> {
        let connection = if path.is_empty() || path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| SqlStratumError::InvalidArgument(e.to_string()))?;
        Ok(SqliteRunner {
            connection,
            tx_depth: 0,
        })
    }

    pub fn exec_ddl(&self, sql: &str) -> Result<(), SqlStratumError> {
        self.connection
            .execute_batch(sql)
            .map_err(|e| SqlStratumError::InvalidArgument(e.to_string()))
    }

    pub fn fetch_all<Q: OutputShape>(&self, query: &Q, compiled: &Compiled) -> Result<Hydrated, SqlStratumError> {
        let start = Instant::now();
        let rows = self.query_raw(&compiled.sql, &compiled.params)?;
        debug_log(compiled, start.elapsed());
        let target = query.hydration().cloned().unwrap_or(HydrationTarget::Raw);
        hydrate_rows(rows, query.projections(), &target)
    }

    pub fn fetch_one<Q: OutputShape>(
        &self,
        query: &Q,
        compiled: &Compiled,
    ) -> Result<Option<Hydrated>, SqlStratumError> {
        let start = Instant::now();
        let mut rows = self.query_raw(&compiled.sql, &compiled.params)?;
        debug_log(compiled, start.elapsed());
        let Some(row) = rows.drain(..).next() else {
            return Ok(None);
        };
        let target = query.hydration().cloned().unwrap_or(HydrationTarget::Raw);
        hydrate_rows(vec![row], query.projections(), &target).map(Some)
    }

    pub fn scalar(&self, compiled: &Compiled) -> Result<Option<Value>, SqlStratumError> {
        let start = Instant::now();
        let mut stmt = self
            .connection
            .prepare(&compiled.sql)
            .map_err(|e| SqlStratumError::InvalidArgument(e.to_string()))?;
        let named = named_params(&compiled.params);
        let param_refs: Vec<(&str, &dyn rusqlite::ToSql)> = named
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn rusqlite::ToSql))
            .collect();
        let result = stmt
            .query_row(param_refs.as_slice(), |row| row_to_value(row, 0))
            .map(Some)
            .or_else(|e| {
                if matches!(e, rusqlite::Error::QueryReturnedNoRows) {
                    Ok(None)
                } else {
                    Err(e)
                }
            })
            .map_err(|e| SqlStratumError::InvalidArgument(e.to_string()))?;
        debug_log(compiled, start.elapsed());
        Ok(result)
    }

    pub fn execute(&mut self, compiled: &Compiled) -> Result<ExecutionResult, SqlStratumError> {
        let start = Instant::now();
        let named = named_params(&compiled.params);
        let param_refs: Vec<(&str, &dyn rusqlite::ToSql)> = named
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn rusqlite::ToSql))
            .collect();
        let rows_affected = self
            .connection
            .execute(&compiled.sql, param_refs.as_slice())
            .map_err(|e| SqlStratumError::InvalidArgument(e.to_string()))?;
        debug_log(compiled, start.elapsed());
        Ok(ExecutionResult {
            rows_affected,
            last_insert_rowid: self.connection.last_insert_rowid(),
        })
    }

    /// Runs `body` inside a transaction scope. Nested calls share the
    /// connection's single transaction; only the outermost call commits or
    /// rolls back, tracked via `tx_depth`.
    pub fn transaction<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, SqlStratumError>,
    ) -> Result<T, SqlStratumError> {
        if self.tx_depth == 0 {
            self.connection
                .execute_batch("BEGIN")
                .map_err(|e| SqlStratumError::InvalidArgument(e.to_string()))?;
        }
        self.tx_depth += 1;
        let result = body(self);
        self.tx_depth -= 1;

        if self.tx_depth == 0 {
            match &result {
                Ok(_) => {
                    self.connection
                        .execute_batch("COMMIT")
                        .map_err(|e| SqlStratumError::InvalidArgument(e.to_string()))?;
                }
                Err(_) => {
                    let _ = self.connection.execute_batch("ROLLBACK");
                }
            }
        }
        result
    }

    fn query_raw(&self, sql: &str, params: &Params) -> Result<Vec<RowMap>, SqlStratumError> {
        let mut stmt = self
            .connection
            .prepare(sql)
            .map_err(|e| SqlStratumError::InvalidArgument(e.to_string()))?;
        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let named = named_params(params);
        let param_refs: Vec<(&str, &dyn rusqlite::ToSql)> = named
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn rusqlite::ToSql))
            .collect();
        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let mut map = RowMap::new();
                for (i, name) in column_names.iter().enumerate() {
                    map.insert(name.clone(), row_to_value(row, i)?);
                }
                Ok(map)
            })
            .map_err(|e| SqlStratumError::InvalidArgument(e.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| SqlStratumError::InvalidArgument(e.to_string()))
    }
}

fn row_to_value(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Value> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::Int(i)),
        ValueRef::Real(f) => Ok(Value::Float(f)),
        ValueRef::Text(t) => Ok(Value::Text(String::from_utf8_lossy(t).into_owned())),
        ValueRef::Blob(b) => Ok(Value::Text(String::from_utf8_lossy(b).into_owned())),
    }
}

/// rusqlite's named-parameter syntax expects a leading `:`/`@`/`$`; this
/// crate's own `sqlite` dialect already emits `:pN` placeholders, so the
/// bound name simply needs the same prefix to pass through.
fn named_params(params: &Params) -> Vec<(String, Value)> {
    params
        .iter()
        .map(|(name, value)| (format!(":{name}"), value.clone()))
        .collect()
}

impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, Value as SqlValue};
        Ok(match self {
            Value::Int(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Text(t) => ToSqlOutput::Owned(SqlValue::Text(t.clone())),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(if *b { 1 } else { 0 })),
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
        })
    }
}

fn debug_log(compiled: &Compiled, duration: std::time::Duration) {
    tracing::debug!(
        sql = %compiled.sql,
        params = %render_params(&compiled.params),
        duration_ms = %format!("{:.3}", duration.as_secs_f64() * 1000.0),
        "executed query"
    );
}

fn render_params(params: &Params) -> String {
    if params.is_empty() {
        return "{}".to_string();
    }
    let items: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{k}={}", truncate(&v.to_string(), 200)))
        .collect();
    format!("{{{}}}", items.join(", "))
}

fn truncate(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        s.to_string()
    } else {
        format!("{}...<{} more>", &s[..limit], s.len() - limit)
    }
}
