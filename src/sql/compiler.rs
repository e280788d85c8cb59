//! String-building compiler visitor.
//!
//! The teacher's `token.rs` renders SQL by assembling a `TokenStream` and
//! joining it with inferred spacing. That approach fights the exact
//! single-space, no-trailing-whitespace, deterministic-placeholder-numbering
//! contract this crate promises, so compilation here is a direct
//! string-building visitor instead: every clause writes straight into an
//! output `String` and every literal is bound through one `bind` call that
//! owns the parameter counter.

use crate::error::{SqlStratumError, UnsupportedDialectFeature};
use crate::sql::dialect::SqlDialect;
use crate::sql::dml::{DeleteQuery, InsertQuery, UpdateQuery};
use crate::sql::expr::{BinaryOp, Expr, ExistsTarget, InSource, LogicalOp, Predicate, UnaryOp};
use crate::sql::query::{Join, JoinKind, SelectQuery, SetOperand, SetQuery, Source};
use crate::sql::value::{Params, Value};

/// The result of compiling any statement: ready-to-execute SQL text plus its
/// bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub sql: String,
    pub params: Params,
}

struct Compiler<'d> {
    dialect: &'d dyn SqlDialect,
    params: Params,
    counter: usize,
}

impl<'d> Compiler<'d> {
    fn new(dialect: &'d dyn SqlDialect) -> Self {
        Compiler {
            dialect,
            params: Params::new(),
            counter: 0,
        }
    }

    fn bind(&mut self, value: Value) -> String {
        let name = format!("p{}", self.counter);
        self.counter += 1;
        let placeholder = self.dialect.placeholder(&name);
        self.params.insert(name, value);
        placeholder
    }

    fn quote(&self, ident: &str) -> String {
        self.dialect.quote_identifier(ident)
    }

    fn unsupported(&self, feature: impl Into<String>) -> SqlStratumError {
        UnsupportedDialectFeature::new(self.dialect.name(), feature).into()
    }

    fn qualified_column(&self, col: &crate::sql::meta::Column) -> String {
        format!(
            "{}.{}",
            self.quote(col.table.qualifier()),
            self.quote(&col.name)
        )
    }

    fn expr(&mut self, expr: &Expr) -> Result<String, SqlStratumError> {
        match expr {
            Expr::Column(col) => Ok(self.qualified_column(col)),
            Expr::Literal(v) => Ok(self.bind(v.clone())),
            Expr::Function(name, args) => self.function(name, args),
            Expr::Alias(inner, alias) => {
                let inner_sql = self.expr(inner)?;
                Ok(format!("{inner_sql} AS {}", self.quote(alias)))
            }
            Expr::Subquery(query) => {
                let compiled = self.select(query)?;
                Ok(format!("({compiled})"))
            }
        }
    }

    fn function(&mut self, name: &str, args: &[Expr]) -> Result<String, SqlStratumError> {
        if name == "TOTAL" && !self.dialect.supports_total_aggregate() {
            return Err(self.unsupported("TOTAL aggregate not supported by this dialect"));
        }
        if name == "GROUP_CONCAT" && !self.dialect.supports_group_concat_aggregate() {
            return Err(self.unsupported("GROUP_CONCAT aggregate not supported by this dialect"));
        }
        let mut rendered = Vec::with_capacity(args.len());
        for arg in args {
            rendered.push(self.expr(arg)?);
        }
        Ok(format!("{name}({})", rendered.join(", ")))
    }

    fn predicate(&mut self, predicate: &Predicate) -> Result<String, SqlStratumError> {
        match predicate {
            Predicate::Binary(left, op, right) => {
                let left = self.expr(left)?;
                let right = self.expr(right)?;
                Ok(format!("{left} {} {right}", op.as_sql()))
            }
            Predicate::Unary(expr, op) => {
                let expr = self.expr(expr)?;
                Ok(format!("{expr} {}", op.as_sql()))
            }
            Predicate::Logical(op, preds) => {
                let mut rendered = Vec::with_capacity(preds.len());
                for p in preds {
                    rendered.push(self.predicate(p)?);
                }
                let sep = format!(" {} ", op.as_sql());
                Ok(format!("({})", rendered.join(&sep)))
            }
            Predicate::Not(inner) => {
                let inner = self.predicate(inner)?;
                Ok(format!("NOT ({inner})"))
            }
            Predicate::In {
                expr,
                source,
                negated,
            } => self.in_predicate(expr, source, *negated),
            Predicate::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let expr = self.expr(expr)?;
                let low = self.expr(low)?;
                let high = self.expr(high)?;
                let kw = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                Ok(format!("{expr} {kw} {low} AND {high}"))
            }
            Predicate::Exists { query, negated } => {
                let inner = match query {
                    ExistsTarget::Select(q) => self.select(q)?,
                    ExistsTarget::Set(q) => self.set_query(q)?,
                };
                let kw = if *negated { "NOT EXISTS" } else { "EXISTS" };
                Ok(format!("{kw} ({inner})"))
            }
        }
    }

    fn in_predicate(
        &mut self,
        expr: &Expr,
        source: &InSource,
        negated: bool,
    ) -> Result<String, SqlStratumError> {
        match source {
            InSource::Values(values) if values.is_empty() => {
                Ok((if negated { "1=1" } else { "1=0" }).to_string())
            }
            InSource::Values(values) => {
                let expr_sql = self.expr(expr)?;
                let mut rendered = Vec::with_capacity(values.len());
                for v in values {
                    rendered.push(self.expr(v)?);
                }
                let kw = if negated { "NOT IN" } else { "IN" };
                Ok(format!("{expr_sql} {kw} ({})", rendered.join(", ")))
            }
            InSource::Select(query) => {
                let expr_sql = self.expr(expr)?;
                let inner = self.select(query)?;
                let kw = if negated { "NOT IN" } else { "IN" };
                Ok(format!("{expr_sql} {kw} ({inner})"))
            }
            InSource::Set(query) => {
                let expr_sql = self.expr(expr)?;
                let inner = self.set_query(query)?;
                let kw = if negated { "NOT IN" } else { "IN" };
                Ok(format!("{expr_sql} {kw} ({inner})"))
            }
        }
    }

    fn and_list(&mut self, predicates: &[Predicate]) -> Result<String, SqlStratumError> {
        let mut rendered = Vec::with_capacity(predicates.len());
        for p in predicates {
            rendered.push(self.predicate(p)?);
        }
        Ok(rendered.join(" AND "))
    }

    fn source(&mut self, source: &Source) -> Result<String, SqlStratumError> {
        match source {
            Source::Table(table) => {
                let name = self.quote(&table.name);
                match &table.alias {
                    Some(alias) => Ok(format!("{name} AS {}", self.quote(alias))),
                    None => Ok(name),
                }
            }
            Source::Subquery(subquery) => {
                let inner = self.select(&subquery.query)?;
                Ok(format!("({inner}) AS {}", self.quote(&subquery.alias)))
            }
        }
    }

    fn join(&mut self, join: &Join) -> Result<String, SqlStratumError> {
        match join.kind {
            JoinKind::Right if !self.dialect.supports_right_join() => {
                return Err(self.unsupported("RIGHT OUTER JOIN not supported by sqlite dialect"));
            }
            JoinKind::Full if !self.dialect.supports_full_join() => {
                return Err(self.unsupported(format!(
                    "FULL OUTER JOIN not supported by {} dialect",
                    self.dialect.name()
                )));
            }
            _ => {}
        }
        let source = self.source(&join.source)?;
        let on = self.predicate(&join.on)?;
        Ok(format!("{} {source} ON {on}", join.kind.as_sql()))
    }

    fn order_by_clause(&mut self, specs: &[crate::sql::expr::OrderSpec]) -> Result<String, SqlStratumError> {
        let mut rendered = Vec::with_capacity(specs.len());
        for spec in specs {
            let expr = self.expr(&spec.expr)?;
            rendered.push(format!("{expr} {}", spec.direction.as_sql()));
        }
        Ok(rendered.join(", "))
    }

    fn limit_offset(
        &mut self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<(Option<String>, Option<String>), SqlStratumError> {
        if offset.is_some() && limit.is_none() && self.dialect.requires_limit_for_offset() {
            return Err(self.unsupported("OFFSET without LIMIT not supported by mysql dialect"));
        }
        let limit_sql = match limit {
            Some(n) => Some(self.bind(Value::Int(n))),
            None => None,
        };
        let offset_sql = match offset {
            Some(n) => Some(self.bind(Value::Int(n))),
            None => None,
        };
        Ok((limit_sql, offset_sql))
    }

    fn select(&mut self, query: &SelectQuery) -> Result<String, SqlStratumError> {
        query.check_pending_order(self.dialect.name())?;

        let mut parts = Vec::new();
        parts.push("SELECT".to_string());
        if query.distinct {
            parts.push("DISTINCT".to_string());
        }
        let mut projections = Vec::with_capacity(query.projections.len());
        for p in &query.projections {
            projections.push(self.expr(p)?);
        }
        parts.push(projections.join(", "));

        if let Some(from) = &query.from {
            parts.push("FROM".to_string());
            parts.push(self.source(from)?);
        }

        for join in &query.joins {
            parts.push(self.join(join)?);
        }

        if !query.where_clauses.is_empty() {
            parts.push("WHERE".to_string());
            parts.push(self.and_list(&query.where_clauses)?);
        }

        if !query.group_by.is_empty() {
            parts.push("GROUP BY".to_string());
            let mut rendered = Vec::with_capacity(query.group_by.len());
            for e in &query.group_by {
                rendered.push(self.expr(e)?);
            }
            parts.push(rendered.join(", "));
        }

        if !query.having.is_empty() {
            parts.push("HAVING".to_string());
            parts.push(self.and_list(&query.having)?);
        }

        if !query.order_by_specs.is_empty() {
            parts.push("ORDER BY".to_string());
            parts.push(self.order_by_clause(&query.order_by_specs)?);
        }

        let (limit_sql, offset_sql) = self.limit_offset(query.limit, query.offset)?;
        if let Some(limit_sql) = limit_sql {
            parts.push("LIMIT".to_string());
            parts.push(limit_sql);
        }
        if let Some(offset_sql) = offset_sql {
            parts.push("OFFSET".to_string());
            parts.push(offset_sql);
        }

        Ok(join_clauses(&parts))
    }

    fn set_operand(&mut self, operand: &SetOperand) -> Result<String, SqlStratumError> {
        match operand {
            SetOperand::Select(q) => self.select(q),
            SetOperand::Set(q) => self.set_query(q),
        }
    }

    fn set_query(&mut self, query: &SetQuery) -> Result<String, SqlStratumError> {
        query.check_pending_order(self.dialect.name())?;

        let left = self.set_operand(&query.left)?;
        let right = self.set_operand(&query.right)?;
        let mut parts = vec![format!("{left} {} {right}", query.op.as_sql())];

        if !query.order_by_specs.is_empty() {
            parts.push("ORDER BY".to_string());
            parts.push(self.order_by_clause(&query.order_by_specs)?);
        }

        let (limit_sql, offset_sql) = self.limit_offset(query.limit, query.offset)?;
        if let Some(limit_sql) = limit_sql {
            parts.push("LIMIT".to_string());
            parts.push(limit_sql);
        }
        if let Some(offset_sql) = offset_sql {
            parts.push("OFFSET".to_string());
            parts.push(offset_sql);
        }

        Ok(join_clauses(&parts))
    }

    fn insert(&mut self, query: &InsertQuery) -> Result<String, SqlStratumError> {
        let table = self.quote(&query.table.name);
        let mut columns = Vec::with_capacity(query.values.len());
        let mut placeholders = Vec::with_capacity(query.values.len());
        for (name, value) in &query.values {
            columns.push(self.quote(name));
            placeholders.push(self.bind(value.clone()));
        }
        Ok(format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        ))
    }

    fn update(&mut self, query: &UpdateQuery) -> Result<String, SqlStratumError> {
        let table = self.quote(&query.table.name);
        let mut assignments = Vec::with_capacity(query.values.len());
        for (name, value) in &query.values {
            let placeholder = self.bind(value.clone());
            assignments.push(format!("{} = {placeholder}", self.quote(name)));
        }
        let mut parts = vec![format!("UPDATE {table} SET {}", assignments.join(", "))];
        if !query.where_clauses.is_empty() {
            parts.push("WHERE".to_string());
            parts.push(self.and_list(&query.where_clauses)?);
        }
        Ok(join_clauses(&parts))
    }

    fn delete(&mut self, query: &DeleteQuery) -> Result<String, SqlStratumError> {
        let table = self.quote(&query.table.name);
        let mut parts = vec![format!("DELETE FROM {table}")];
        if !query.where_clauses.is_empty() {
            parts.push("WHERE".to_string());
            parts.push(self.and_list(&query.where_clauses)?);
        }
        Ok(join_clauses(&parts))
    }
}

/// Joins already-rendered clause fragments with exactly one ASCII space,
/// never producing trailing whitespace.
fn join_clauses(parts: &[String]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn compile_select(
    query: &SelectQuery,
    dialect: &dyn SqlDialect,
) -> Result<Compiled, SqlStratumError> {
    let mut compiler = Compiler::new(dialect);
    let sql = compiler.select(query)?;
    Ok(Compiled {
        sql,
        params: compiler.params,
    })
}

pub fn compile_set_query(
    query: &SetQuery,
    dialect: &dyn SqlDialect,
) -> Result<Compiled, SqlStratumError> {
    let mut compiler = Compiler::new(dialect);
    let sql = compiler.set_query(query)?;
    Ok(Compiled {
        sql,
        params: compiler.params,
    })
}

pub fn compile_insert(
    query: &InsertQuery,
    dialect: &dyn SqlDialect,
) -> Result<Compiled, SqlStratumError> {
    let mut compiler = Compiler::new(dialect);
    let sql = compiler.insert(query)?;
    Ok(Compiled {
        sql,
        params: compiler.params,
    })
}

pub fn compile_update(
    query: &UpdateQuery,
    dialect: &dyn SqlDialect,
) -> Result<Compiled, SqlStratumError> {
    let mut compiler = Compiler::new(dialect);
    let sql = compiler.update(query)?;
    Ok(Compiled {
        sql,
        params: compiler.params,
    })
}

pub fn compile_delete(
    query: &DeleteQuery,
    dialect: &dyn SqlDialect,
) -> Result<Compiled, SqlStratumError> {
    let mut compiler = Compiler::new(dialect);
    let sql = compiler.delete(query)?;
    Ok(Compiled {
        sql,
        params: compiler.params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::{MySql, Sqlite};
    use crate::sql::dml::insert;
    use crate::sql::meta::{Table, ValueType};
    use crate::sql::query::{select, SetOps};

    fn users() -> Table {
        Table::new(
            "users",
            vec![("id", ValueType::Int), ("email", ValueType::Text)],
        )
    }

    #[test]
    fn scenario_1_select_with_equality_sqlite() {
        let q = select(vec![
            users().col("id").into_expr(),
            users().col("email").into_expr(),
        ])
        .from_(users())
        .where_(vec![users().col("id").into_expr().eq(1i64)]);

        let compiled = compile_select(&q, &Sqlite).unwrap();
        assert_eq!(
            compiled.sql,
            r#"SELECT "users"."id", "users"."email" FROM "users" WHERE "users"."id" = :p0"#
        );
        assert_eq!(compiled.params.get("p0"), Some(&Value::Int(1)));
    }

    #[test]
    fn scenario_2_select_with_equality_mysql() {
        let q = select(vec![
            users().col("id").into_expr(),
            users().col("email").into_expr(),
        ])
        .from_(users())
        .where_(vec![users().col("id").into_expr().eq(7i64)]);

        let compiled = compile_select(&q, &MySql).unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT `users`.`id`, `users`.`email` FROM `users` WHERE `users`.`id` = %(p0)s"
        );
        assert_eq!(compiled.params.get("p0"), Some(&Value::Int(7)));
    }

    #[test]
    fn scenario_3_insert_values() {
        let q = insert(users()).values(vec![
            ("email", Value::Text("a@b.com".into())),
            ("full_name", Value::Text("A".into())),
            ("active", Value::Int(1)),
        ]);
        let compiled = compile_insert(&q, &Sqlite).unwrap();
        assert_eq!(
            compiled.sql,
            r#"INSERT INTO "users" ("email", "full_name", "active") VALUES (:p0, :p1, :p2)"#
        );
        assert_eq!(compiled.params.get("p0"), Some(&Value::Text("a@b.com".into())));
        assert_eq!(compiled.params.get("p2"), Some(&Value::Int(1)));
    }

    #[test]
    fn scenario_4_empty_in_lowers_to_false() {
        let q = select(vec![users().col("id").into_expr()])
            .from_(users())
            .where_(vec![users().col("id").into_expr().is_in_values(Vec::<i64>::new())]);
        let compiled = compile_select(&q, &Sqlite).unwrap();
        assert!(compiled.sql.ends_with("WHERE 1=0"));
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn scenario_4b_empty_not_in_lowers_to_true() {
        let q = select(vec![users().col("id").into_expr()])
            .from_(users())
            .where_(vec![users().col("id").into_expr().not_in_values(Vec::<i64>::new())]);
        let compiled = compile_select(&q, &Sqlite).unwrap();
        assert!(compiled.sql.ends_with("WHERE 1=1"));
    }

    #[test]
    fn scenario_5_pending_order_rejected_then_accepted() {
        let q = select(vec![users().col("id").into_expr()])
            .from_(users())
            .order_by(vec![users().col("id").into_expr()])
            .unwrap();
        let err = compile_select(&q, &Sqlite).unwrap_err();
        match err {
            SqlStratumError::UnsupportedDialectFeature(f) => {
                assert_eq!(f.feature, "ORDER_BY requires an explicit direction");
            }
            _ => panic!("expected UnsupportedDialectFeature"),
        }

        let resolved = q.asc();
        let compiled = compile_select(&resolved, &Sqlite).unwrap();
        assert!(compiled.sql.ends_with(r#"ORDER BY "users"."id" ASC"#));
    }

    #[test]
    fn scenario_6_mysql_offset_without_limit_rejected() {
        let q = select(vec![users().col("id").into_expr()])
            .from_(users())
            .offset(5);
        let err = compile_select(&q, &MySql).unwrap_err();
        match err {
            SqlStratumError::UnsupportedDialectFeature(f) => {
                assert_eq!(f.feature, "OFFSET without LIMIT not supported by mysql dialect");
            }
            _ => panic!("expected UnsupportedDialectFeature"),
        }

        let with_limit = q.limit(10);
        let compiled = compile_select(&with_limit, &MySql).unwrap();
        assert!(compiled.sql.contains("LIMIT %(p0)s OFFSET %(p1)s"));
    }

    #[test]
    fn contains_wraps_value_with_percent_signs() {
        let q = select(vec![users().col("id").into_expr()])
            .from_(users())
            .where_(vec![users().col("email").into_expr().contains("x")]);
        let compiled = compile_select(&q, &Sqlite).unwrap();
        assert_eq!(compiled.params.get("p0"), Some(&Value::Text("%x%".into())));
    }

    #[test]
    fn right_join_rejected_by_sqlite() {
        let q = select(vec![users().col("id").into_expr()])
            .from_(users())
            .right_join(users().alias("u2"), users().col("id").into_expr().eq(1i64));
        let err = compile_select(&q, &Sqlite).unwrap_err();
        assert!(matches!(err, SqlStratumError::UnsupportedDialectFeature(_)));
    }

    #[test]
    fn full_join_rejected_by_both_dialects() {
        let q = select(vec![users().col("id").into_expr()])
            .from_(users())
            .full_join(users().alias("u2"), users().col("id").into_expr().eq(1i64));
        assert!(compile_select(&q, &Sqlite).is_err());
        assert!(compile_select(&q, &MySql).is_err());
    }

    #[test]
    fn determinism_repeated_compiles_match() {
        let q = select(vec![users().col("id").into_expr()])
            .from_(users())
            .where_(vec![users().col("id").into_expr().eq(1i64)]);
        let first = compile_select(&q, &Sqlite).unwrap();
        let second = compile_select(&q, &Sqlite).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn no_trailing_whitespace_in_output() {
        let q = select(vec![users().col("id").into_expr()]).from_(users());
        let compiled = compile_select(&q, &Sqlite).unwrap();
        assert_eq!(compiled.sql.trim_end(), compiled.sql);
    }

    fn orders() -> Table {
        Table::new(
            "orders",
            vec![("id", ValueType::Int), ("user_id", ValueType::Int)],
        )
    }

    #[test]
    fn snapshot_join_with_subquery_source_and_order_by() {
        let recent = select(vec![orders().col("user_id").into_expr()])
            .from_(orders())
            .where_(vec![orders().col("id").into_expr().gt(100i64)])
            .as_("recent");

        let q = select(vec![
            users().col("id").into_expr(),
            users().col("email").into_expr(),
        ])
        .from_(users())
        .left_join(
            recent,
            users()
                .col("id")
                .into_expr()
                .eq(orders().col("user_id").into_expr()),
        )
        .where_(vec![users().col("id").into_expr().is_in_values(vec![1i64, 2, 3])])
        .order_by(vec![users().col("id").into_expr().desc()])
        .unwrap()
        .limit(20);

        let compiled = compile_select(&q, &Sqlite).unwrap();
        insta::assert_snapshot!(compiled.sql, @r#"SELECT "users"."id", "users"."email" FROM "users" LEFT JOIN (SELECT "orders"."user_id" FROM "orders" WHERE "orders"."id" > :p0) AS "recent" ON "users"."id" = "orders"."user_id" WHERE "users"."id" IN (:p1, :p2, :p3) ORDER BY "users"."id" DESC LIMIT :p4"#);
    }

    #[test]
    fn snapshot_set_operation_of_two_selects() {
        let a = select(vec![users().col("id").into_expr()])
            .from_(users())
            .where_(vec![users().col("id").into_expr().lt(10i64)]);
        let b = select(vec![users().col("id").into_expr()])
            .from_(users())
            .where_(vec![users().col("id").into_expr().gt(90i64)]);

        let q = a.union_all(b);
        let compiled = compile_set_query(&q, &MySql).unwrap();
        insta::assert_snapshot!(compiled.sql, @"SELECT `users`.`id` FROM `users` WHERE `users`.`id` < %(p0)s UNION ALL SELECT `users`.`id` FROM `users` WHERE `users`.`id` > %(p1)s");
    }

    #[test]
    fn emitted_sql_round_trips_through_sqlparser_for_both_dialects() {
        use crate::sql::dialect::Dialect as DialectTag;
        use crate::sql::test_utils::validate_sql;

        let q = select(vec![
            users().col("id").into_expr(),
            users().col("email").into_expr(),
        ])
        .from_(users())
        .join(
            orders(),
            users().col("id").into_expr().eq(orders().col("user_id").into_expr()),
        )
        .where_(vec![users().col("id").into_expr().between(1i64, 100i64)])
        .group_by(vec![users().col("id").into_expr()])
        .order_by(vec![users().col("id").into_expr().asc()])
        .unwrap()
        .limit(5)
        .offset(0);

        let sqlite_compiled = compile_select(&q, &Sqlite).unwrap();
        validate_sql(&sqlite_compiled.sql, DialectTag::Sqlite).unwrap();

        let mysql_compiled = compile_select(&q, &MySql).unwrap();
        validate_sql(&mysql_compiled.sql, DialectTag::MySql).unwrap();
    }
}
