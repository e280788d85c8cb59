//! Expression and predicate algebra.
//!
//! `Expr` is deliberately small — four variants, per the data model: a
//! column reference, a literal, a function/aggregate call, and an alias
//! wrapper. `Predicate` is a separate tagged union used wherever a
//! boolean-valued tree node is needed (`WHERE`, `HAVING`, `JOIN ... ON`).
//! Rust has no operator overloading story that a query DSL should lean on
//! here (`==` must stay `bool`-returning), so comparisons are built through
//! named methods instead — `col.eq(1)`, not `col == 1`.

use crate::sql::meta::Column;
use crate::sql::query::SelectQuery;
use crate::sql::value::Value;

/// An expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(Column),
    Literal(Value),
    Function(String, Vec<Expr>),
    Alias(Box<Expr>, String),
    /// A SELECT used where a scalar value is expected, e.g. `(SELECT ...)`.
    Subquery(Box<SelectQuery>),
}

/// Lift Rust primitives and `Value` into the expression algebra as literals.
impl<T: Into<Value>> From<T> for Expr {
    fn from(v: T) -> Self {
        Expr::Literal(v.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl BinaryOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    IsNull,
    IsNotNull,
}

impl UnaryOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            UnaryOp::IsNull => "IS NULL",
            UnaryOp::IsNotNull => "IS NOT NULL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

/// The right-hand side of an `IN` / `NOT IN` predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum InSource {
    Values(Vec<Expr>),
    Select(Box<SelectQuery>),
    Set(Box<crate::sql::query::SetQuery>),
}

/// A boolean-valued tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    Unary(Box<Expr>, UnaryOp),
    Logical(LogicalOp, Vec<Predicate>),
    Not(Box<Predicate>),
    In {
        expr: Box<Expr>,
        source: InSource,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    Exists {
        query: ExistsTarget,
        negated: bool,
    },
}

/// The subquery-like node an `EXISTS` predicate wraps.
#[derive(Debug, Clone, PartialEq)]
pub enum ExistsTarget {
    Select(Box<SelectQuery>),
    Set(Box<crate::sql::query::SetQuery>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// A completed ordering item: an expression paired with an explicit
/// direction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpec {
    pub expr: Expr,
    pub direction: Direction,
}

/// An item passed to `order_by`: either a completed spec or a bare
/// expression. Only the last item in a single `order_by` call may be bare —
/// see [`crate::sql::query::SelectQuery::order_by`].
#[derive(Debug, Clone, PartialEq)]
pub enum OrderItem {
    Spec(OrderSpec),
    Bare(Expr),
}

impl From<OrderSpec> for OrderItem {
    fn from(s: OrderSpec) -> Self {
        OrderItem::Spec(s)
    }
}

impl From<Expr> for OrderItem {
    fn from(e: Expr) -> Self {
        OrderItem::Bare(e)
    }
}

impl From<Column> for OrderItem {
    fn from(c: Column) -> Self {
        OrderItem::Bare(Expr::Column(c))
    }
}

impl Expr {
    pub fn eq(self, rhs: impl Into<Expr>) -> Predicate {
        Predicate::Binary(Box::new(self), BinaryOp::Eq, Box::new(rhs.into()))
    }

    pub fn ne(self, rhs: impl Into<Expr>) -> Predicate {
        Predicate::Binary(Box::new(self), BinaryOp::Ne, Box::new(rhs.into()))
    }

    pub fn lt(self, rhs: impl Into<Expr>) -> Predicate {
        Predicate::Binary(Box::new(self), BinaryOp::Lt, Box::new(rhs.into()))
    }

    pub fn le(self, rhs: impl Into<Expr>) -> Predicate {
        Predicate::Binary(Box::new(self), BinaryOp::Le, Box::new(rhs.into()))
    }

    pub fn gt(self, rhs: impl Into<Expr>) -> Predicate {
        Predicate::Binary(Box::new(self), BinaryOp::Gt, Box::new(rhs.into()))
    }

    pub fn ge(self, rhs: impl Into<Expr>) -> Predicate {
        Predicate::Binary(Box::new(self), BinaryOp::Ge, Box::new(rhs.into()))
    }

    pub fn is_null(self) -> Predicate {
        Predicate::Unary(Box::new(self), UnaryOp::IsNull)
    }

    pub fn is_not_null(self) -> Predicate {
        Predicate::Unary(Box::new(self), UnaryOp::IsNotNull)
    }

    /// `<col> LIKE :pN` with the bound value `%text%`.
    pub fn contains(self, text: &str) -> Predicate {
        Predicate::Binary(
            Box::new(self),
            BinaryOp::Like,
            Box::new(Expr::Literal(Value::Text(format!("%{text}%")))),
        )
    }

    /// Binds `TRUE` as a parameter, never rewritten as `<> 0` (see Design
    /// Notes open question (b)) even when the column is integer-typed.
    pub fn is_true(self) -> Predicate {
        Predicate::Binary(
            Box::new(self),
            BinaryOp::Eq,
            Box::new(Expr::Literal(Value::Bool(true))),
        )
    }

    pub fn is_false(self) -> Predicate {
        Predicate::Binary(
            Box::new(self),
            BinaryOp::Eq,
            Box::new(Expr::Literal(Value::Bool(false))),
        )
    }

    /// `IN (v1, v2, ...)` against a fixed set of scalar values, each lifted
    /// to a `Literal`. An empty iterator compiles to the literal `1=0`.
    pub fn is_in_values<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Predicate {
        let values = values
            .into_iter()
            .map(|v| Expr::Literal(v.into()))
            .collect();
        Predicate::In {
            expr: Box::new(self),
            source: InSource::Values(values),
            negated: false,
        }
    }

    pub fn not_in_values<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Predicate {
        let values = values
            .into_iter()
            .map(|v| Expr::Literal(v.into()))
            .collect();
        Predicate::In {
            expr: Box::new(self),
            source: InSource::Values(values),
            negated: true,
        }
    }

    pub fn is_in_query(self, query: SelectQuery) -> Predicate {
        Predicate::In {
            expr: Box::new(self),
            source: InSource::Select(Box::new(query)),
            negated: false,
        }
    }

    pub fn not_in_query(self, query: SelectQuery) -> Predicate {
        Predicate::In {
            expr: Box::new(self),
            source: InSource::Select(Box::new(query)),
            negated: true,
        }
    }

    pub fn is_in_set(self, query: crate::sql::query::SetQuery) -> Predicate {
        Predicate::In {
            expr: Box::new(self),
            source: InSource::Set(Box::new(query)),
            negated: false,
        }
    }

    pub fn not_in_set(self, query: crate::sql::query::SetQuery) -> Predicate {
        Predicate::In {
            expr: Box::new(self),
            source: InSource::Set(Box::new(query)),
            negated: true,
        }
    }

    pub fn between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Predicate {
        Predicate::Between {
            expr: Box::new(self),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            negated: false,
        }
    }

    pub fn not_between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Predicate {
        Predicate::Between {
            expr: Box::new(self),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            negated: true,
        }
    }

    pub fn alias(self, alias: impl Into<String>) -> Expr {
        Expr::Alias(Box::new(self), alias.into())
    }

    pub fn asc(self) -> OrderSpec {
        OrderSpec {
            expr: self,
            direction: Direction::Asc,
        }
    }

    pub fn desc(self) -> OrderSpec {
        OrderSpec {
            expr: self,
            direction: Direction::Desc,
        }
    }
}

pub fn exists(query: SelectQuery) -> Predicate {
    Predicate::Exists {
        query: ExistsTarget::Select(Box::new(query)),
        negated: false,
    }
}

pub fn not_exists(query: SelectQuery) -> Predicate {
    Predicate::Exists {
        query: ExistsTarget::Select(Box::new(query)),
        negated: true,
    }
}

pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::Logical(LogicalOp::And, predicates.into_iter().collect())
}

pub fn or(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::Logical(LogicalOp::Or, predicates.into_iter().collect())
}

pub fn not(predicate: Predicate) -> Predicate {
    Predicate::Not(Box::new(predicate))
}

/// `COUNT()` with no argument: `COUNT(1)`.
pub fn count() -> Expr {
    Expr::Function("COUNT".to_string(), vec![Expr::Literal(Value::Int(1))])
}

pub fn count_of(expr: impl Into<Expr>) -> Expr {
    Expr::Function("COUNT".to_string(), vec![expr.into()])
}

pub fn sum(expr: impl Into<Expr>) -> Expr {
    Expr::Function("SUM".to_string(), vec![expr.into()])
}

pub fn avg(expr: impl Into<Expr>) -> Expr {
    Expr::Function("AVG".to_string(), vec![expr.into()])
}

pub fn min(expr: impl Into<Expr>) -> Expr {
    Expr::Function("MIN".to_string(), vec![expr.into()])
}

pub fn max(expr: impl Into<Expr>) -> Expr {
    Expr::Function("MAX".to_string(), vec![expr.into()])
}

/// SQLite-only aggregate; rejected by the MySQL dialect at compile time.
pub fn total(expr: impl Into<Expr>) -> Expr {
    Expr::Function("TOTAL".to_string(), vec![expr.into()])
}

/// SQLite-only aggregate; rejected by the MySQL dialect at compile time.
/// When `separator` is given it is kept as a `Literal` so it is bound as a
/// parameter rather than inlined.
pub fn group_concat(expr: impl Into<Expr>, separator: Option<&str>) -> Expr {
    let mut args = vec![expr.into()];
    if let Some(sep) = separator {
        args.push(Expr::Literal(Value::Text(sep.to_string())));
    }
    Expr::Function("GROUP_CONCAT".to_string(), args)
}
