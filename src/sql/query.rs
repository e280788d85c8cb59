//! Statement algebra: `SelectQuery`, joins, subqueries, and set operations.
//!
//! Every builder method takes `self` by value and returns a new value — the
//! receiver is moved, so Rust's ownership rules enforce the immutability
//! invariant for free: there is no way to call a builder method and still
//! hold a usable reference to the pre-call value unless the caller explicitly
//! clones first.

use crate::error::{SqlStratumError, UnsupportedDialectFeature};
use crate::sql::expr::{Direction, Expr, OrderItem, OrderSpec, Predicate};
use crate::sql::hydrate::HydrationTarget;
use crate::sql::meta::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
        }
    }
}

/// A row source: a bare/aliased table, or a derived (subquery) source.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table(Table),
    Subquery(Subquery),
}

impl From<Table> for Source {
    fn from(t: Table) -> Self {
        Source::Table(t)
    }
}

impl From<Subquery> for Source {
    fn from(s: Subquery) -> Self {
        Source::Subquery(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub source: Source,
    pub on: Predicate,
}

/// A `SELECT` wrapped and aliased so it can be used as a row source or as a
/// scalar/set-membership expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Subquery {
    pub query: Box<SelectQuery>,
    pub alias: String,
}

impl Subquery {
    /// A column parented to this subquery's synthetic aliased source. The
    /// declared type is not known from the projection alone, so it is left
    /// purely descriptive (`ValueType::Text`) — it plays no role in
    /// compilation.
    pub fn col(&self, name: &str) -> crate::sql::meta::Column {
        crate::sql::meta::Column {
            name: name.to_string(),
            value_type: crate::sql::meta::ValueType::Text,
            table: crate::sql::meta::TableRef {
                name: self.alias.clone(),
                alias: Some(self.alias.clone()),
            },
        }
    }
}

/// An immutable `SELECT` statement value.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub projections: Vec<Expr>,
    pub from: Option<Source>,
    pub joins: Vec<Join>,
    pub where_clauses: Vec<Predicate>,
    pub group_by: Vec<Expr>,
    pub having: Vec<Predicate>,
    pub order_by_specs: Vec<OrderSpec>,
    /// Set when the most recent `order_by` call ended in a bare expression
    /// whose direction has not yet been chosen. Must be `None` at compile
    /// time.
    pub pending_order: Option<Expr>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub distinct: bool,
    pub hydration: Option<HydrationTarget>,
}

/// `SELECT <projections>`.
pub fn select(projections: impl IntoIterator<Item = Expr>) -> SelectQuery {
    SelectQuery {
        projections: projections.into_iter().collect(),
        from: None,
        joins: Vec::new(),
        where_clauses: Vec::new(),
        group_by: Vec::new(),
        having: Vec::new(),
        order_by_specs: Vec::new(),
        pending_order: None,
        limit: None,
        offset: None,
        distinct: false,
        hydration: None,
    }
}

/// Split `order_by`'s trailing-bare-expression rule out of the builder
/// method so it can be reused by `SetQuery` too.
fn split_order_items(
    items: Vec<OrderItem>,
) -> Result<(Vec<OrderSpec>, Option<Expr>), SqlStratumError> {
    let mut specs = Vec::new();
    let mut pending = None;
    let last_index = items.len().checked_sub(1);
    for (i, item) in items.into_iter().enumerate() {
        match item {
            OrderItem::Spec(spec) => specs.push(spec),
            OrderItem::Bare(expr) => {
                if Some(i) == last_index {
                    pending = Some(expr);
                } else {
                    return Err(SqlStratumError::InvalidArgument(
                        "ORDER_BY received an unqualified expression that is not the final argument"
                            .to_string(),
                    ));
                }
            }
        }
    }
    Ok((specs, pending))
}

impl SelectQuery {
    pub fn from_(mut self, source: impl Into<Source>) -> Self {
        self.from = Some(source.into());
        self
    }

    pub fn join(mut self, source: impl Into<Source>, on: Predicate) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Inner,
            source: source.into(),
            on,
        });
        self
    }

    pub fn left_join(mut self, source: impl Into<Source>, on: Predicate) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Left,
            source: source.into(),
            on,
        });
        self
    }

    pub fn right_join(mut self, source: impl Into<Source>, on: Predicate) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Right,
            source: source.into(),
            on,
        });
        self
    }

    pub fn full_join(mut self, source: impl Into<Source>, on: Predicate) -> Self {
        self.joins.push(Join {
            kind: JoinKind::Full,
            source: source.into(),
            on,
        });
        self
    }

    /// Appends predicates; combined with `AND` at compile time. Repeated
    /// calls append rather than replace.
    pub fn where_(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.where_clauses.extend(predicates);
        self
    }

    pub fn group_by(mut self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        self.group_by.extend(exprs);
        self
    }

    pub fn having(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.having.extend(predicates);
        self
    }

    /// A bare trailing expression puts the statement into a pending state
    /// (see `pending_order`); any earlier bare expression is a
    /// construction-time error.
    pub fn order_by(
        mut self,
        items: impl IntoIterator<Item = impl Into<OrderItem>>,
    ) -> Result<Self, SqlStratumError> {
        let items: Vec<OrderItem> = items.into_iter().map(Into::into).collect();
        let (specs, pending) = split_order_items(items)?;
        self.order_by_specs.extend(specs);
        if pending.is_some() {
            self.pending_order = pending;
        }
        Ok(self)
    }

    /// Resolves a pending order item as ascending. A no-op if nothing is
    /// pending.
    pub fn asc(mut self) -> Self {
        if let Some(expr) = self.pending_order.take() {
            self.order_by_specs.push(OrderSpec {
                expr,
                direction: Direction::Asc,
            });
        }
        self
    }

    pub fn desc(mut self) -> Self {
        if let Some(expr) = self.pending_order.take() {
            self.order_by_specs.push(OrderSpec {
                expr,
                direction: Direction::Desc,
            });
        }
        self
    }

    /// Appends another ordering item after a resolved `ORDER_BY`. A
    /// completed spec is appended directly; a bare expression re-enters the
    /// pending state.
    pub fn then(mut self, item: impl Into<OrderItem>) -> Self {
        match item.into() {
            OrderItem::Spec(spec) => self.order_by_specs.push(spec),
            OrderItem::Bare(expr) => self.pending_order = Some(expr),
        }
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Wraps this SELECT as an aliased derived source/expression. Distinct
    /// from `Expr::alias`, which aliases a single projection.
    pub fn as_(self, alias: impl Into<String>) -> Subquery {
        Subquery {
            query: Box::new(self),
            alias: alias.into(),
        }
    }

    pub fn hydrate(mut self, target: HydrationTarget) -> Self {
        self.hydration = Some(target);
        self
    }

    /// Returns the error raised at compile time when `pending_order` is
    /// still set. Shared by both dialect compilers.
    pub(crate) fn check_pending_order(&self, dialect: &str) -> Result<(), SqlStratumError> {
        if self.pending_order.is_some() {
            return Err(UnsupportedDialectFeature::new(
                dialect,
                "ORDER_BY requires an explicit direction",
            )
            .into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl SetOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SetOp::Union => "UNION",
            SetOp::UnionAll => "UNION ALL",
            SetOp::Intersect => "INTERSECT",
            SetOp::Except => "EXCEPT",
        }
    }
}

/// Either side of a set operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SetOperand {
    Select(Box<SelectQuery>),
    Set(Box<SetQuery>),
}

impl SetOperand {
    /// The hydration this operand's output shape resolves to when the
    /// `SetQuery` wrapping it has none of its own: its own hydration if set,
    /// else (recursively, for a nested `SetQuery`) its own leftmost
    /// resolution.
    pub fn leftmost_hydration(&self) -> Option<&HydrationTarget> {
        match self {
            SetOperand::Select(q) => q.hydration.as_ref(),
            SetOperand::Set(q) => q.effective_hydration(),
        }
    }
}

impl From<SelectQuery> for SetOperand {
    fn from(q: SelectQuery) -> Self {
        SetOperand::Select(Box::new(q))
    }
}

impl From<SetQuery> for SetOperand {
    fn from(q: SetQuery) -> Self {
        SetOperand::Set(Box::new(q))
    }
}

/// A `UNION` / `UNION ALL` / `INTERSECT` / `EXCEPT` composition of two
/// statements, each of which may itself be a `SelectQuery` or `SetQuery`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetQuery {
    pub left: SetOperand,
    pub op: SetOp,
    pub right: SetOperand,
    pub order_by_specs: Vec<OrderSpec>,
    pub pending_order: Option<Expr>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub hydration: Option<HydrationTarget>,
}

impl SetQuery {
    fn new(left: impl Into<SetOperand>, op: SetOp, right: impl Into<SetOperand>) -> Self {
        SetQuery {
            left: left.into(),
            op,
            right: right.into(),
            order_by_specs: Vec::new(),
            pending_order: None,
            limit: None,
            offset: None,
            hydration: None,
        }
    }

    pub fn order_by(
        mut self,
        items: impl IntoIterator<Item = impl Into<OrderItem>>,
    ) -> Result<Self, SqlStratumError> {
        let items: Vec<OrderItem> = items.into_iter().map(Into::into).collect();
        let (specs, pending) = split_order_items(items)?;
        self.order_by_specs.extend(specs);
        if pending.is_some() {
            self.pending_order = pending;
        }
        Ok(self)
    }

    pub fn asc(mut self) -> Self {
        if let Some(expr) = self.pending_order.take() {
            self.order_by_specs.push(OrderSpec {
                expr,
                direction: Direction::Asc,
            });
        }
        self
    }

    pub fn desc(mut self) -> Self {
        if let Some(expr) = self.pending_order.take() {
            self.order_by_specs.push(OrderSpec {
                expr,
                direction: Direction::Desc,
            });
        }
        self
    }

    pub fn then(mut self, item: impl Into<OrderItem>) -> Self {
        match item.into() {
            OrderItem::Spec(spec) => self.order_by_specs.push(spec),
            OrderItem::Bare(expr) => self.pending_order = Some(expr),
        }
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn hydrate(mut self, target: HydrationTarget) -> Self {
        self.hydration = Some(target);
        self
    }

    /// This `SetQuery`'s own hydration if set, else the leftmost
    /// `SelectQuery`'s hydration, recursing through nested `SetQuery`s.
    pub fn effective_hydration(&self) -> Option<&HydrationTarget> {
        self.hydration
            .as_ref()
            .or_else(|| self.left.leftmost_hydration())
    }

    pub(crate) fn check_pending_order(&self, dialect: &str) -> Result<(), SqlStratumError> {
        if self.pending_order.is_some() {
            return Err(UnsupportedDialectFeature::new(
                dialect,
                "ORDER_BY requires an explicit direction",
            )
            .into());
        }
        Ok(())
    }
}

/// Blanket trait giving both `SelectQuery` and `SetQuery` the four set-op
/// constructors, so `a.union(b).intersect(c)` composes regardless of which
/// side is already a `SetQuery`.
pub trait SetOps: Into<SetOperand> + Sized {
    fn union(self, other: impl Into<SetOperand>) -> SetQuery {
        SetQuery::new(self, SetOp::Union, other)
    }

    fn union_all(self, other: impl Into<SetOperand>) -> SetQuery {
        SetQuery::new(self, SetOp::UnionAll, other)
    }

    fn intersect(self, other: impl Into<SetOperand>) -> SetQuery {
        SetQuery::new(self, SetOp::Intersect, other)
    }

    fn except(self, other: impl Into<SetOperand>) -> SetQuery {
        SetQuery::new(self, SetOp::Except, other)
    }
}

impl SetOps for SelectQuery {}
impl SetOps for SetQuery {}

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
    fn builders_do_not_mutate_receiver() {
        let base = select(vec![users().col("id").into_expr()]).from_(users());
        let with_limit = base.clone().limit(10);

        assert_eq!(base.limit, None);
        assert_eq!(with_limit.limit, Some(10));
    }

    #[test]
    fn trailing_bare_order_by_is_pending() {
        let q = select(vec![users().col("id").into_expr()])
            .from_(users())
            .order_by(vec![users().col("id").into_expr()])
            .unwrap();
        assert!(q.pending_order.is_some());
        assert!(q.order_by_specs.is_empty());

        let resolved = q.asc();
        assert!(resolved.pending_order.is_none());
        assert_eq!(resolved.order_by_specs.len(), 1);
        assert_eq!(resolved.order_by_specs[0].direction, Direction::Asc);
    }

    #[test]
    fn leading_bare_order_by_is_rejected() {
        let err = select(vec![users().col("id").into_expr()])
            .from_(users())
            .order_by(vec![
                OrderItem::Bare(users().col("id").into_expr()),
                OrderItem::Spec(users().col("email").into_expr().asc()),
            ])
            .unwrap_err();
        assert!(matches!(err, SqlStratumError::InvalidArgument(_)));
    }

    #[test]
    fn set_query_inherits_leftmost_hydration() {
        let left = select(vec![users().col("id").into_expr()])
            .from_(users())
            .hydrate(HydrationTarget::Raw);
        let right = select(vec![users().col("id").into_expr()]).from_(users());
        let set = left.union(right);
        assert!(matches!(set.effective_hydration(), Some(HydrationTarget::Raw)));
    }
}
