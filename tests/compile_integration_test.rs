use sqlstratum::compile::Compile;
use sqlstratum::sql::bind::with_dialect;
use sqlstratum::sql::dialect::Dialect;
use sqlstratum::sql::dml::{insert, update};
use sqlstratum::sql::expr::{and, count_of, exists, or};
use sqlstratum::sql::hydrate::HydrationTarget;
use sqlstratum::sql::meta::{Table, ValueType};
use sqlstratum::sql::query::{select, SetOps};
use sqlstratum::sql::value::Value;

fn users() -> Table {
    Table::new(
        "users",
        vec![
            ("id", ValueType::Int),
            ("email", ValueType::Text),
            ("org_id", ValueType::Int),
        ],
    )
}

fn orders() -> Table {
    Table::new(
        "orders",
        vec![("id", ValueType::Int), ("user_id", ValueType::Int)],
    )
}

#[test]
fn join_with_subquery_and_grouping_compiles() {
    let recent_orders = select(vec![orders().col("user_id").into_expr()])
        .from_(orders())
        .as_("recent");

    let q = select(vec![
        users().col("id").into_expr(),
        count_of(users().col("id").into_expr()).alias("total"),
    ])
    .from_(users())
    .join(
        recent_orders,
        users()
            .col("id")
            .into_expr()
            .eq(orders().col("user_id").into_expr()),
    )
    .where_(vec![and(vec![
        users().col("org_id").into_expr().eq(1i64),
        or(vec![
            users().col("email").into_expr().contains("example.com"),
            users().col("email").into_expr().is_not_null(),
        ]),
    ])])
    .group_by(vec![users().col("id").into_expr()])
    .having(vec![count_of(users().col("id").into_expr()).ge(1i64)])
    .hydrate(HydrationTarget::Raw);

    let compiled = q.compile("sqlite").unwrap();
    assert!(compiled.sql.contains("JOIN"));
    assert!(compiled.sql.contains("GROUP BY"));
    assert!(compiled.sql.contains("HAVING"));
}

#[test]
fn union_inherits_left_hydration_and_compiles() {
    let a = select(vec![users().col("id").into_expr()])
        .from_(users())
        .hydrate(HydrationTarget::Raw);
    let b = select(vec![users().col("id").into_expr()]).from_(users());

    let unioned = a
        .union(b)
        .order_by(vec![users().col("id").into_expr().asc()])
        .unwrap()
        .limit(5);

    assert!(matches!(
        unioned.effective_hydration(),
        Some(HydrationTarget::Raw)
    ));

    let compiled = unioned.compile("sqlite").unwrap();
    assert!(compiled.sql.contains("UNION"));
    assert!(compiled.sql.contains("ORDER BY"));
    assert!(compiled.sql.contains("LIMIT"));
}

#[test]
fn exists_subquery_compiles_against_both_dialects() {
    let q = select(vec![users().col("id").into_expr()])
        .from_(users())
        .where_(vec![exists(
            select(vec![orders().col("id").into_expr()])
                .from_(orders())
                .where_(vec![orders()
                    .col("user_id")
                    .into_expr()
                    .eq(users().col("id").into_expr())]),
        )]);

    for dialect in ["sqlite", "mysql"] {
        let compiled = q.clone().compile(dialect).unwrap();
        assert!(compiled.sql.contains("EXISTS"));
    }
}

#[test]
fn dialect_bound_query_rejects_compilation_under_wrong_dialect() {
    let q = select(vec![users().col("id").into_expr()]).from_(users());
    let bound = with_dialect(q, Dialect::Sqlite).unwrap();
    let err = sqlstratum::compile_bound(&bound, Some("mysql")).unwrap_err();
    assert!(err.to_string().contains("bound to dialect"));
}

#[test]
fn insert_then_update_round_trip_params() {
    let insert_q = insert(users()).values(vec![
        ("email", Value::Text("a@b.com".into())),
        ("org_id", Value::Int(3)),
    ]);
    let insert_compiled = insert_q.compile("mysql").unwrap();
    assert!(insert_compiled.sql.starts_with("INSERT INTO `users`"));

    let update_q = update(users())
        .set(vec![("email", Value::Text("b@c.com".into()))])
        .where_(vec![users().col("id").into_expr().eq(1i64)]);
    let update_compiled = update_q.compile("mysql").unwrap();
    assert!(update_compiled.sql.starts_with("UPDATE `users` SET"));
    assert_eq!(update_compiled.params.len(), 2);
}
