//! Builder-level tests for SQL assembly, binding order and routing.
//!
//! These run against lazily constructed pools: nothing here touches a
//! database, because `to_sql()`/`bindings()` are pure and validation errors
//! surface before execution.

use crate::config::{ConnectionParams, DatabaseConfig};
use crate::router::{ConnectionRouter, Target};
use crate::table;
use crate::value::Value;

fn router() -> ConnectionRouter {
    let params = ConnectionParams::new("127.0.0.1", "rwsql_test", "root", "");
    ConnectionRouter::connect_lazy(DatabaseConfig::single(params))
}

#[tokio::test]
async fn test_select_defaults_to_star() {
    let r = router();
    let qb = table(&r, "users");
    assert_eq!(qb.to_sql(), "SELECT * FROM users");
    assert!(qb.bindings().is_empty());
}

#[tokio::test]
async fn test_select_replaces_columns_wholesale() {
    let r = router();
    let qb = table(&r, "users")
        .select(&["id", "name"])
        .select(&["email"]);
    assert_eq!(qb.to_sql(), "SELECT email FROM users");
}

#[tokio::test]
async fn test_where_chain_scenario() {
    // Scenario from the original behavior: filters, ordering and paging.
    let r = router();
    let qb = table(&r, "users")
        .and_where_eq("status", "active")
        .order_by("created_at", "desc")
        .limit(10)
        .offset(5);
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE status = ? ORDER BY created_at DESC LIMIT 10 OFFSET 5"
    );
    assert_eq!(qb.bindings(), &[Value::Text("active".to_string())]);
}

#[tokio::test]
async fn test_or_where_connector_rendering() {
    let r = router();
    let qb = table(&r, "users")
        .and_where_eq("role", "admin")
        .or_where_eq("role", "owner")
        .and_where("age", ">", 18i32);
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users WHERE role = ? OR role = ? AND age > ?"
    );
    assert_eq!(qb.bindings().len(), 3);
}

#[tokio::test]
async fn test_bindings_align_with_placeholders() {
    let r = router();
    let qb = table(&r, "orders")
        .and_where("total", ">=", 100i64)
        .where_in("status", vec!["open", "paid"])
        .or_where_eq("priority", true);
    let sql = qb.to_sql();
    assert_eq!(sql.matches('?').count(), qb.bindings().len());
    assert_eq!(
        qb.bindings(),
        &[
            Value::Int(100),
            Value::Text("open".to_string()),
            Value::Text("paid".to_string()),
            Value::Bool(true),
        ]
    );
}

#[tokio::test]
async fn test_where_in_expands_one_placeholder_per_value() {
    let r = router();
    let qb = table(&r, "users").where_in("id", vec![1i64, 2, 3]);
    assert_eq!(qb.to_sql(), "SELECT * FROM users WHERE id IN (?, ?, ?)");
    assert_eq!(
        qb.bindings(),
        &[Value::Int(1), Value::Int(2), Value::Int(3)]
    );
}

#[tokio::test]
async fn test_where_not_in() {
    let r = router();
    let qb = table(&r, "users").where_not_in("status", vec!["banned"]);
    assert_eq!(qb.to_sql(), "SELECT * FROM users WHERE status NOT IN (?)");
}

#[tokio::test]
async fn test_empty_where_in_is_a_no_op() {
    let r = router();
    let before = table(&r, "users").and_where_eq("status", "active");
    let before_sql = before.to_sql();
    let before_bindings = before.bindings().to_vec();

    let after = before.where_in("id", Vec::<i64>::new());
    assert_eq!(after.to_sql(), before_sql);
    assert_eq!(after.bindings(), &before_bindings[..]);
}

#[tokio::test]
async fn test_joins_render_in_call_order_without_bindings() {
    let r = router();
    let qb = table(&r, "users")
        .join("orders", "users.id", "=", "orders.user_id")
        .left_join("profiles", "users.id", "=", "profiles.user_id")
        .and_where_eq("users.status", "active");
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM users \
         INNER JOIN orders ON users.id = orders.user_id \
         LEFT JOIN profiles ON users.id = profiles.user_id \
         WHERE users.status = ?"
    );
    assert_eq!(qb.bindings().len(), 1);
}

#[tokio::test]
async fn test_order_by_normalizes_direction() {
    let r = router();
    let qb = table(&r, "users").order_by("x", "invalid");
    assert_eq!(qb.to_sql(), "SELECT * FROM users ORDER BY x ASC");

    let qb = table(&r, "users").order_by("x", "DeSc").order_by_asc("y");
    assert_eq!(qb.to_sql(), "SELECT * FROM users ORDER BY x DESC, y ASC");
}

#[tokio::test]
async fn test_group_by_accumulates() {
    let r = router();
    let qb = table(&r, "orders")
        .select(&["user_id", "COUNT(*) AS n"])
        .group_by(&["user_id"])
        .group_by(&["status"]);
    assert_eq!(
        qb.to_sql(),
        "SELECT user_id, COUNT(*) AS n FROM orders GROUP BY user_id, status"
    );
}

#[tokio::test]
async fn test_clause_order_is_fixed() {
    let r = router();
    // Call fragments out of render order; the assembled text keeps the
    // fixed clause order regardless.
    let qb = table(&r, "events")
        .limit(5)
        .order_by("at", "desc")
        .group_by(&["kind"])
        .and_where_eq("tenant", 7i64)
        .join("kinds", "events.kind", "=", "kinds.id");
    assert_eq!(
        qb.to_sql(),
        "SELECT * FROM events INNER JOIN kinds ON events.kind = kinds.id \
         WHERE tenant = ? GROUP BY kind ORDER BY at DESC LIMIT 5"
    );
}

#[tokio::test]
async fn test_aggregate_sql_replaces_column_selection() {
    let r = router();
    let qb = table(&r, "users")
        .select(&["id", "name"])
        .and_where_eq("status", "active");
    assert_eq!(
        qb.to_aggregate_sql("COUNT", "*"),
        "SELECT COUNT(*) AS aggregate FROM users WHERE status = ?"
    );
    assert_eq!(
        qb.to_aggregate_sql("SUM", "total"),
        "SELECT SUM(total) AS aggregate FROM users WHERE status = ?"
    );
}

#[tokio::test]
async fn test_find_builds_the_where_eq_first_chain() {
    // find(id) runs find_query(id).first(); find_query is the whole chain
    // construction, so its output must match the hand-written equivalent.
    let r = router();
    let found = table(&r, "users").find_query(42i64);
    let by_hand = table(&r, "users").and_where_eq("id", 42i64).first_query();
    assert_eq!(found.to_sql(), by_hand.to_sql());
    assert_eq!(found.to_sql(), "SELECT * FROM users WHERE id = ? LIMIT 1");
    assert_eq!(found.bindings(), &[Value::Int(42)]);
}

#[tokio::test]
async fn test_insert_sql_follows_data_order() {
    let r = router();
    let (sql, values) = table(&r, "users").to_insert_sql(&[
        ("username", "alice".into()),
        ("email", "alice@example.com".into()),
        ("age", 30i32.into()),
    ]);
    assert_eq!(
        sql,
        "INSERT INTO users (username, email, age) VALUES (?, ?, ?)"
    );
    assert_eq!(values.len(), 3);
    assert_eq!(values[2], Value::Int(30));
}

#[tokio::test]
async fn test_update_sql_set_values_precede_where_bindings() {
    let r = router();
    let qb = table(&r, "users")
        .and_where_eq("id", 9i64)
        .and_where("age", ">", 18i32);
    let (sql, values) = qb.to_update_sql(&[("status", "inactive".into())]);
    assert_eq!(
        sql,
        "UPDATE users SET status = ? WHERE id = ? AND age > ?"
    );
    assert_eq!(
        values,
        vec![
            Value::Text("inactive".to_string()),
            Value::Int(9),
            Value::Int(18),
        ]
    );
    assert_eq!(sql.matches('?').count(), values.len());
}

#[tokio::test]
async fn test_update_without_predicates_touches_whole_table() {
    let r = router();
    let (sql, _) = table(&r, "users").to_update_sql(&[("status", "archived".into())]);
    assert_eq!(sql, "UPDATE users SET status = ?");
}

#[tokio::test]
async fn test_delete_sql_with_in_list() {
    let r = router();
    let qb = table(&r, "users").where_in("id", vec![1i64, 2, 3]);
    let (sql, values) = qb.to_delete_sql();
    assert_eq!(sql, "DELETE FROM users WHERE id IN (?, ?, ?)");
    assert_eq!(
        values,
        vec![Value::Int(1), Value::Int(2), Value::Int(3)]
    );
}

#[tokio::test]
async fn test_delete_without_predicates_is_unrestricted() {
    let r = router();
    let (sql, values) = table(&r, "users").to_delete_sql();
    assert_eq!(sql, "DELETE FROM users");
    assert!(values.is_empty());
}

#[tokio::test]
async fn test_reads_route_to_replica_until_forced_to_primary() {
    // route(false) is what every read terminal resolves the pool with.
    let r = router();
    let qb = table(&r, "users").and_where_eq("status", "active");
    assert_eq!(qb.route(false), Target::Read);

    let qb = qb.use_write_connection();
    assert_eq!(qb.route(false), Target::Write);
}

#[tokio::test]
async fn test_write_terminals_route_to_primary_regardless_of_flag() {
    // insert/update/delete resolve with route(true), which is Write whether
    // or not use_write_connection was called.
    let r = router();
    assert_eq!(table(&r, "users").route(true), Target::Write);
    assert_eq!(
        table(&r, "users").use_write_connection().route(true),
        Target::Write
    );
}

#[tokio::test]
async fn test_to_sql_is_deterministic_and_pure() {
    let r = router();
    let qb = table(&r, "users")
        .and_where_eq("status", "active")
        .where_in("role", vec!["admin", "user"])
        .order_by("id", "asc");
    let first = qb.to_sql();
    let second = qb.to_sql();
    assert_eq!(first, second);
    assert_eq!(qb.bindings().len(), 3);
}

#[tokio::test]
async fn test_empty_update_set_is_rejected() {
    let r = router();
    let err = table(&r, "users")
        .and_where_eq("id", 1i64)
        .update(&[])
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_empty_insert_is_rejected() {
    let r = router();
    let err = table(&r, "users").insert(&[]).await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_empty_table_name_is_a_config_error() {
    let r = router();
    let err = table(&r, "").get().await.unwrap_err();
    assert!(err.is_config());

    let err = table(&r, "  ").delete().await.unwrap_err();
    assert!(err.is_config());
}
