//! Admin order listing, filter, stats, and export tests.

mod common;

use adoscript::handlers::admin::orders_to_csv;
use common::*;

fn seed_orders(conn: &rusqlite::Connection) -> (Script, Script) {
    let a = create_published_script(conn, "Layer Export Pro", 1200);
    let b = create_published_script(conn, "Batch Rename Toolkit", 800);

    // Two completed, one pending, one failed
    create_completed_order(conn, &a);
    create_completed_order(conn, &b);
    create_pending_order(conn, &a, "PAY-PENDING");
    let failed = create_pending_order(conn, &b, "PAY-FAILED");
    queries::fail_order(conn, failed.id).unwrap();

    (a, b)
}

#[test]
fn test_list_orders_with_script_names() {
    let conn = setup_test_db();
    seed_orders(&conn);

    let (items, total) =
        queries::list_orders_paginated(&conn, &Default::default(), 50, 0).unwrap();
    assert_eq!(total, 4);
    assert!(items.iter().all(|o| o.script_name.is_some()));
}

#[test]
fn test_status_filter() {
    let conn = setup_test_db();
    seed_orders(&conn);

    let completed = OrderFilters {
        status: Some(OrderStatus::Completed),
        ..Default::default()
    };
    let (items, total) = queries::list_orders_paginated(&conn, &completed, 50, 0).unwrap();
    assert_eq!(total, 2);
    assert!(items
        .iter()
        .all(|o| o.order.status == OrderStatus::Completed));
}

#[test]
fn test_search_matches_script_name_and_email() {
    let conn = setup_test_db();
    seed_orders(&conn);

    let by_script = OrderFilters {
        search: Some("Batch Rename".to_string()),
        ..Default::default()
    };
    let (_, total) = queries::list_orders_paginated(&conn, &by_script, 50, 0).unwrap();
    assert_eq!(total, 2);

    let by_email = OrderFilters {
        search: Some("buyer@example.com".to_string()),
        ..Default::default()
    };
    let (_, total) = queries::list_orders_paginated(&conn, &by_email, 50, 0).unwrap();
    assert_eq!(total, 4);

    let no_match = OrderFilters {
        search: Some("nobody".to_string()),
        ..Default::default()
    };
    let (_, total) = queries::list_orders_paginated(&conn, &no_match, 50, 0).unwrap();
    assert_eq!(total, 0);
}

#[test]
fn test_date_bounds() {
    let conn = setup_test_db();
    seed_orders(&conn);
    let now = chrono::Utc::now().timestamp();

    let future_only = OrderFilters {
        date_from: Some(now + 3600),
        ..Default::default()
    };
    let (_, total) = queries::list_orders_paginated(&conn, &future_only, 50, 0).unwrap();
    assert_eq!(total, 0);

    let up_to_now = OrderFilters {
        date_to: Some(now + 3600),
        ..Default::default()
    };
    let (_, total) = queries::list_orders_paginated(&conn, &up_to_now, 50, 0).unwrap();
    assert_eq!(total, 4);
}

#[test]
fn test_order_stats() {
    let conn = setup_test_db();
    seed_orders(&conn);

    let stats = queries::order_stats(&conn).unwrap();
    assert_eq!(stats.total_orders, 4);
    // Completed revenue: 1200 + 800
    assert_eq!(stats.total_revenue_cents, 2000);
    assert_eq!(stats.month_revenue_cents, 2000);
    assert_eq!(stats.avg_order_cents, 1000);

    let completed = stats
        .by_status
        .iter()
        .find(|s| s.status == "completed")
        .unwrap();
    assert_eq!(completed.count, 2);
}

#[test]
fn test_export_rows_and_csv() {
    let conn = setup_test_db();
    seed_orders(&conn);

    let rows = queries::export_orders(&conn, &Default::default()).unwrap();
    assert_eq!(rows.len(), 4);

    let csv = orders_to_csv(&rows);
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("Order ID,Script,Customer Email,Amount,Payment Method,Status,Date")
    );
    assert_eq!(lines.count(), 4);
    assert!(csv.contains("$12.00"));
    assert!(csv.contains("$8.00"));
    assert!(csv.contains("paypal"));
}

#[test]
fn test_export_respects_filters() {
    let conn = setup_test_db();
    seed_orders(&conn);

    let failed_only = OrderFilters {
        status: Some(OrderStatus::Failed),
        ..Default::default()
    };
    let rows = queries::export_orders(&conn, &failed_only).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, "failed");
}
