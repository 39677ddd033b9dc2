//! Download gate tests: token resolution, expiry, and the dual counters.

mod common;

use common::*;

#[test]
fn test_valid_token_resolves_download() {
    let conn = setup_test_db();
    let script = create_published_script(&conn, "Layer Export Pro", 1200);
    queries::set_script_file(&conn, script.id, "layer-export-pro-abc123.jsx", "1.25 MB").unwrap();
    let (order, token) = create_completed_order(&conn, &script);

    let download = queries::get_order_download_by_token(&conn, &token)
        .unwrap()
        .unwrap();
    assert_eq!(download.order.id, order.id);
    assert_eq!(download.script_name, "Layer Export Pro");
    assert_eq!(download.script_slug, "layer-export-pro");
    assert_eq!(
        download.file_path.as_deref(),
        Some("layer-export-pro-abc123.jsx")
    );
}

#[test]
fn test_unknown_token_resolves_nothing() {
    let conn = setup_test_db();
    let script = create_published_script(&conn, "Layer Export Pro", 1200);
    create_completed_order(&conn, &script);

    assert!(queries::get_order_download_by_token(&conn, "feedbead")
        .unwrap()
        .is_none());
}

#[test]
fn test_pending_order_token_is_never_issued() {
    let conn = setup_test_db();
    let script = create_published_script(&conn, "Layer Export Pro", 1200);
    let order = create_pending_order(&conn, &script, "PAY-1");
    assert!(order.download_token.is_none());
}

#[test]
fn test_expired_token_still_resolves_but_is_past_expiry() {
    // The query only checks completion; the handler enforces expiry.
    let conn = setup_test_db();
    let script = create_published_script(&conn, "Layer Export Pro", 1200);
    let order = create_pending_order(&conn, &script, "PAY-1");
    let token = generate_download_token();
    let past = chrono::Utc::now().timestamp() - 60;
    assert!(queries::complete_order(&conn, order.id, Some("CAP-1"), &token, past).unwrap());

    let download = queries::get_order_download_by_token(&conn, &token)
        .unwrap()
        .unwrap();
    let now = chrono::Utc::now().timestamp();
    assert!(download.order.token_expires_at.unwrap() < now);
}

#[test]
fn test_counters_increment_independently() {
    let conn = setup_test_db();
    let script = create_published_script(&conn, "Layer Export Pro", 1200);
    let (order, token) = create_completed_order(&conn, &script);

    // Two downloads of the same order
    for _ in 0..2 {
        queries::increment_order_download_count(&conn, order.id).unwrap();
        queries::increment_script_downloads(&conn, script.id).unwrap();
    }

    let download = queries::get_order_download_by_token(&conn, &token)
        .unwrap()
        .unwrap();
    assert_eq!(download.order.download_count, 2);

    let script = queries::get_script_by_id(&conn, script.id).unwrap().unwrap();
    assert_eq!(script.downloads, 2);
}

#[test]
fn test_script_counter_aggregates_across_orders() {
    let conn = setup_test_db();
    let script = create_published_script(&conn, "Layer Export Pro", 1200);

    let a = create_pending_order(&conn, &script, "PAY-A");
    let b = create_pending_order(&conn, &script, "PAY-B");
    let expires = chrono::Utc::now().timestamp() + 1000;
    queries::complete_order(&conn, a.id, Some("CAP-A"), &generate_download_token(), expires)
        .unwrap();
    queries::complete_order(&conn, b.id, Some("CAP-B"), &generate_download_token(), expires)
        .unwrap();

    queries::increment_order_download_count(&conn, a.id).unwrap();
    queries::increment_script_downloads(&conn, script.id).unwrap();
    queries::increment_order_download_count(&conn, b.id).unwrap();
    queries::increment_script_downloads(&conn, script.id).unwrap();

    let script = queries::get_script_by_id(&conn, script.id).unwrap().unwrap();
    assert_eq!(script.downloads, 2);
}
