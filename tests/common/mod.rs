//! Test utilities and fixtures for Adoscript integration tests

#![allow(dead_code)]

use rusqlite::Connection;

pub use adoscript::db::{init_db, queries};
pub use adoscript::models::*;
pub use adoscript::util::{generate_download_token, generate_order_code};

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create a draft script with default values
pub fn create_test_script(conn: &Connection, name: &str) -> Script {
    queries::create_script(
        conn,
        &CreateScript {
            name: name.to_string(),
            application: "photoshop".to_string(),
            version: None,
            short_description: Some(format!("{} description", name)),
            price_type: PriceType::Paid,
            price_cents: 1200,
            status: None,
        },
    )
    .expect("Failed to create test script")
}

/// Create a published paid script
pub fn create_published_script(conn: &Connection, name: &str, price_cents: i64) -> Script {
    queries::create_script(
        conn,
        &CreateScript {
            name: name.to_string(),
            application: "photoshop".to_string(),
            version: None,
            short_description: None,
            price_type: if price_cents > 0 {
                PriceType::Paid
            } else {
                PriceType::Free
            },
            price_cents,
            status: Some(ScriptStatus::Published),
        },
    )
    .expect("Failed to create published script")
}

/// Create a pending order against a script
pub fn create_pending_order(conn: &Connection, script: &Script, payment_id: &str) -> Order {
    queries::create_pending_order(
        conn,
        &CreateOrder {
            order_id: generate_order_code(),
            script_id: script.id,
            customer_email: "buyer@example.com".to_string(),
            amount_cents: script.price_cents,
            payment_id: payment_id.to_string(),
        },
    )
    .expect("Failed to create pending order")
}

/// Create an order and complete it, returning the order and its token
pub fn create_completed_order(conn: &Connection, script: &Script) -> (Order, String) {
    let order = create_pending_order(conn, script, &format!("PAY-{}", script.id));
    let token = generate_download_token();
    let expires_at = chrono::Utc::now().timestamp() + 7 * 24 * 60 * 60;
    let done = queries::complete_order(conn, order.id, Some("CAP-TEST"), &token, expires_at)
        .expect("Failed to complete order");
    assert!(done);
    (order, token)
}

/// Create an admin user with the given password
pub fn create_test_user(conn: &Connection, email: &str, password: &str) -> User {
    let hash = adoscript::password::hash_password(password).expect("Failed to hash password");
    queries::create_user(conn, email, &hash, "Test Admin").expect("Failed to create test user")
}
