//! Admin account and session tests.

mod common;

use adoscript::password::{hash_password, verify_password};
use adoscript::session::SessionStore;
use common::*;

#[test]
fn test_create_user_normalizes_email() {
    let conn = setup_test_db();
    let user = create_test_user(&conn, "  Admin@Adoscript.COM ", "admin123");
    assert_eq!(user.email, "admin@adoscript.com");
    assert_eq!(user.role, "admin");
    assert_eq!(queries::count_users(&conn).unwrap(), 1);
}

#[test]
fn test_login_lookup_verifies_password() {
    let conn = setup_test_db();
    create_test_user(&conn, "admin@adoscript.com", "admin123");

    let (user, hash) = queries::get_user_with_password(&conn, "admin@adoscript.com")
        .unwrap()
        .unwrap();
    assert_eq!(user.email, "admin@adoscript.com");
    assert!(verify_password("admin123", &hash));
    assert!(!verify_password("wrong-password", &hash));

    // Lookup is case-insensitive on email
    assert!(queries::get_user_with_password(&conn, "ADMIN@adoscript.com")
        .unwrap()
        .is_some());
    assert!(queries::get_user_with_password(&conn, "nobody@example.com")
        .unwrap()
        .is_none());
}

#[test]
fn test_change_password_flow() {
    let conn = setup_test_db();
    let user = create_test_user(&conn, "admin@adoscript.com", "admin123");

    let new_hash = hash_password("a-much-better-one").unwrap();
    assert!(queries::update_password(&conn, user.id, &new_hash).unwrap());

    let (_, stored) = queries::get_user_with_password(&conn, "admin@adoscript.com")
        .unwrap()
        .unwrap();
    assert!(verify_password("a-much-better-one", &stored));
    assert!(!verify_password("admin123", &stored));
}

#[test]
fn test_user_serialization_has_no_hash() {
    let conn = setup_test_db();
    let user = create_test_user(&conn, "admin@adoscript.com", "admin123");
    let json = serde_json::to_string(&user).unwrap();
    assert!(!json.contains("password"));
    assert!(!json.contains("argon2"));
}

#[test]
fn test_session_lifecycle() {
    let store = SessionStore::new();
    let token = store.create(1, "admin@adoscript.com", "Admin");

    let session = store.get(&token).unwrap();
    assert_eq!(session.user_id, 1);

    store.remove(&token);
    assert!(store.get(&token).is_none());
}

#[test]
fn test_session_tokens_are_distinct() {
    let store = SessionStore::new();
    let a = store.create(1, "admin@adoscript.com", "Admin");
    let b = store.create(1, "admin@adoscript.com", "Admin");
    assert_ne!(a, b);
    // Both remain valid until removed
    assert!(store.get(&a).is_some());
    assert!(store.get(&b).is_some());
}
