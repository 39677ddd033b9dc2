//! In-memory session store for admin authentication.
//!
//! Sessions are bearer tokens handed out at login and held in process
//! memory. A server restart logs everyone out, which is acceptable for
//! a single-admin back office.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use crate::util::generate_session_token;

/// Sessions idle out after 24 hours.
const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub created_at: i64,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session and return its bearer token.
    pub fn create(&self, user_id: i64, email: &str, name: &str) -> String {
        let token = generate_session_token();
        let session = Session {
            user_id,
            email: email.to_string(),
            name: name.to_string(),
            created_at: Utc::now().timestamp(),
        };
        // A poisoned lock still holds a usable map; take the guard anyway.
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.insert(token.clone(), session);
        token
    }

    /// Look up a session, dropping it if past the TTL.
    pub fn get(&self, token: &str) -> Option<Session> {
        let now = Utc::now().timestamp();
        {
            let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
            match map.get(token) {
                Some(s) if now - s.created_at <= SESSION_TTL_SECS => return Some(s.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.remove(token);
        None
    }

    pub fn remove(&self, token: &str) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.remove(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let store = SessionStore::new();
        let token = store.create(1, "admin@example.com", "Admin");
        assert_eq!(token.len(), 64);
        let session = store.get(&token).unwrap();
        assert_eq!(session.user_id, 1);
        assert_eq!(session.email, "admin@example.com");
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new();
        let token = store.create(1, "admin@example.com", "Admin");
        store.remove(&token);
        assert!(store.get(&token).is_none());
    }

    #[test]
    fn test_unknown_token() {
        let store = SessionStore::new();
        assert!(store.get("deadbeef").is_none());
    }
}
