use serde::{Deserialize, Serialize};

/// An admin back-office account. The password hash never leaves the
/// queries layer; this struct is safe to serialize in responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: i64,
    pub updated_at: i64,
}
