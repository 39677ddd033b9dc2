mod from_row;
mod schema;
pub mod queries;

pub use from_row::{query_all, query_one, FromRow};
pub use schema::init_db;

use std::path::PathBuf;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::email::Mailer;
use crate::payments::PayPalClient;
use crate::session::SessionStore;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Storefront database pool (scripts, orders, users)
    pub db: DbPool,
    /// Base URL for download links embedded in emails
    pub base_url: String,
    /// Directory where uploaded script files live
    pub uploads_dir: PathBuf,
    /// PayPal REST client; None when credentials are not configured
    pub paypal: Option<PayPalClient>,
    /// Transactional mailer (may be disabled)
    pub mailer: Mailer,
    /// In-memory admin session store
    pub sessions: SessionStore,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
