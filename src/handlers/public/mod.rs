mod catalog;
mod checkout;
mod download;

pub use catalog::*;
pub use checkout::*;
pub use download::*;

use axum::routing::{get, post};
use axum::Router;

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/scripts", get(list_catalog))
        .route("/api/scripts/{slug}", get(get_catalog_script))
        .route("/api/checkout/create-order", post(create_checkout_order))
        .route("/api/checkout/capture-order", post(capture_checkout_order))
        .route("/api/checkout/client-id", get(client_id))
        .route("/download", get(download_file))
        .route("/api/download/verify", get(verify_download))
}

async fn health() -> &'static str {
    "OK"
}
