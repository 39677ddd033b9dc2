mod orders;
mod scripts;

pub use orders::*;
pub use scripts::*;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::{middleware, Router};

use crate::db::AppState;
use crate::middleware::admin_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // Orders (read-only plus export)
        .route("/api/admin/orders", get(list_orders))
        .route("/api/admin/orders/stats", get(order_stats))
        .route("/api/admin/orders/export", get(export_orders))
        .route("/api/admin/orders/{id}", get(get_order))
        // Script listings
        .route("/api/admin/scripts", get(list_scripts))
        .route("/api/admin/scripts", post(create_script))
        .route("/api/admin/scripts/{id}", get(get_script))
        .route("/api/admin/scripts/{id}", put(update_script))
        .route("/api/admin/scripts/{id}", delete(delete_script))
        .route(
            "/api/admin/scripts/{id}/upload",
            post(upload_script_file)
                // Allow the 10 MB file plus multipart framing overhead
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .layer(middleware::from_fn_with_state(state, admin_auth))
}
