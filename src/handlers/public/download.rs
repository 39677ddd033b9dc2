//! The download gate. Tokens are multi-use until expiry; every valid hit
//! bumps both the order and script download counters. Errors render as
//! small HTML pages since this endpoint is opened in a browser.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Query};
use crate::util::file_extension;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub token: Option<String>,
}

fn error_page(status: StatusCode, title: &str, message: &str) -> Response {
    let body = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title}</title></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 480px; margin: 80px auto; padding: 20px; text-align: center;">
<h1 style="color: #333;">{title}</h1>
<p style="color: #666;">{message}</p>
</body>
</html>"#,
        title = title,
        message = message,
    );
    (status, Html(body)).into_response()
}

fn not_found_page() -> Response {
    error_page(
        StatusCode::NOT_FOUND,
        "Download Not Found",
        "This download link is invalid. Check the link from your confirmation email.",
    )
}

fn expired_page() -> Response {
    error_page(
        StatusCode::GONE,
        "Download Link Expired",
        "This download link has expired. Contact support to get a fresh one.",
    )
}

fn unavailable_page() -> Response {
    error_page(
        StatusCode::NOT_FOUND,
        "File Unavailable",
        "The file for this purchase is currently unavailable. Contact support.",
    )
}

fn content_type_for(filename: &str) -> &'static str {
    match file_extension(filename).as_deref() {
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

pub async fn download_file(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response> {
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return Ok(not_found_page());
    };

    let download = {
        let conn = state.db.get()?;
        queries::get_order_download_by_token(&conn, &token)?
    };
    let Some(download) = download else {
        return Ok(not_found_page());
    };

    let now = chrono::Utc::now().timestamp();
    if download.order.token_expires_at.map_or(true, |exp| exp < now) {
        return Ok(expired_page());
    }

    let Some(ref file_name) = download.file_path else {
        tracing::error!(
            order = %download.order.order_id,
            "Completed order points at a script with no file"
        );
        return Ok(unavailable_page());
    };
    let path = state.uploads_dir.join("scripts").join(file_name);
    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(
                order = %download.order.order_id,
                path = %path.display(),
                "Script file unreadable: {}",
                e
            );
            return Ok(unavailable_page());
        }
    };

    {
        let conn = state.db.get()?;
        queries::increment_order_download_count(&conn, download.order.id)?;
        queries::increment_script_downloads(&conn, download.order.script_id)?;
    }
    tracing::info!(
        order = %download.order.order_id,
        script = %download.script_slug,
        "Download served"
    );

    // Download as the slug so buyers get a clean filename
    let served_name = match file_extension(file_name) {
        Some(ext) => format!("{}.{}", download.script_slug, ext),
        None => download.script_slug.clone(),
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(file_name).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", served_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub script_name: String,
    pub script_slug: String,
    pub expires_at: Option<i64>,
    pub download_count: i64,
}

/// JSON check used by the storefront success page to render link state
/// without triggering a download. Unknown tokens are 404, expired 410.
pub async fn verify_download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Json<VerifyResponse>> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::NotFound(msg::DOWNLOAD_LINK_INVALID.into()))?;

    let conn = state.db.get()?;
    let download = queries::get_order_download_by_token(&conn, &token)?
        .or_not_found(msg::DOWNLOAD_LINK_INVALID)?;

    let now = chrono::Utc::now().timestamp();
    if download.order.token_expires_at.map_or(true, |exp| exp < now) {
        return Err(AppError::Gone(msg::DOWNLOAD_LINK_EXPIRED.into()));
    }

    Ok(Json(VerifyResponse {
        valid: true,
        script_name: download.script_name,
        script_slug: download.script_slug,
        expires_at: download.order.token_expires_at,
        download_count: download.order.download_count,
    }))
}
