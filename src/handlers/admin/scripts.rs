//! Admin script CRUD and file upload.

use axum::extract::{Multipart, State};
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Path, Query};
use crate::models::{CreateScript, Script, ScriptFilters, UpdateScript};
use crate::pagination::{PageQuery, Paginated};
use crate::util::{file_extension, format_file_size, unique_filename};

const ALLOWED_EXTENSIONS: &[&str] = &["jsx", "jsxbin", "zip"];
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub async fn list_scripts(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(filters): Query<ScriptFilters>,
) -> Result<Json<Paginated<Script>>> {
    let conn = state.db.get()?;
    let (items, total) =
        queries::list_scripts_paginated(&conn, &filters, page.limit(), page.offset())?;
    Ok(Json(Paginated::new(items, total, page.page(), page.limit())))
}

pub async fn get_script(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Script>> {
    let conn = state.db.get()?;
    Ok(Json(
        queries::get_script_by_id(&conn, id)?.or_not_found(msg::SCRIPT_NOT_FOUND)?,
    ))
}

pub async fn create_script(
    State(state): State<AppState>,
    Json(input): Json<CreateScript>,
) -> Result<Json<Script>> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    if input.price_cents < 0 {
        return Err(AppError::BadRequest("Price cannot be negative".into()));
    }
    let conn = state.db.get()?;
    let script = queries::create_script(&conn, &input)?;
    tracing::info!(script = %script.slug, "Script created");
    Ok(Json(script))
}

pub async fn update_script(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateScript>,
) -> Result<Json<Script>> {
    if input.price_cents.map_or(false, |p| p < 0) {
        return Err(AppError::BadRequest("Price cannot be negative".into()));
    }
    let conn = state.db.get()?;
    let script = queries::update_script(&conn, id, &input)?.or_not_found(msg::SCRIPT_NOT_FOUND)?;
    Ok(Json(script))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

pub async fn delete_script(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>> {
    let script = {
        let conn = state.db.get()?;
        let script = queries::get_script_by_id(&conn, id)?.or_not_found(msg::SCRIPT_NOT_FOUND)?;
        queries::delete_script(&conn, id)?;
        script
    };

    // Remove the stored file; a stray file is not worth failing the delete
    if let Some(ref file_name) = script.file_path {
        let path = state.uploads_dir.join("scripts").join(file_name);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), "Could not remove script file: {}", e);
        }
    }
    tracing::info!(script = %script.slug, "Script deleted");
    Ok(Json(DeleteResponse { success: true }))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_path: String,
    pub file_size: String,
}

pub async fn upload_script_file(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let script = {
        let conn = state.db.get()?;
        queries::get_script_by_id(&conn, id)?.or_not_found(msg::SCRIPT_NOT_FOUND)?
    };

    let mut uploaded: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("Missing filename".into()))?;
        let data = field
            .bytes()
            .await
            .map_err(|_| AppError::BadRequest(msg::FILE_TOO_LARGE.into()))?;
        uploaded = Some((original_name, data.to_vec()));
        break;
    }
    let (original_name, data) =
        uploaded.ok_or_else(|| AppError::BadRequest("No file field in request".into()))?;

    let extension = file_extension(&original_name)
        .ok_or_else(|| AppError::BadRequest(msg::FILE_TYPE_NOT_ALLOWED.into()))?;
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::BadRequest(msg::FILE_TYPE_NOT_ALLOWED.into()));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest(msg::FILE_TOO_LARGE.into()));
    }
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    let scripts_dir = state.uploads_dir.join("scripts");
    tokio::fs::create_dir_all(&scripts_dir)
        .await
        .map_err(|e| AppError::Internal(format!("Could not create uploads dir: {}", e)))?;

    let stored_name = unique_filename(&original_name);
    let dest = scripts_dir.join(&stored_name);
    tokio::fs::write(&dest, &data)
        .await
        .map_err(|e| AppError::Internal(format!("Could not store file: {}", e)))?;

    let file_size = format_file_size(data.len() as u64);
    {
        let conn = state.db.get()?;
        queries::set_script_file(&conn, id, &stored_name, &file_size)?;
    }

    // Replace semantics: drop the previous file once the new one is live
    if let Some(ref old_name) = script.file_path {
        if *old_name != stored_name {
            let old_path = scripts_dir.join(old_name);
            if let Err(e) = tokio::fs::remove_file(&old_path).await {
                tracing::warn!(path = %old_path.display(), "Could not remove old file: {}", e);
            }
        }
    }

    tracing::info!(script = %script.slug, file = %stored_name, "Script file uploaded");
    Ok(Json(UploadResponse {
        file_path: stored_name,
        file_size,
    }))
}
