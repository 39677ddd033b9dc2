//! Public script catalog. Only published listings are visible, and the
//! storage path never leaves the server.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, OptionExt, Result};
use crate::extractors::{Json, Path, Query};
use crate::models::{PriceType, Script, ScriptFilters, ScriptStatus};
use crate::pagination::{PageQuery, Paginated};

/// Public view of a script: everything a storefront page needs, minus
/// the storage fields.
#[derive(Debug, Serialize)]
pub struct CatalogScript {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub application: String,
    pub version: String,
    pub short_description: Option<String>,
    pub price_type: PriceType,
    pub price: String,
    pub downloads: i64,
}

impl From<Script> for CatalogScript {
    fn from(script: Script) -> Self {
        Self {
            id: script.id,
            name: script.name.clone(),
            slug: script.slug.clone(),
            application: script.application.clone(),
            version: script.version.clone(),
            short_description: script.short_description.clone(),
            price_type: script.price_type,
            price: script.price(),
            downloads: script.downloads,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub application: Option<String>,
    pub price_type: Option<PriceType>,
    pub search: Option<String>,
}

pub async fn list_catalog(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<CatalogQuery>,
) -> Result<Json<Paginated<CatalogScript>>> {
    let conn = state.db.get()?;
    let filters = ScriptFilters {
        application: filter.application,
        price_type: filter.price_type,
        search: filter.search,
        status: Some(ScriptStatus::Published),
    };
    let (scripts, total) =
        queries::list_scripts_paginated(&conn, &filters, page.limit(), page.offset())?;
    let items = scripts.into_iter().map(CatalogScript::from).collect();
    Ok(Json(Paginated::new(items, total, page.page(), page.limit())))
}

pub async fn get_catalog_script(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CatalogScript>> {
    let conn = state.db.get()?;
    let script = queries::get_published_script_by_slug(&conn, &slug)?
        .or_not_found(msg::SCRIPT_NOT_FOUND)?;
    Ok(Json(script.into()))
}
