//! Admin order listing, stats, and CSV export.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::{Json, Path, Query};
use crate::models::{OrderExportRow, OrderFilters, OrderStats, OrderStatus, OrderWithScript};
use crate::pagination::{PageQuery, Paginated};
use crate::util::cents_to_decimal;

/// Filter query as it arrives over HTTP. Dates are calendar days; they
/// widen to inclusive timestamp bounds on created_at.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub payment_method: Option<String>,
    pub search: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub date_from: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub date_to: Option<String>,
}

fn parse_day(value: &str, field: &str) -> Result<NaiveDate> {
    value
        .parse::<NaiveDate>()
        .map_err(|_| AppError::BadRequest(format!("{} must be YYYY-MM-DD", field)))
}

impl OrderListQuery {
    fn into_filters(self) -> Result<OrderFilters> {
        let date_from = match self.date_from.as_deref() {
            Some(d) => Some(
                parse_day(d, "date_from")?
                    .and_hms_opt(0, 0, 0)
                    .map(|dt| dt.and_utc().timestamp())
                    .unwrap_or(0),
            ),
            None => None,
        };
        let date_to = match self.date_to.as_deref() {
            Some(d) => Some(
                parse_day(d, "date_to")?
                    .and_hms_opt(23, 59, 59)
                    .map(|dt| dt.and_utc().timestamp())
                    .unwrap_or(0),
            ),
            None => None,
        };
        Ok(OrderFilters {
            status: self.status,
            payment_method: self.payment_method,
            search: self.search,
            date_from,
            date_to,
        })
    }
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<OrderListQuery>,
) -> Result<Json<Paginated<OrderWithScript>>> {
    let filters = filter.into_filters()?;
    let conn = state.db.get()?;
    let (items, total) =
        queries::list_orders_paginated(&conn, &filters, page.limit(), page.offset())?;
    Ok(Json(Paginated::new(items, total, page.page(), page.limit())))
}

/// Lookup by numeric id or by order code ("ORD-...").
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderWithScript>> {
    let conn = state.db.get()?;
    let order = match id.parse::<i64>() {
        Ok(numeric) => queries::get_order_with_script(&conn, numeric)?,
        Err(_) => queries::get_order_by_code(&conn, &id)?,
    };
    Ok(Json(order.or_not_found(msg::ORDER_NOT_FOUND)?))
}

pub async fn order_stats(State(state): State<AppState>) -> Result<Json<OrderStats>> {
    let conn = state.db.get()?;
    Ok(Json(queries::order_stats(&conn)?))
}

/// Quote a CSV field per RFC 4180 when it contains delimiters or quotes.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn format_export_date(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

pub fn orders_to_csv(rows: &[OrderExportRow]) -> String {
    let mut csv = String::from("Order ID,Script,Customer Email,Amount,Payment Method,Status,Date\n");
    for row in rows {
        let line = [
            csv_field(&row.order_id),
            csv_field(row.script_name.as_deref().unwrap_or("")),
            csv_field(&row.customer_email),
            format!("${}", cents_to_decimal(row.amount_cents)),
            csv_field(&row.payment_method),
            csv_field(&row.status),
            format_export_date(row.created_at),
        ]
        .join(",");
        csv.push_str(&line);
        csv.push('\n');
    }
    csv
}

pub async fn export_orders(
    State(state): State<AppState>,
    Query(filter): Query<OrderListQuery>,
) -> Result<Response> {
    let filters = filter.into_filters()?;
    let rows = {
        let conn = state.db.get()?;
        queries::export_orders(&conn, &filters)?
    };
    let csv = orders_to_csv(&rows);

    let filename = format!("orders-{}.csv", Utc::now().format("%Y-%m-%d"));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}
