//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupt data.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const SCRIPT_COLS: &str = "id, name, slug, application, version, short_description, \
     price_type, price_cents, file_path, file_size, downloads, status, created_at, updated_at";

pub const ORDER_COLS: &str = "id, order_id, script_id, customer_email, amount_cents, currency, \
     payment_method, payment_id, transaction_id, status, download_token, token_expires_at, \
     download_count, created_at, updated_at";

/// Order columns prefixed for joins against scripts.
pub const ORDER_COLS_PREFIXED: &str =
    "o.id, o.order_id, o.script_id, o.customer_email, o.amount_cents, o.currency, \
     o.payment_method, o.payment_id, o.transaction_id, o.status, o.download_token, \
     o.token_expires_at, o.download_count, o.created_at, o.updated_at";

pub const USER_COLS: &str = "id, email, name, role, created_at, updated_at";

// ============ FromRow Implementations ============

impl FromRow for Script {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Script {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            application: row.get(3)?,
            version: row.get(4)?,
            short_description: row.get(5)?,
            price_type: parse_enum(row, 6, "price_type")?,
            price_cents: row.get(7)?,
            file_path: row.get(8)?,
            file_size: row.get(9)?,
            downloads: row.get(10)?,
            status: parse_enum(row, 11, "status")?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }
}

impl FromRow for Order {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Order {
            id: row.get(0)?,
            order_id: row.get(1)?,
            script_id: row.get(2)?,
            customer_email: row.get(3)?,
            amount_cents: row.get(4)?,
            currency: row.get(5)?,
            payment_method: row.get(6)?,
            payment_id: row.get(7)?,
            transaction_id: row.get(8)?,
            status: parse_enum(row, 9, "status")?,
            download_token: row.get(10)?,
            token_expires_at: row.get(11)?,
            download_count: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }
}

/// Expects ORDER_COLS_PREFIXED followed by s.name, s.slug.
impl FromRow for OrderWithScript {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(OrderWithScript {
            order: Order::from_row(row)?,
            script_name: row.get(15)?,
            script_slug: row.get(16)?,
        })
    }
}

/// Expects ORDER_COLS_PREFIXED followed by s.name, s.slug, s.application,
/// s.file_path, s.file_size.
impl FromRow for OrderDownload {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(OrderDownload {
            order: Order::from_row(row)?,
            script_name: row.get(15)?,
            script_slug: row.get(16)?,
            application: row.get(17)?,
            file_path: row.get(18)?,
            file_size: row.get(19)?,
        })
    }
}

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            role: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl FromRow for OrderExportRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(OrderExportRow {
            order_id: row.get(0)?,
            script_name: row.get(1)?,
            customer_email: row.get(2)?,
            amount_cents: row.get(3)?,
            payment_method: row.get(4)?,
            status: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}
