use chrono::Utc;
use rusqlite::{params, types::Value, Connection, OptionalExtension, ToSql};

use crate::error::Result;
use crate::models::*;
use crate::util::{generate_order_code, slugify};

use super::from_row::{
    query_all, query_one, ORDER_COLS, ORDER_COLS_PREFIXED, SCRIPT_COLS, USER_COLS,
};

fn as_params(values: &[Value]) -> Vec<&dyn ToSql> {
    values.iter().map(|v| v as &dyn ToSql).collect()
}

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Scripts ============

/// Find a slug for `name` that is unique among scripts, appending -2, -3, ...
/// on collision. `exclude_id` skips the script being renamed.
pub fn unique_slug(conn: &Connection, name: &str, exclude_id: Option<i64>) -> Result<String> {
    let base = slugify(name);
    let base = if base.is_empty() { "script".to_string() } else { base };
    let mut candidate = base.clone();
    let mut counter = 2;
    loop {
        let taken: Option<i64> = match exclude_id {
            Some(id) => conn
                .query_row(
                    "SELECT id FROM scripts WHERE slug = ?1 AND id != ?2",
                    params![&candidate, id],
                    |row| row.get(0),
                )
                .optional()?,
            None => conn
                .query_row(
                    "SELECT id FROM scripts WHERE slug = ?1",
                    params![&candidate],
                    |row| row.get(0),
                )
                .optional()?,
        };
        if taken.is_none() {
            return Ok(candidate);
        }
        candidate = format!("{}-{}", base, counter);
        counter += 1;
    }
}

pub fn create_script(conn: &Connection, input: &CreateScript) -> Result<Script> {
    let now = now();
    let slug = unique_slug(conn, &input.name, None)?;
    let version = input.version.clone().unwrap_or_else(|| "1.0.0".to_string());
    let status = input.status.unwrap_or(ScriptStatus::Draft);

    conn.execute(
        "INSERT INTO scripts (name, slug, application, version, short_description,
                              price_type, price_cents, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            &input.name,
            &slug,
            &input.application,
            &version,
            &input.short_description,
            input.price_type.as_str(),
            input.price_cents,
            status.as_str(),
            now,
            now
        ],
    )?;
    let id = conn.last_insert_rowid();

    Ok(Script {
        id,
        name: input.name.clone(),
        slug,
        application: input.application.clone(),
        version,
        short_description: input.short_description.clone(),
        price_type: input.price_type,
        price_cents: input.price_cents,
        file_path: None,
        file_size: None,
        downloads: 0,
        status,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_script_by_id(conn: &Connection, id: i64) -> Result<Option<Script>> {
    query_one(
        conn,
        &format!("SELECT {} FROM scripts WHERE id = ?1", SCRIPT_COLS),
        &[&id],
    )
}

/// Checkout and the public catalog only see published scripts.
pub fn get_published_script(conn: &Connection, id: i64) -> Result<Option<Script>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM scripts WHERE id = ?1 AND status = 'published'",
            SCRIPT_COLS
        ),
        &[&id],
    )
}

pub fn get_published_script_by_slug(conn: &Connection, slug: &str) -> Result<Option<Script>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM scripts WHERE slug = ?1 AND status = 'published'",
            SCRIPT_COLS
        ),
        &[&slug],
    )
}

/// Apply a partial update. Renaming regenerates the slug. Returns the
/// updated script, or None if the id does not exist.
pub fn update_script(conn: &Connection, id: i64, input: &UpdateScript) -> Result<Option<Script>> {
    let Some(existing) = get_script_by_id(conn, id)? else {
        return Ok(None);
    };

    let (name, slug) = match &input.name {
        Some(name) if *name != existing.name => {
            let slug = unique_slug(conn, name, Some(id))?;
            (name.clone(), slug)
        }
        _ => (existing.name.clone(), existing.slug.clone()),
    };
    let application = input
        .application
        .clone()
        .unwrap_or_else(|| existing.application.clone());
    let version = input
        .version
        .clone()
        .unwrap_or_else(|| existing.version.clone());
    let short_description = match &input.short_description {
        Some(d) => Some(d.clone()),
        None => existing.short_description.clone(),
    };
    let price_type = input.price_type.unwrap_or(existing.price_type);
    let price_cents = input.price_cents.unwrap_or(existing.price_cents);
    let status = input.status.unwrap_or(existing.status);
    let updated_at = now();

    conn.execute(
        "UPDATE scripts
         SET name = ?1, slug = ?2, application = ?3, version = ?4, short_description = ?5,
             price_type = ?6, price_cents = ?7, status = ?8, updated_at = ?9
         WHERE id = ?10",
        params![
            &name,
            &slug,
            &application,
            &version,
            &short_description,
            price_type.as_str(),
            price_cents,
            status.as_str(),
            updated_at,
            id
        ],
    )?;

    Ok(Some(Script {
        id,
        name,
        slug,
        application,
        version,
        short_description,
        price_type,
        price_cents,
        status,
        updated_at,
        ..existing
    }))
}

pub fn delete_script(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute("DELETE FROM scripts WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

/// Record an uploaded file against a script.
pub fn set_script_file(
    conn: &Connection,
    id: i64,
    file_path: &str,
    file_size: &str,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE scripts SET file_path = ?1, file_size = ?2, updated_at = ?3 WHERE id = ?4",
        params![file_path, file_size, now(), id],
    )?;
    Ok(affected > 0)
}

fn script_filter_clauses(filters: &ScriptFilters) -> (Vec<&'static str>, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(status) = filters.status {
        clauses.push("status = ?");
        values.push(status.as_str().to_string().into());
    }
    if let Some(ref app) = filters.application {
        clauses.push("application = ?");
        values.push(app.clone().into());
    }
    if let Some(price_type) = filters.price_type {
        clauses.push("price_type = ?");
        values.push(price_type.as_str().to_string().into());
    }
    if let Some(ref search) = filters.search {
        clauses.push("(name LIKE ? OR short_description LIKE ?)");
        let term = format!("%{}%", search);
        values.push(term.clone().into());
        values.push(term.into());
    }
    (clauses, values)
}

pub fn list_scripts_paginated(
    conn: &Connection,
    filters: &ScriptFilters,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Script>, i64)> {
    let (clauses, values) = script_filter_clauses(filters);
    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM scripts {}", where_clause),
        &as_params(&values)[..],
        |row| row.get(0),
    )?;

    let mut values = values;
    values.push(limit.into());
    values.push(offset.into());
    let sql = format!(
        "SELECT {} FROM scripts {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        SCRIPT_COLS, where_clause
    );
    let items = query_all(conn, &sql, &as_params(&values))?;

    Ok((items, total))
}

pub fn increment_script_downloads(conn: &Connection, id: i64) -> Result<()> {
    conn.execute(
        "UPDATE scripts SET downloads = downloads + 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

// ============ Orders ============

pub fn create_pending_order(conn: &Connection, input: &CreateOrder) -> Result<Order> {
    let now = now();
    conn.execute(
        "INSERT INTO orders (order_id, script_id, customer_email, amount_cents, currency,
                             payment_method, payment_id, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 'USD', 'paypal', ?5, 'pending', ?6, ?7)",
        params![
            &input.order_id,
            input.script_id,
            &input.customer_email,
            input.amount_cents,
            &input.payment_id,
            now,
            now
        ],
    )?;
    let id = conn.last_insert_rowid();

    Ok(Order {
        id,
        order_id: input.order_id.clone(),
        script_id: input.script_id,
        customer_email: input.customer_email.clone(),
        amount_cents: input.amount_cents,
        currency: "USD".to_string(),
        payment_method: "paypal".to_string(),
        payment_id: Some(input.payment_id.clone()),
        transaction_id: None,
        status: OrderStatus::Pending,
        download_token: None,
        token_expires_at: None,
        download_count: 0,
        created_at: now,
        updated_at: now,
    })
}

/// The capture lookup. Filtering on status = 'pending' is what makes
/// capture replay-safe: a second capture of the same gateway order id
/// finds no row.
pub fn get_pending_order_by_payment_id(
    conn: &Connection,
    payment_id: &str,
) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM orders WHERE payment_id = ?1 AND status = 'pending'",
            ORDER_COLS
        ),
        &[&payment_id],
    )
}

/// Transition pending -> completed in a single update: capture id, token
/// and expiry land together. A gateway that completed without issuing a
/// capture id leaves transaction_id NULL. Returns false if the order was
/// not pending.
pub fn complete_order(
    conn: &Connection,
    id: i64,
    transaction_id: Option<&str>,
    download_token: &str,
    token_expires_at: i64,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders
         SET status = 'completed', transaction_id = ?1, download_token = ?2,
             token_expires_at = ?3, updated_at = ?4
         WHERE id = ?5 AND status = 'pending'",
        params![transaction_id, download_token, token_expires_at, now(), id],
    )?;
    Ok(affected > 0)
}

/// Transition pending -> failed. Terminal; never issues a token.
pub fn fail_order(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders SET status = 'failed', updated_at = ?1 WHERE id = ?2 AND status = 'pending'",
        params![now(), id],
    )?;
    Ok(affected > 0)
}

/// Download-gate lookup: token must belong to a completed order. Invalid,
/// foreign and unissued tokens are indistinguishable (all yield None).
pub fn get_order_download_by_token(conn: &Connection, token: &str) -> Result<Option<OrderDownload>> {
    query_one(
        conn,
        &format!(
            "SELECT {}, s.name, s.slug, s.application, s.file_path, s.file_size
             FROM orders o
             JOIN scripts s ON o.script_id = s.id
             WHERE o.download_token = ?1 AND o.status = 'completed'",
            ORDER_COLS_PREFIXED
        ),
        &[&token],
    )
}

pub fn increment_order_download_count(conn: &Connection, id: i64) -> Result<()> {
    conn.execute(
        "UPDATE orders SET download_count = download_count + 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

pub fn get_order_with_script(conn: &Connection, id: i64) -> Result<Option<OrderWithScript>> {
    query_one(
        conn,
        &format!(
            "SELECT {}, s.name, s.slug FROM orders o
             LEFT JOIN scripts s ON o.script_id = s.id
             WHERE o.id = ?1",
            ORDER_COLS_PREFIXED
        ),
        &[&id],
    )
}

pub fn get_order_by_code(conn: &Connection, order_code: &str) -> Result<Option<OrderWithScript>> {
    query_one(
        conn,
        &format!(
            "SELECT {}, s.name, s.slug FROM orders o
             LEFT JOIN scripts s ON o.script_id = s.id
             WHERE o.order_id = ?1",
            ORDER_COLS_PREFIXED
        ),
        &[&order_code],
    )
}

fn order_filter_clauses(filters: &OrderFilters) -> (Vec<&'static str>, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(status) = filters.status {
        clauses.push("o.status = ?");
        values.push(status.as_str().to_string().into());
    }
    if let Some(ref method) = filters.payment_method {
        clauses.push("o.payment_method = ?");
        values.push(method.clone().into());
    }
    if let Some(ref search) = filters.search {
        clauses.push("(o.order_id LIKE ? OR o.customer_email LIKE ? OR s.name LIKE ?)");
        let term = format!("%{}%", search);
        values.push(term.clone().into());
        values.push(term.clone().into());
        values.push(term.into());
    }
    if let Some(from) = filters.date_from {
        clauses.push("o.created_at >= ?");
        values.push(from.into());
    }
    if let Some(to) = filters.date_to {
        clauses.push("o.created_at <= ?");
        values.push(to.into());
    }
    (clauses, values)
}

pub fn list_orders_paginated(
    conn: &Connection,
    filters: &OrderFilters,
    limit: i64,
    offset: i64,
) -> Result<(Vec<OrderWithScript>, i64)> {
    let (clauses, values) = order_filter_clauses(filters);
    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM orders o LEFT JOIN scripts s ON o.script_id = s.id {}",
            where_clause
        ),
        &as_params(&values)[..],
        |row| row.get(0),
    )?;

    let mut values = values;
    values.push(limit.into());
    values.push(offset.into());
    let sql = format!(
        "SELECT {}, s.name, s.slug FROM orders o
         LEFT JOIN scripts s ON o.script_id = s.id
         {} ORDER BY o.created_at DESC LIMIT ? OFFSET ?",
        ORDER_COLS_PREFIXED, where_clause
    );
    let items = query_all(conn, &sql, &as_params(&values))?;

    Ok((items, total))
}

/// All matching rows for CSV export, newest first. Takes the same
/// filters as the listing, without pagination.
pub fn export_orders(conn: &Connection, filters: &OrderFilters) -> Result<Vec<OrderExportRow>> {
    let (clauses, values) = order_filter_clauses(filters);
    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT o.order_id, s.name, o.customer_email, o.amount_cents,
                o.payment_method, o.status, o.created_at
         FROM orders o
         LEFT JOIN scripts s ON o.script_id = s.id
         {} ORDER BY o.created_at DESC",
        where_clause
    );
    query_all(conn, &sql, &as_params(&values))
}

pub fn order_stats(conn: &Connection) -> Result<OrderStats> {
    let total_orders: i64 = conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
    let total_revenue_cents: i64 = conn.query_row(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM orders WHERE status = 'completed'",
        [],
        |row| row.get(0),
    )?;
    let month_revenue_cents: i64 = conn.query_row(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM orders
         WHERE status = 'completed'
         AND strftime('%Y-%m', created_at, 'unixepoch') = strftime('%Y-%m', 'now')",
        [],
        |row| row.get(0),
    )?;
    let avg_order_cents: i64 = conn.query_row(
        "SELECT CAST(COALESCE(AVG(amount_cents), 0) AS INTEGER) FROM orders
         WHERE status = 'completed'",
        [],
        |row| row.get(0),
    )?;

    let mut stmt =
        conn.prepare("SELECT status, COUNT(*) FROM orders GROUP BY status ORDER BY status")?;
    let by_status = stmt
        .query_map([], |row| {
            Ok(StatusCount {
                status: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(OrderStats {
        total_orders,
        total_revenue_cents,
        month_revenue_cents,
        avg_order_cents,
        by_status,
    })
}

/// Fresh order code, retried on the (unlikely) UNIQUE collision.
pub fn fresh_order_code(conn: &Connection) -> Result<String> {
    loop {
        let code = generate_order_code();
        let taken: Option<i64> = conn
            .query_row(
                "SELECT id FROM orders WHERE order_id = ?1",
                params![&code],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_none() {
            return Ok(code);
        }
    }
}

// ============ Users ============

pub fn count_users(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

pub fn create_user(
    conn: &Connection,
    email: &str,
    password_hash: &str,
    name: &str,
) -> Result<User> {
    let now = now();
    let email = email.trim().to_lowercase();
    conn.execute(
        "INSERT INTO users (email, password_hash, name, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'admin', ?4, ?5)",
        params![&email, password_hash, name, now, now],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        email,
        name: name.to_string(),
        role: "admin".to_string(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

/// Login lookup: user plus stored password hash.
pub fn get_user_with_password(conn: &Connection, email: &str) -> Result<Option<(User, String)>> {
    let email = email.trim().to_lowercase();
    conn.query_row(
        &format!(
            "SELECT {}, password_hash FROM users WHERE email = ?1",
            USER_COLS
        ),
        params![&email],
        |row| {
            let user = super::from_row::FromRow::from_row(row)?;
            let hash: String = row.get(6)?;
            Ok((user, hash))
        },
    )
    .optional()
    .map_err(Into::into)
}

pub fn get_password_hash(conn: &Connection, user_id: i64) -> Result<Option<String>> {
    conn.query_row(
        "SELECT password_hash FROM users WHERE id = ?1",
        params![user_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(Into::into)
}

pub fn update_password(conn: &Connection, user_id: i64, password_hash: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
        params![password_hash, now(), user_id],
    )?;
    Ok(affected > 0)
}
