use rusqlite::Connection;

/// Initialize the storefront schema. Idempotent; safe to run at every boot.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Catalog of downloadable scripts
        CREATE TABLE IF NOT EXISTS scripts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            application TEXT NOT NULL,
            version TEXT NOT NULL DEFAULT '1.0.0',
            short_description TEXT,
            price_type TEXT NOT NULL DEFAULT 'free' CHECK (price_type IN ('free', 'paid')),
            price_cents INTEGER NOT NULL DEFAULT 0,
            file_path TEXT,
            file_size TEXT,
            downloads INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'draft' CHECK (status IN ('draft', 'published')),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_scripts_status ON scripts(status);
        CREATE INDEX IF NOT EXISTS idx_scripts_application ON scripts(application);

        -- Purchase attempts, pending -> completed/failed
        -- download_token/token_expires_at are set iff status = 'completed'
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id TEXT NOT NULL UNIQUE,
            script_id INTEGER NOT NULL REFERENCES scripts(id),
            customer_email TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            currency TEXT NOT NULL DEFAULT 'USD',
            payment_method TEXT NOT NULL DEFAULT 'paypal',
            payment_id TEXT,
            transaction_id TEXT,
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'completed', 'failed')),
            download_token TEXT UNIQUE,
            token_expires_at INTEGER,
            download_count INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_orders_payment ON orders(payment_id, status);
        CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
        CREATE INDEX IF NOT EXISTS idx_orders_created ON orders(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_orders_token ON orders(download_token) WHERE download_token IS NOT NULL;

        -- Admin back-office accounts
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            name TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'admin',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        "#,
    )?;
    Ok(())
}
