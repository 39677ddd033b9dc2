use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adoscript::config::Config;
use adoscript::db::{create_pool, init_db, queries, AppState};
use adoscript::email::Mailer;
use adoscript::handlers;
use adoscript::models::{CreateScript, PriceType, ScriptStatus};
use adoscript::password::hash_password;
use adoscript::payments::PayPalClient;
use adoscript::session::SessionStore;

#[derive(Parser, Debug)]
#[command(name = "adoscript")]
#[command(about = "Storefront backend for downloadable scripts")]
struct Cli {
    /// Seed the database with dev data (a few published scripts)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Create the admin account on first boot so the back office is reachable.
fn bootstrap_admin(state: &AppState, email: &str, password: &str) {
    let conn = state.db.get().expect("Failed to get db connection for bootstrap");

    let count = queries::count_users(&conn).expect("Failed to count users");
    if count > 0 {
        tracing::info!("Admin account already exists, skipping bootstrap");
        return;
    }

    let hash = hash_password(password).expect("Failed to hash bootstrap password");
    let user = queries::create_user(&conn, email, &hash, "Admin").expect("Failed to create admin");

    tracing::info!("============================================");
    tracing::info!("BOOTSTRAP ADMIN CREATED");
    tracing::info!("Email: {}", user.email);
    tracing::info!("============================================");
    tracing::info!("Change the password after first login");
}

/// Seed a few published scripts for local development.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let (existing, _) = queries::list_scripts_paginated(&conn, &Default::default(), 1, 0)
        .expect("Failed to check for existing scripts");
    if !existing.is_empty() {
        tracing::info!("Database already has scripts, skipping seed");
        return;
    }

    let scripts = [
        ("Layer Export Pro", "photoshop", PriceType::Paid, 1200),
        ("Batch Rename Toolkit", "illustrator", PriceType::Paid, 800),
        ("Guide Grid Maker", "indesign", PriceType::Free, 0),
    ];
    for (name, application, price_type, price_cents) in scripts {
        let script = queries::create_script(
            &conn,
            &CreateScript {
                name: name.to_string(),
                application: application.to_string(),
                version: None,
                short_description: Some(format!("{} for {}", name, application)),
                price_type,
                price_cents,
                status: Some(ScriptStatus::Published),
            },
        )
        .expect("Failed to seed script");
        tracing::info!("Seeded script: {} (/{})", script.name, script.slug);
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adoscript=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let paypal = config.paypal.as_ref().map(PayPalClient::new);
    if paypal.is_none() {
        tracing::warn!("PayPal not configured, checkout endpoints will refuse requests");
    }

    let state = AppState {
        db: db_pool,
        base_url: config.base_url.clone(),
        uploads_dir: config.uploads_dir.clone().into(),
        paypal,
        mailer: Mailer::new(config.smtp.clone()),
        sessions: SessionStore::new(),
    };

    bootstrap_admin(&state, &config.admin_email, &config.admin_password);

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set ADOSCRIPT_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = Router::new()
        // Public endpoints (no auth)
        .merge(handlers::public::router())
        // Admin auth (login public, the rest behind a session)
        .merge(handlers::auth::router(state.clone()))
        // Admin back office (session auth)
        .merge(handlers::admin::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();
    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Adoscript server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
