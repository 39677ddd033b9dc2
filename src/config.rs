use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub uploads_dir: String,
    pub base_url: String,
    pub paypal: Option<PayPalConfig>,
    pub smtp: Option<SmtpConfig>,
    pub admin_email: String,
    pub admin_password: String,
    pub dev_mode: bool,
}

#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    /// "sandbox" or "live"
    pub mode: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

/// Placeholder values left over from an example .env file count as
/// unconfigured.
fn is_placeholder(value: &str) -> bool {
    value.is_empty() || value.starts_with("your-")
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("ADOSCRIPT_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let paypal = match (env::var("PAYPAL_CLIENT_ID"), env::var("PAYPAL_CLIENT_SECRET")) {
            (Ok(client_id), Ok(client_secret))
                if !is_placeholder(&client_id) && !is_placeholder(&client_secret) =>
            {
                Some(PayPalConfig {
                    client_id,
                    client_secret,
                    mode: env::var("PAYPAL_MODE").unwrap_or_else(|_| "sandbox".to_string()),
                })
            }
            _ => None,
        };

        let smtp = match (env::var("SMTP_HOST"), env::var("SMTP_USERNAME")) {
            (Ok(smtp_host), Ok(username))
                if !is_placeholder(&smtp_host) && !is_placeholder(&username) =>
            {
                Some(SmtpConfig {
                    host: smtp_host,
                    port: env::var("SMTP_PORT")
                        .ok()
                        .and_then(|p| p.parse().ok())
                        .unwrap_or(587),
                    username,
                    password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                    from_email: env::var("SMTP_FROM_EMAIL")
                        .unwrap_or_else(|_| "noreply@adoscript.com".to_string()),
                    from_name: env::var("SMTP_FROM_NAME")
                        .unwrap_or_else(|_| "Adoscript".to_string()),
                })
            }
            _ => None,
        };

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "adoscript.db".to_string()),
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
            base_url,
            paypal,
            smtp,
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@adoscript.com".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
