use serde::{Deserialize, Serialize};

use crate::util::cents_to_decimal;

/// One purchase attempt, tracked pending -> completed/failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Human-facing order code ("ORD-" + 16 uppercase hex chars)
    pub order_id: String,
    pub script_id: i64,
    pub customer_email: String,
    pub amount_cents: i64,
    pub currency: String,
    pub payment_method: String,
    /// Gateway order id (set at creation)
    pub payment_id: Option<String>,
    /// Gateway capture id (set on completion)
    pub transaction_id: Option<String>,
    pub status: OrderStatus,
    /// Set iff status = completed; grants time-bounded download access
    pub download_token: Option<String>,
    pub token_expires_at: Option<i64>,
    pub download_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Amount as a fixed-point decimal string (e.g. "12.00").
    pub fn amount(&self) -> String {
        cents_to_decimal(self.amount_cents)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Data required to persist a new pending order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub order_id: String,
    pub script_id: i64,
    pub customer_email: String,
    pub amount_cents: i64,
    /// Gateway order id returned by the provider
    pub payment_id: String,
}

/// Order joined with its script's display fields, for admin listings.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithScript {
    #[serde(flatten)]
    pub order: Order,
    pub script_name: Option<String>,
    pub script_slug: Option<String>,
}

/// Everything the download gate needs to serve a purchased file.
#[derive(Debug, Clone)]
pub struct OrderDownload {
    pub order: Order,
    pub script_name: String,
    pub script_slug: String,
    pub application: String,
    pub file_path: Option<String>,
    pub file_size: Option<String>,
}

/// Filters for the admin order listing and CSV export.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OrderFilters {
    pub status: Option<OrderStatus>,
    pub payment_method: Option<String>,
    /// Matches order code, customer email, or script name
    pub search: Option<String>,
    /// Inclusive unix-timestamp bounds on created_at
    pub date_from: Option<i64>,
    pub date_to: Option<i64>,
}

/// Count of orders in one status, for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Aggregate order statistics for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStats {
    pub total_orders: i64,
    /// Sum of completed order amounts
    pub total_revenue_cents: i64,
    /// Completed revenue within the current calendar month
    pub month_revenue_cents: i64,
    /// Average completed order value
    pub avg_order_cents: i64,
    pub by_status: Vec<StatusCount>,
}

/// One row of the CSV export.
#[derive(Debug, Clone)]
pub struct OrderExportRow {
    pub order_id: String,
    pub script_name: Option<String>,
    pub customer_email: String,
    pub amount_cents: i64,
    pub payment_method: String,
    pub status: String,
    pub created_at: i64,
}
