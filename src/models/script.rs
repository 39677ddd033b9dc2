use serde::{Deserialize, Serialize};

use crate::util::cents_to_decimal;

/// A downloadable script listing in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// Target application (photoshop, illustrator, indesign, ...)
    pub application: String,
    pub version: String,
    pub short_description: Option<String>,
    pub price_type: PriceType,
    pub price_cents: i64,
    /// Filename under the scripts upload directory, set once a file is uploaded
    pub file_path: Option<String>,
    /// Human-readable size recorded at upload time (e.g. "1.25 MB")
    pub file_size: Option<String>,
    pub downloads: i64,
    pub status: ScriptStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Script {
    /// Price as a fixed-point decimal string (e.g. "12.00"), the format
    /// the payment gateway and CSV export expect.
    pub fn price(&self) -> String {
        cents_to_decimal(self.price_cents)
    }

    pub fn is_paid(&self) -> bool {
        self.price_type == PriceType::Paid && self.price_cents > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    Free,
    Paid,
}

impl PriceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Paid => "paid",
        }
    }
}

impl std::str::FromStr for PriceType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "paid" => Ok(Self::Paid),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptStatus {
    Draft,
    Published,
}

impl ScriptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl std::str::FromStr for ScriptStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            _ => Err(()),
        }
    }
}

/// Data required to create a new script listing.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScript {
    pub name: String,
    pub application: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    pub price_type: PriceType,
    #[serde(default)]
    pub price_cents: i64,
    #[serde(default)]
    pub status: Option<ScriptStatus>,
}

/// Partial update for a script listing; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateScript {
    pub name: Option<String>,
    pub application: Option<String>,
    pub version: Option<String>,
    pub short_description: Option<String>,
    pub price_type: Option<PriceType>,
    pub price_cents: Option<i64>,
    pub status: Option<ScriptStatus>,
}

/// Filters for catalog and admin script listings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ScriptFilters {
    pub application: Option<String>,
    pub price_type: Option<PriceType>,
    pub search: Option<String>,
    pub status: Option<ScriptStatus>,
}
