use crate::services::scope::Owned;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on stock and invoiced quantities.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Upper bound on a unit price. Keeps quantity × price well inside `Decimal`.
pub fn max_price() -> Decimal {
    Decimal::from(1_000_000_000_i64)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StockStatus {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Low Stock")]
    LowStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl StockStatus {
    /// Status implied by an on-hand quantity.
    pub fn for_quantity(quantity: i64, low_stock_threshold: i64) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity < low_stock_threshold {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }
}

impl std::str::FromStr for StockStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In Stock" => Ok(StockStatus::InStock),
            "Low Stock" => Ok(StockStatus::LowStock),
            "Out of Stock" => Ok(StockStatus::OutOfStock),
            _ => Err(format!("Invalid stock status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: String,
    pub branch_id: String,
    /// Units on hand; never negative.
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub status: StockStatus,
    pub owner_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category_id: String,
    pub branch_id: String,
    pub quantity: i64,
    pub price: Decimal,
    pub status: StockStatus,
}

impl Product {
    pub fn new(owner_id: String, new: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            description: new
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            category_id: new.category_id,
            branch_id: new.branch_id,
            quantity: new.quantity,
            price: new.price.round_dp(2),
            status: new.status,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Owned for Product {
    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}
