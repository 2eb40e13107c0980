use crate::services::error::InventoryError;
use crate::services::scope::Owned;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(InvoiceStatus::Pending),
            "Paid" => Ok(InvoiceStatus::Paid),
            "Overdue" => Ok(InvoiceStatus::Overdue),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PaymentTerms {
    #[serde(rename = "Net 7")]
    Net7,
    #[serde(rename = "Net 15")]
    Net15,
    #[default]
    #[serde(rename = "Net 30")]
    Net30,
    #[serde(rename = "Due on Receipt")]
    DueOnReceipt,
}

impl PaymentTerms {
    pub fn days(&self) -> i64 {
        match self {
            PaymentTerms::Net7 => 7,
            PaymentTerms::Net15 => 15,
            PaymentTerms::Net30 => 30,
            PaymentTerms::DueOnReceipt => 0,
        }
    }

    pub fn due_date(&self, issue_date: DateTime<Utc>) -> DateTime<Utc> {
        issue_date + Duration::days(self.days())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub description: String,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// quantity × price, fixed when the invoice is created.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(
        product_id: String,
        description: String,
        quantity: i64,
        price: Decimal,
    ) -> Result<Self, InventoryError> {
        let price = price.round_dp(2);
        Ok(Self {
            amount: line_amount(quantity, price)?,
            product_id,
            description,
            quantity,
            price,
        })
    }
}

fn out_of_range() -> InventoryError {
    InventoryError::Validation("Amount is out of range".into())
}

pub fn line_amount(quantity: i64, price: Decimal) -> Result<Decimal, InventoryError> {
    Decimal::from(quantity)
        .checked_mul(price)
        .map(|amount| amount.round_dp(2))
        .ok_or_else(out_of_range)
}

pub fn total_amount(items: &[LineItem]) -> Result<Decimal, InventoryError> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.amount))
        .ok_or_else(out_of_range)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "_id")]
    pub id: String,
    pub invoice_number: String,
    pub branch_id: String,
    pub client: Client,
    pub items: Vec<LineItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub issue_date: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub due_date: DateTime<Utc>,
    pub payment_terms: PaymentTerms,
    pub owner_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

pub struct NewInvoice {
    pub invoice_number: String,
    pub branch_id: String,
    pub client: Client,
    pub items: Vec<LineItem>,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub payment_terms: PaymentTerms,
}

impl Invoice {
    pub fn new(owner_id: String, new: NewInvoice) -> Result<Self, InventoryError> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            invoice_number: new.invoice_number,
            branch_id: new.branch_id,
            client: new.client,
            total_amount: total_amount(&new.items)?,
            items: new.items,
            status: InvoiceStatus::Pending,
            issue_date: new.issue_date,
            due_date: new.due_date,
            payment_terms: new.payment_terms,
            owner_id,
            created_at: now,
            updated_at: now,
        })
    }
}

impl Owned for Invoice {
    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

/// Last sequence number issued for a branch. `_id` is the branch id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceCounter {
    #[serde(rename = "_id")]
    pub branch_id: String,
    pub owner_id: String,
    pub seq: i64,
}
