use crate::dtos::BranchSummary;
use crate::models::{Branch, Client, Invoice, InvoiceStatus, LineItem, PaymentTerms};
use crate::services::{CreateInvoice, ItemInput, StatusTotals};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
        .map_err(|_| format!("Invalid date: {}", raw))
}

fn optional_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_date(raw.trim()).map_err(serde::de::Error::custom))
        .transpose()
}

#[derive(Debug, Deserialize, Validate)]
pub struct ClientRequest {
    #[validate(length(min = 1, max = 200, message = "Client name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid client email"))]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InvoiceItemRequest {
    #[serde(alias = "productId")]
    #[validate(length(min = 1, message = "Product is required"))]
    pub product: String,

    pub description: Option<String>,

    #[validate(range(min = 1, max = 1_000_000_000, message = "Quantity must be between 1 and 1000000000"))]
    pub quantity: i64,

    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[serde(alias = "branchId")]
    #[validate(length(min = 1, message = "Branch is required"))]
    pub branch: String,

    #[validate(nested)]
    pub client: ClientRequest,

    #[validate(
        length(min = 1, message = "Invoice must contain at least one item"),
        nested
    )]
    pub items: Vec<InvoiceItemRequest>,

    pub payment_terms: Option<PaymentTerms>,

    #[serde(default, deserialize_with = "optional_date")]
    pub issue_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "optional_date")]
    pub due_date: Option<DateTime<Utc>>,
}

impl From<CreateInvoiceRequest> for CreateInvoice {
    fn from(req: CreateInvoiceRequest) -> Self {
        Self {
            branch_id: req.branch,
            client: Client {
                name: req.client.name,
                email: req.client.email,
            },
            items: req
                .items
                .into_iter()
                .map(|item| ItemInput {
                    product_id: item.product,
                    description: item.description,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            payment_terms: req.payment_terms,
            issue_date: req.issue_date,
            due_date: req.due_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInvoiceStatusRequest {
    pub status: InvoiceStatus,
}

/// Query string of `GET /invoices`.
#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListParams {
    pub branch: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemResponse {
    pub product_id: String,
    pub description: String,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl From<LineItem> for LineItemResponse {
    fn from(item: LineItem) -> Self {
        Self {
            product_id: item.product_id,
            description: item.description,
            quantity: item.quantity,
            price: item.price,
            amount: item.amount,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientResponse {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: String,
    pub invoice_number: String,
    pub branch_id: String,
    pub branch: Option<BranchSummary>,
    pub client: ClientResponse,
    pub items: Vec<LineItemResponse>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
    pub issue_date: String,
    pub due_date: String,
    pub payment_terms: PaymentTerms,
    pub created_at: String,
    pub updated_at: String,
}

impl InvoiceResponse {
    pub fn new(invoice: Invoice, branch: Option<Branch>) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            branch_id: invoice.branch_id,
            branch: branch.map(BranchSummary::from),
            client: ClientResponse {
                name: invoice.client.name,
                email: invoice.client.email,
            },
            items: invoice.items.into_iter().map(LineItemResponse::from).collect(),
            total_amount: invoice.total_amount,
            status: invoice.status,
            issue_date: invoice.issue_date.to_rfc3339(),
            due_date: invoice.due_date.to_rfc3339(),
            payment_terms: invoice.payment_terms,
            created_at: invoice.created_at.to_rfc3339(),
            updated_at: invoice.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStatsResponse {
    pub status: InvoiceStatus,
    pub count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

impl From<StatusTotals> for InvoiceStatsResponse {
    fn from(totals: StatusTotals) -> Self {
        Self {
            status: totals.status,
            count: totals.count,
            total_amount: totals.total_amount,
        }
    }
}
