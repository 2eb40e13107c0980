use crate::config::InventoryRules;
use crate::models::invoice::NewInvoice;
use crate::models::product::{max_price, MAX_QUANTITY};
use crate::models::{Client, Invoice, InvoiceStatus, LineItem, PaymentTerms, Product, StockStatus};
use crate::services::database::MongoDb;
use crate::services::error::{is_duplicate_key, InventoryError};
use crate::services::metrics::{
    INVOICES_CREATED, INVOICES_DELETED, INVOICE_FAILURES, STOCK_UNITS_MOVED,
};
use crate::services::numbering::assign_number;
use crate::services::scope::{OwnerScope, ScopedCollection};
use crate::services::transaction::TransactionRunner;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use mongodb::bson::{self, doc, Document};
use mongodb::options::FindOptions;
use mongodb::ClientSession;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Creation attempts when a number is claimed by a concurrent commit.
const NUMBER_ATTEMPTS: u32 = 3;

/// One requested line. Price and description fall back to the product's.
#[derive(Debug, Clone)]
pub struct ItemInput {
    pub product_id: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub branch_id: String,
    pub client: Client,
    pub items: Vec<ItemInput>,
    pub payment_terms: Option<PaymentTerms>,
    pub issue_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Clone)]
pub struct InvoiceFilter {
    pub branch_id: Option<String>,
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StatusTotals {
    #[serde(rename = "_id")]
    pub status: InvoiceStatus,
    pub count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

/// Dates resolved from the request, defaults applied.
#[derive(Debug, PartialEq)]
struct Schedule {
    terms: PaymentTerms,
    issue_date: DateTime<Utc>,
    due_date: DateTime<Utc>,
}

pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&at.date_naive().and_time(NaiveTime::MIN))
}

fn validate_request(input: &CreateInvoice, now: DateTime<Utc>) -> Result<Schedule, InventoryError> {
    if input.client.name.trim().is_empty() {
        return Err(InventoryError::Validation("Client name is required".into()));
    }
    if input.items.is_empty() {
        return Err(InventoryError::Validation(
            "Invoice must contain at least one item".into(),
        ));
    }
    for item in &input.items {
        if item.quantity < 1 {
            return Err(InventoryError::Validation(format!(
                "Quantity must be at least 1 for product: {}",
                item.product_id
            )));
        }
        if item.quantity > MAX_QUANTITY {
            return Err(InventoryError::Validation(format!(
                "Quantity is out of range for product: {}",
                item.product_id
            )));
        }
        if item.price.is_some_and(|p| p.is_sign_negative()) {
            return Err(InventoryError::Validation(format!(
                "Price cannot be negative for product: {}",
                item.product_id
            )));
        }
        if item.price.is_some_and(|p| p > max_price()) {
            return Err(InventoryError::Validation(format!(
                "Price is out of range for product: {}",
                item.product_id
            )));
        }
    }

    let terms = input.payment_terms.unwrap_or_default();
    let issue_date = input.issue_date.unwrap_or_else(|| start_of_day(now));
    let due_date = input.due_date.unwrap_or_else(|| terms.due_date(issue_date));
    if due_date < issue_date {
        return Err(InventoryError::Validation(
            "Due date cannot be before issue date".into(),
        ));
    }

    Ok(Schedule {
        terms,
        issue_date,
        due_date,
    })
}

fn invoice_filter(filter: &InvoiceFilter) -> Document {
    let mut query = Document::new();
    if let Some(branch_id) = &filter.branch_id {
        query.insert("branch_id", branch_id.clone());
    }
    if let Some(status) = filter.status {
        query.insert("status", status.as_str());
    }
    query
}

#[derive(Clone)]
pub struct InvoiceService {
    db: MongoDb,
    transactions: TransactionRunner,
    low_stock_threshold: i64,
}

impl InvoiceService {
    pub fn new(db: MongoDb, rules: &InventoryRules) -> Self {
        let transactions = TransactionRunner::new(
            db.client().clone(),
            Duration::from_millis(rules.transaction_max_elapsed_ms),
        );
        Self {
            db,
            transactions,
            low_stock_threshold: rules.low_stock_threshold,
        }
    }

    /// Decrements stock for every line, assigns the next branch number and
    /// stores the invoice, all in one transaction.
    pub async fn create(
        &self,
        scope: &OwnerScope,
        input: CreateInvoice,
    ) -> Result<Invoice, InventoryError> {
        let schedule = validate_request(&input, Utc::now())?;

        let branch_exists = scope
            .collection(self.db.branches())
            .find_by_id(&input.branch_id)
            .await?
            .is_some();
        if !branch_exists {
            return Err(InventoryError::InvalidReference("Branch not found".into()));
        }

        let input = &input;
        let schedule = &schedule;
        let mut attempt = 1;
        let result = loop {
            let result = self
                .transactions
                .run("create_invoice", move |mut session| async move {
                    let result = self
                        .create_in_session(scope, input, schedule, &mut session)
                        .await;
                    (session, result)
                })
                .await;
            match result {
                // Another transaction committed the same number first; the
                // next attempt sees it and skips past.
                Err(InventoryError::DuplicateInvoiceNumber(ref number))
                    if attempt < NUMBER_ATTEMPTS =>
                {
                    tracing::warn!(invoice_number = %number, attempt, "Invoice number taken, retrying");
                    attempt += 1;
                }
                other => break other,
            }
        };

        match result {
            Ok(invoice) => {
                metrics::counter!(INVOICES_CREATED).increment(1);
                tracing::info!(
                    owner_id = %scope.owner_id(),
                    invoice_id = %invoice.id,
                    invoice_number = %invoice.invoice_number,
                    items = invoice.items.len(),
                    total_amount = %invoice.total_amount,
                    "Invoice created"
                );
                Ok(invoice)
            }
            Err(e) => {
                metrics::counter!(INVOICE_FAILURES, "operation" => "create").increment(1);
                tracing::warn!(owner_id = %scope.owner_id(), error = %e, "Invoice creation failed");
                Err(e)
            }
        }
    }

    async fn create_in_session(
        &self,
        scope: &OwnerScope,
        input: &CreateInvoice,
        schedule: &Schedule,
        session: &mut ClientSession,
    ) -> Result<Invoice, InventoryError> {
        let products = scope.collection(self.db.products());
        let mut items = Vec::with_capacity(input.items.len());

        for requested in &input.items {
            let product = products
                .find_by_id_with_session(&requested.product_id, session)
                .await?
                .ok_or_else(|| {
                    InventoryError::InvalidReference(format!(
                        "Product not found: {}",
                        requested.product_id
                    ))
                })?;

            let updated = products
                .find_one_and_update_with_session(
                    doc! { "_id": &product.id, "quantity": { "$gte": requested.quantity } },
                    doc! {
                        "$inc": { "quantity": -requested.quantity },
                        "$set": { "updated_at": bson::DateTime::now() },
                    },
                    session,
                )
                .await?
                .ok_or_else(|| InventoryError::InsufficientStock(product.name.clone()))?;
            self.refresh_status(&products, &updated, session).await?;

            let description = requested
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| product.name.clone());
            items.push(LineItem::new(
                product.id,
                description,
                requested.quantity,
                requested.price.unwrap_or(product.price),
            )?);
        }

        let invoice_number = assign_number(
            &self.db.invoice_counters(),
            &self.db.invoices(),
            scope,
            &input.branch_id,
            Utc::now(),
            session,
        )
        .await?;
        let invoice = Invoice::new(
            scope.owner_id().to_string(),
            NewInvoice {
                invoice_number,
                branch_id: input.branch_id.clone(),
                client: Client {
                    name: input.client.name.trim().to_string(),
                    email: input.client.email.trim().to_string(),
                },
                items,
                issue_date: schedule.issue_date,
                due_date: schedule.due_date,
                payment_terms: schedule.terms,
            },
        )?;

        scope
            .collection(self.db.invoices())
            .insert_with_session(&invoice, session)
            .await
            .map_err(|e| match e {
                InventoryError::Database(ref db_err) if is_duplicate_key(db_err) => {
                    InventoryError::DuplicateInvoiceNumber(invoice.invoice_number.clone())
                }
                other => other,
            })?;

        let units: i64 = invoice.items.iter().map(|i| i.quantity).sum();
        metrics::counter!(STOCK_UNITS_MOVED, "direction" => "out").increment(units as u64);
        Ok(invoice)
    }

    /// Deletes the invoice and puts every line's quantity back on the shelf.
    pub async fn delete(&self, scope: &OwnerScope, id: &str) -> Result<Invoice, InventoryError> {
        let result = self
            .transactions
            .run("delete_invoice", move |mut session| async move {
                let result = self.delete_in_session(scope, id, &mut session).await;
                (session, result)
            })
            .await;

        match result {
            Ok(invoice) => {
                metrics::counter!(INVOICES_DELETED).increment(1);
                tracing::info!(
                    owner_id = %scope.owner_id(),
                    invoice_id = %invoice.id,
                    invoice_number = %invoice.invoice_number,
                    "Invoice deleted and stock restored"
                );
                Ok(invoice)
            }
            Err(e) => {
                if !matches!(e, InventoryError::NotFound(_)) {
                    metrics::counter!(INVOICE_FAILURES, "operation" => "delete").increment(1);
                }
                Err(e)
            }
        }
    }

    async fn delete_in_session(
        &self,
        scope: &OwnerScope,
        id: &str,
        session: &mut ClientSession,
    ) -> Result<Invoice, InventoryError> {
        let invoices = scope.collection(self.db.invoices());
        let invoice = invoices
            .find_by_id_with_session(id, session)
            .await?
            .ok_or(InventoryError::NotFound("Invoice"))?;

        let products = scope.collection(self.db.products());
        let mut restored = 0u64;
        for item in &invoice.items {
            let updated = products
                .find_one_and_update_with_session(
                    doc! { "_id": &item.product_id },
                    doc! {
                        "$inc": { "quantity": item.quantity },
                        "$set": { "updated_at": bson::DateTime::now() },
                    },
                    session,
                )
                .await?;
            match updated {
                Some(product) => {
                    self.refresh_status(&products, &product, session).await?;
                    restored += item.quantity as u64;
                }
                None => tracing::warn!(
                    invoice_id = %invoice.id,
                    product_id = %item.product_id,
                    "Product no longer exists, skipping stock restoration"
                ),
            }
        }

        if !invoices.delete_by_id_with_session(id, session).await? {
            return Err(InventoryError::NotFound("Invoice"));
        }

        metrics::counter!(STOCK_UNITS_MOVED, "direction" => "in").increment(restored);
        Ok(invoice)
    }

    async fn refresh_status(
        &self,
        products: &ScopedCollection<'_, Product>,
        product: &Product,
        session: &mut ClientSession,
    ) -> Result<(), InventoryError> {
        let status = StockStatus::for_quantity(product.quantity, self.low_stock_threshold);
        if status != product.status {
            products
                .find_one_and_update_with_session(
                    doc! { "_id": &product.id },
                    doc! { "$set": { "status": status.as_str() } },
                    session,
                )
                .await?;
        }
        Ok(())
    }

    /// Switches the owner's Pending invoices whose due date has passed to Overdue.
    pub async fn mark_overdue(&self, scope: &OwnerScope) -> Result<u64, InventoryError> {
        let today = bson::DateTime::from_chrono(start_of_day(Utc::now()));
        let marked = scope
            .collection(self.db.invoices())
            .update_many(
                doc! {
                    "status": InvoiceStatus::Pending.as_str(),
                    "due_date": { "$lt": today },
                },
                doc! {
                    "$set": {
                        "status": InvoiceStatus::Overdue.as_str(),
                        "updated_at": bson::DateTime::now(),
                    }
                },
            )
            .await?;
        if marked > 0 {
            tracing::info!(owner_id = %scope.owner_id(), marked, "Marked invoices overdue");
        }
        Ok(marked)
    }

    /// Newest first.
    pub async fn list(
        &self,
        scope: &OwnerScope,
        filter: &InvoiceFilter,
    ) -> Result<Vec<Invoice>, InventoryError> {
        self.mark_overdue(scope).await?;
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();
        scope
            .collection(self.db.invoices())
            .find(invoice_filter(filter), options)
            .await
    }

    pub async fn get(&self, scope: &OwnerScope, id: &str) -> Result<Invoice, InventoryError> {
        scope
            .collection(self.db.invoices())
            .find_by_id(id)
            .await?
            .ok_or(InventoryError::NotFound("Invoice"))
    }

    pub async fn update_status(
        &self,
        scope: &OwnerScope,
        id: &str,
        status: InvoiceStatus,
    ) -> Result<Invoice, InventoryError> {
        let invoice = scope
            .collection(self.db.invoices())
            .update_by_id(
                id,
                doc! { "$set": { "status": status.as_str(), "updated_at": bson::DateTime::now() } },
            )
            .await?
            .ok_or(InventoryError::NotFound("Invoice"))?;
        tracing::info!(invoice_id = %id, status = status.as_str(), "Invoice status updated");
        Ok(invoice)
    }

    /// Count and summed total per status.
    pub async fn stats(&self, scope: &OwnerScope) -> Result<Vec<StatusTotals>, InventoryError> {
        self.mark_overdue(scope).await?;
        let rows = scope
            .collection(self.db.invoices())
            .aggregate(vec![
                doc! {
                    "$group": {
                        "_id": "$status",
                        "count": { "$sum": 1 },
                        "total_amount": { "$sum": "$total_amount" },
                    }
                },
                doc! { "$sort": { "_id": 1 } },
            ])
            .await?;

        rows.into_iter()
            .map(|row| {
                bson::from_document::<StatusTotals>(row)
                    .map(|mut totals| {
                        totals.total_amount = totals.total_amount.round_dp(2);
                        totals
                    })
                    .map_err(|e| InventoryError::Internal(anyhow::anyhow!("Malformed stats row: {}", e)))
            })
            .collect()
    }
}
