//! Invoice numbers: `INV-{YY}-{MM}-{branch suffix}-{seq}`.
//!
//! The sequence comes from a per-branch counter document incremented inside
//! the invoice-creation transaction, so concurrent creations never observe
//! the same value and an aborted transaction gives its number back.
//!
//! Suffixes are not unique across branches, while `invoice_number` is unique
//! system-wide. [`assign_number`] therefore skips any value some other
//! branch already holds, moving the counter past it.

use crate::models::branch::branch_suffix;
use crate::models::{Invoice, InvoiceCounter};
use crate::services::error::InventoryError;
use crate::services::scope::OwnerScope;
use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{ClientSession, Collection};

pub fn format_invoice_number(now: DateTime<Utc>, branch_id: &str, seq: i64) -> String {
    format!(
        "INV-{}-{}-{:04}",
        now.format("%y-%m"),
        branch_suffix(branch_id),
        seq
    )
}

const MAX_SKIPS: usize = 1000;

/// Draws the branch's next free invoice number inside `session`.
pub async fn assign_number(
    counters: &Collection<InvoiceCounter>,
    invoices: &Collection<Invoice>,
    scope: &OwnerScope,
    branch_id: &str,
    now: DateTime<Utc>,
    session: &mut ClientSession,
) -> Result<String, InventoryError> {
    for _ in 0..MAX_SKIPS {
        let seq = next_sequence(counters, scope, branch_id, session).await?;
        let number = format_invoice_number(now, branch_id, seq);
        if !is_taken(invoices, &number, session).await? {
            return Ok(number);
        }
        tracing::warn!(
            branch_id = %branch_id,
            invoice_number = %number,
            "Invoice number held by another branch, skipping"
        );
    }
    Err(InventoryError::Internal(anyhow::anyhow!(
        "No free invoice number for branch {}",
        branch_id
    )))
}

/// Unscoped on purpose: the number must be free for every owner.
async fn is_taken(
    invoices: &Collection<Invoice>,
    number: &str,
    session: &mut ClientSession,
) -> Result<bool, InventoryError> {
    let count = invoices
        .count_documents_with_session(doc! { "invoice_number": number }, None, session)
        .await?;
    Ok(count > 0)
}

/// Increments and returns the branch's counter, creating it at 1.
pub async fn next_sequence(
    counters: &Collection<InvoiceCounter>,
    scope: &OwnerScope,
    branch_id: &str,
    session: &mut ClientSession,
) -> Result<i64, InventoryError> {
    let options = FindOneAndUpdateOptions::builder()
        .upsert(true)
        .return_document(ReturnDocument::After)
        .build();

    let counter = counters
        .find_one_and_update_with_session(
            scope.by_id(branch_id),
            doc! { "$inc": { "seq": 1_i64 } },
            options,
            session,
        )
        .await?
        .ok_or_else(|| anyhow::anyhow!("Counter upsert returned no document"))?;

    Ok(counter.seq)
}
