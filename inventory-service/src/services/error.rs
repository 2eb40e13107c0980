use mongodb::error::{
    ErrorKind, WriteFailure, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT,
};
use service_core::error::AppError;
use thiserror::Error;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("User no longer exists")]
    UnknownUser,

    #[error("Branch with this name already exists")]
    DuplicateBranch,

    #[error("Category already exists")]
    DuplicateCategory,

    #[error("{0} not found")]
    NotFound(&'static str),

    /// A referenced document (branch, category, product) does not exist for
    /// the acting owner.
    #[error("{0}")]
    InvalidReference(String),

    #[error("Insufficient quantity for product: {0}")]
    InsufficientStock(String),

    #[error("Cannot delete {0} as it is being used by products")]
    InUse(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("Invoice number {0} is already taken")]
    DuplicateInvoiceNumber(String),

    #[error("Document does not belong to the acting owner")]
    OwnershipViolation,
}

impl InventoryError {
    /// True when MongoDB labelled the failure as safe to retry as a whole
    /// transaction.
    pub fn is_transient(&self) -> bool {
        matches!(self, InventoryError::Database(e) if e.contains_label(TRANSIENT_TRANSACTION_ERROR))
    }
}

/// The commit may or may not have been applied; retrying the commit itself is safe.
pub fn is_unknown_commit_result(err: &mongodb::error::Error) -> bool {
    err.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
}

pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            InventoryError::Internal(e) => AppError::InternalError(e),
            InventoryError::InvalidCredentials | InventoryError::UnknownUser => {
                AppError::Unauthorized(anyhow::anyhow!(err.to_string()))
            }
            InventoryError::NotFound(_) => AppError::NotFound(anyhow::anyhow!(err.to_string())),
            InventoryError::EmailAlreadyRegistered
            | InventoryError::DuplicateBranch
            | InventoryError::DuplicateCategory
            | InventoryError::InvalidReference(_)
            | InventoryError::InsufficientStock(_)
            | InventoryError::InUse(_)
            | InventoryError::Validation(_) => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            InventoryError::DuplicateInvoiceNumber(_) => {
                AppError::Conflict(anyhow::anyhow!(err.to_string()))
            }
            InventoryError::OwnershipViolation => {
                AppError::InternalError(anyhow::anyhow!(err.to_string()))
            }
        }
    }
}
