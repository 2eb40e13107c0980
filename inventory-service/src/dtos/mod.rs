pub mod auth;
pub mod branches;
pub mod categories;
pub mod invoices;
pub mod products;

use serde::Serialize;

pub use auth::{AuthResponse, SigninRequest, SignupRequest, UserResponse};
pub use branches::{BranchResponse, BranchSummary, CreateBranchRequest, UpdateBranchRequest};
pub use categories::{
    CategoryResponse, CategorySummary, CreateCategoryRequest, UpdateCategoryRequest,
};
pub use invoices::{
    CreateInvoiceRequest, InvoiceListParams, InvoiceResponse, InvoiceStatsResponse,
    UpdateInvoiceStatusRequest,
};
pub use products::{
    CreateProductRequest, ProductResponse, ProductSearchParams, UpdateProductRequest,
    UpdateProductStatusRequest,
};

/// Body of delete endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
