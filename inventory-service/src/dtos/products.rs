use crate::dtos::{BranchSummary, CategorySummary};
use crate::models::StockStatus;
use crate::services::{ProductChanges, ProductDetails, ProductInput};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Product name is required"))]
    pub name: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[serde(alias = "categoryId")]
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[serde(alias = "branchId")]
    #[validate(length(min = 1, message = "Branch is required"))]
    pub branch: String,

    #[validate(range(min = 0, max = 1_000_000_000, message = "Quantity must be between 0 and 1000000000"))]
    pub quantity: i64,

    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    pub status: Option<StockStatus>,
}

impl From<CreateProductRequest> for ProductInput {
    fn from(req: CreateProductRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            category_id: req.category,
            branch_id: req.branch,
            quantity: req.quantity,
            price: req.price,
            status: req.status,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[serde(alias = "categoryId")]
    pub category: Option<String>,

    #[serde(alias = "branchId")]
    pub branch: Option<String>,

    #[validate(range(min = 0, max = 1_000_000_000, message = "Quantity must be between 0 and 1000000000"))]
    pub quantity: Option<i64>,

    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,

    pub status: Option<StockStatus>,
}

impl From<UpdateProductRequest> for ProductChanges {
    fn from(req: UpdateProductRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            category_id: req.category,
            branch_id: req.branch,
            quantity: req.quantity,
            price: req.price,
            status: req.status,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductStatusRequest {
    pub status: StockStatus,
}

/// Query string of `GET /products/search`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductSearchParams {
    pub query: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: String,
    pub category: Option<CategorySummary>,
    pub branch_id: String,
    pub branch: Option<BranchSummary>,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub status: StockStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProductDetails> for ProductResponse {
    fn from(details: ProductDetails) -> Self {
        let product = details.product;
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            category_id: product.category_id,
            category: details.category.map(CategorySummary::from),
            branch_id: product.branch_id,
            branch: details.branch.map(BranchSummary::from),
            quantity: product.quantity,
            price: product.price,
            status: product.status,
            created_at: product.created_at.to_rfc3339(),
            updated_at: product.updated_at.to_rfc3339(),
        }
    }
}
