pub mod auth;
pub mod branches;
pub mod categories;
pub mod database;
pub mod error;
pub mod invoices;
pub mod jwt;
pub mod metrics;
pub mod numbering;
pub mod products;
pub mod scope;
pub mod transaction;

pub use auth::AuthService;
pub use branches::{BranchChanges, BranchService};
pub use categories::{CategoryChanges, CategoryService};
pub use database::MongoDb;
pub use error::InventoryError;
pub use invoices::{CreateInvoice, InvoiceFilter, InvoiceService, ItemInput, StatusTotals};
pub use jwt::{Claims, JwtService};
pub use metrics::{get_metrics, init_metrics};
pub use products::{ProductChanges, ProductDetails, ProductInput, ProductQuery, ProductService};
pub use scope::{OwnerScope, Owned, ScopedCollection};
pub use transaction::TransactionRunner;
