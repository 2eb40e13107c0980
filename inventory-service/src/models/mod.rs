pub mod branch;
pub mod category;
pub mod invoice;
pub mod product;
pub mod user;

pub use branch::Branch;
pub use category::Category;
pub use invoice::{Client, Invoice, InvoiceCounter, InvoiceStatus, LineItem, PaymentTerms};
pub use product::{Product, StockStatus};
pub use user::User;
