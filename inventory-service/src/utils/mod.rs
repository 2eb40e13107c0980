pub mod password;
pub mod validation;

pub use password::{hash_password, verify_password, Password};
pub use validation::{contains_pattern, ValidatedJson};
