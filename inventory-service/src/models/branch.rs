use crate::services::scope::Owned;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A business location that holds inventory and issues invoices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub location: String,
    pub is_active: bool,
    pub owner_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Branch {
    pub fn new(owner_id: String, name: &str, location: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            location: location.trim().to_string(),
            is_active: true,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Last four characters of a branch id, embedded in invoice numbers. Not
/// unique: see `services::numbering::assign_number`.
pub fn branch_suffix(id: &str) -> &str {
    let start = id
        .char_indices()
        .rev()
        .nth(3)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &id[start..]
}

impl Owned for Branch {
    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}
