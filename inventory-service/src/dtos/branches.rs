use crate::models::Branch;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBranchRequest {
    #[validate(length(min = 1, max = 100, message = "Branch name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 200, message = "Branch location is required"))]
    pub location: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBranchRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchResponse {
    pub id: String,
    pub name: String,
    pub location: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Branch> for BranchResponse {
    fn from(branch: Branch) -> Self {
        Self {
            id: branch.id,
            name: branch.name,
            location: branch.location,
            is_active: branch.is_active,
            created_at: branch.created_at.to_rfc3339(),
            updated_at: branch.updated_at.to_rfc3339(),
        }
    }
}

/// Embedded in product and invoice responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct BranchSummary {
    pub id: String,
    pub name: String,
    pub location: String,
}

impl From<Branch> for BranchSummary {
    fn from(branch: Branch) -> Self {
        Self {
            id: branch.id,
            name: branch.name,
            location: branch.location,
        }
    }
}
