use crate::models::Branch;
use crate::services::database::MongoDb;
use crate::services::error::{is_duplicate_key, InventoryError};
use crate::services::scope::OwnerScope;
use mongodb::bson::{self, doc, Document};
use mongodb::options::FindOptions;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct BranchChanges {
    pub name: Option<String>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct BranchService {
    db: MongoDb,
}

fn by_name() -> FindOptions {
    FindOptions::builder().sort(doc! { "name": 1 }).build()
}

fn map_duplicate(e: InventoryError) -> InventoryError {
    match e {
        InventoryError::Database(ref db_err) if is_duplicate_key(db_err) => {
            InventoryError::DuplicateBranch
        }
        other => other,
    }
}

impl BranchService {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }

    pub async fn list(&self, scope: &OwnerScope, active_only: bool) -> Result<Vec<Branch>, InventoryError> {
        let filter = if active_only {
            doc! { "is_active": true }
        } else {
            Document::new()
        };
        scope.collection(self.db.branches()).find(filter, by_name()).await
    }

    pub async fn get(&self, scope: &OwnerScope, id: &str) -> Result<Branch, InventoryError> {
        scope
            .collection(self.db.branches())
            .find_by_id(id)
            .await?
            .ok_or(InventoryError::NotFound("Branch"))
    }

    /// Branches keyed by id, for embedding summaries in other responses.
    pub async fn lookup(
        &self,
        scope: &OwnerScope,
        ids: &[&str],
    ) -> Result<HashMap<String, Branch>, InventoryError> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let branches = scope
            .collection(self.db.branches())
            .find(doc! { "_id": { "$in": ids } }, None)
            .await?;
        Ok(branches.into_iter().map(|b| (b.id.clone(), b)).collect())
    }

    pub async fn create(
        &self,
        scope: &OwnerScope,
        name: &str,
        location: &str,
    ) -> Result<Branch, InventoryError> {
        let branches = scope.collection(self.db.branches());
        let branch = Branch::new(scope.owner_id().to_string(), name, location);
        if branch.name.is_empty() || branch.location.is_empty() {
            return Err(InventoryError::Validation(
                "Branch name and location are required".into(),
            ));
        }

        if branches.exists(doc! { "name": &branch.name }).await? {
            return Err(InventoryError::DuplicateBranch);
        }
        branches.insert(&branch).await.map_err(map_duplicate)?;

        tracing::info!(branch_id = %branch.id, name = %branch.name, "Branch created");
        Ok(branch)
    }

    pub async fn update(
        &self,
        scope: &OwnerScope,
        id: &str,
        changes: BranchChanges,
    ) -> Result<Branch, InventoryError> {
        let branches = scope.collection(self.db.branches());
        let mut set = doc! { "updated_at": bson::DateTime::now() };

        if let Some(name) = changes.name.as_deref().map(str::trim) {
            if name.is_empty() {
                return Err(InventoryError::Validation("Branch name cannot be empty".into()));
            }
            if branches
                .exists(doc! { "name": name, "_id": { "$ne": id } })
                .await?
            {
                return Err(InventoryError::DuplicateBranch);
            }
            set.insert("name", name);
        }
        if let Some(location) = changes.location.as_deref().map(str::trim) {
            if location.is_empty() {
                return Err(InventoryError::Validation("Branch location cannot be empty".into()));
            }
            set.insert("location", location);
        }
        if let Some(is_active) = changes.is_active {
            set.insert("is_active", is_active);
        }

        branches
            .update_by_id(id, doc! { "$set": set })
            .await
            .map_err(map_duplicate)?
            .ok_or(InventoryError::NotFound("Branch"))
    }

    /// Refused while any of the owner's products are stocked at the branch.
    pub async fn delete(&self, scope: &OwnerScope, id: &str) -> Result<(), InventoryError> {
        let in_use = scope
            .collection(self.db.products())
            .exists(doc! { "branch_id": id })
            .await?;
        if in_use {
            return Err(InventoryError::InUse("branch"));
        }

        scope
            .collection(self.db.branches())
            .delete_by_id(id)
            .await?
            .ok_or(InventoryError::NotFound("Branch"))?;
        tracing::info!(branch_id = %id, "Branch deleted");
        Ok(())
    }
}
