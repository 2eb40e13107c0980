use crate::models::Category;
use crate::services::database::MongoDb;
use crate::services::error::{is_duplicate_key, InventoryError};
use crate::services::scope::OwnerScope;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::FindOptions;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct CategoryChanges {
    pub name: Option<String>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct CategoryService {
    db: MongoDb,
}

fn map_duplicate(e: InventoryError) -> InventoryError {
    match e {
        InventoryError::Database(ref db_err) if is_duplicate_key(db_err) => {
            InventoryError::DuplicateCategory
        }
        other => other,
    }
}

impl CategoryService {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        scope: &OwnerScope,
        active_only: bool,
    ) -> Result<Vec<Category>, InventoryError> {
        let filter = if active_only {
            doc! { "is_active": true }
        } else {
            Document::new()
        };
        let options = FindOptions::builder().sort(doc! { "name": 1 }).build();
        scope.collection(self.db.categories()).find(filter, options).await
    }

    pub async fn lookup(
        &self,
        scope: &OwnerScope,
        ids: &[&str],
    ) -> Result<HashMap<String, Category>, InventoryError> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let categories = scope
            .collection(self.db.categories())
            .find(doc! { "_id": { "$in": ids } }, None)
            .await?;
        Ok(categories.into_iter().map(|c| (c.id.clone(), c)).collect())
    }

    pub async fn create(
        &self,
        scope: &OwnerScope,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, InventoryError> {
        let categories = scope.collection(self.db.categories());
        let category = Category::new(scope.owner_id().to_string(), name, description);
        if category.name.is_empty() {
            return Err(InventoryError::Validation("Category name is required".into()));
        }

        if categories.exists(doc! { "name": &category.name }).await? {
            return Err(InventoryError::DuplicateCategory);
        }
        categories.insert(&category).await.map_err(map_duplicate)?;

        tracing::info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn update(
        &self,
        scope: &OwnerScope,
        id: &str,
        changes: CategoryChanges,
    ) -> Result<Category, InventoryError> {
        let categories = scope.collection(self.db.categories());
        let mut set = doc! { "updated_at": bson::DateTime::now() };

        if let Some(name) = changes.name.as_deref().map(str::trim) {
            if name.is_empty() {
                return Err(InventoryError::Validation("Category name cannot be empty".into()));
            }
            if categories
                .exists(doc! { "name": name, "_id": { "$ne": id } })
                .await?
            {
                return Err(InventoryError::DuplicateCategory);
            }
            set.insert("name", name);
        }
        if let Some(description) = changes.description.as_deref().map(str::trim) {
            let value = if description.is_empty() {
                Bson::Null
            } else {
                Bson::String(description.to_string())
            };
            set.insert("description", value);
        }
        if let Some(is_active) = changes.is_active {
            set.insert("is_active", is_active);
        }

        categories
            .update_by_id(id, doc! { "$set": set })
            .await
            .map_err(map_duplicate)?
            .ok_or(InventoryError::NotFound("Category"))
    }

    /// Refused while any of the owner's products are filed under it.
    pub async fn delete(&self, scope: &OwnerScope, id: &str) -> Result<(), InventoryError> {
        let in_use = scope
            .collection(self.db.products())
            .exists(doc! { "category_id": id })
            .await?;
        if in_use {
            return Err(InventoryError::InUse("category"));
        }

        scope
            .collection(self.db.categories())
            .delete_by_id(id)
            .await?
            .ok_or(InventoryError::NotFound("Category"))?;
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
