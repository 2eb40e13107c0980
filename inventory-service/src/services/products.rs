use crate::models::product::{max_price, NewProduct, MAX_QUANTITY};
use crate::models::{Branch, Category, Product, StockStatus};
use crate::services::branches::BranchService;
use crate::services::categories::CategoryService;
use crate::services::database::MongoDb;
use crate::services::error::InventoryError;
use crate::services::scope::OwnerScope;
use crate::utils::contains_pattern;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::FindOptions;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub category_id: String,
    pub branch_id: String,
    pub quantity: i64,
    pub price: Decimal,
    pub status: Option<StockStatus>,
}

#[derive(Debug, Default, Clone)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub branch_id: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Decimal>,
    pub status: Option<StockStatus>,
}

#[derive(Debug, Default, Clone)]
pub struct ProductQuery {
    pub text: Option<String>,
    pub category_id: Option<String>,
    pub status: Option<StockStatus>,
    pub branch_id: Option<String>,
}

/// A product with the category and branch it references, when they still exist.
#[derive(Debug, Clone)]
pub struct ProductDetails {
    pub product: Product,
    pub category: Option<Category>,
    pub branch: Option<Branch>,
}

fn check_quantity(quantity: i64) -> Result<(), InventoryError> {
    if quantity < 0 {
        return Err(InventoryError::Validation("Quantity cannot be negative".into()));
    }
    if quantity > MAX_QUANTITY {
        return Err(InventoryError::Validation("Quantity is out of range".into()));
    }
    Ok(())
}

/// Rounds to cents, then requires the stored value to be positive.
fn normalize_price(price: Decimal) -> Result<Decimal, InventoryError> {
    let price = price.round_dp(2);
    if price <= Decimal::ZERO {
        return Err(InventoryError::Validation("Price must be greater than zero".into()));
    }
    if price > max_price() {
        return Err(InventoryError::Validation("Price is out of range".into()));
    }
    Ok(price)
}

fn search_filter(query: &ProductQuery) -> Document {
    let mut filter = Document::new();
    if let Some(text) = query.text.as_deref().filter(|t| !t.trim().is_empty()) {
        let pattern = contains_pattern(text);
        filter.insert(
            "$or",
            vec![
                doc! { "name": { "$regex": &pattern, "$options": "i" } },
                doc! { "description": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }
    if let Some(category_id) = &query.category_id {
        filter.insert("category_id", category_id.clone());
    }
    if let Some(status) = query.status {
        filter.insert("status", status.as_str());
    }
    if let Some(branch_id) = &query.branch_id {
        filter.insert("branch_id", branch_id.clone());
    }
    filter
}

#[derive(Clone)]
pub struct ProductService {
    db: MongoDb,
    branches: BranchService,
    categories: CategoryService,
    low_stock_threshold: i64,
}

impl ProductService {
    pub fn new(db: MongoDb, low_stock_threshold: i64) -> Self {
        Self {
            branches: BranchService::new(db.clone()),
            categories: CategoryService::new(db.clone()),
            db,
            low_stock_threshold,
        }
    }

    pub async fn list(&self, scope: &OwnerScope) -> Result<Vec<ProductDetails>, InventoryError> {
        self.search(scope, &ProductQuery::default()).await
    }

    pub async fn search(
        &self,
        scope: &OwnerScope,
        query: &ProductQuery,
    ) -> Result<Vec<ProductDetails>, InventoryError> {
        let options = FindOptions::builder().sort(doc! { "name": 1 }).build();
        let products = scope
            .collection(self.db.products())
            .find(search_filter(query), options)
            .await?;
        self.with_references(scope, products).await
    }

    pub async fn get(&self, scope: &OwnerScope, id: &str) -> Result<ProductDetails, InventoryError> {
        let product = scope
            .collection(self.db.products())
            .find_by_id(id)
            .await?
            .ok_or(InventoryError::NotFound("Product"))?;
        self.details(scope, product).await
    }

    pub async fn create(
        &self,
        scope: &OwnerScope,
        input: ProductInput,
    ) -> Result<ProductDetails, InventoryError> {
        if input.name.trim().is_empty() {
            return Err(InventoryError::Validation("Product name is required".into()));
        }
        check_quantity(input.quantity)?;
        let price = normalize_price(input.price)?;
        self.check_category(scope, &input.category_id).await?;
        self.check_branch(scope, &input.branch_id).await?;

        let status = input
            .status
            .unwrap_or_else(|| StockStatus::for_quantity(input.quantity, self.low_stock_threshold));
        let product = Product::new(
            scope.owner_id().to_string(),
            NewProduct {
                name: input.name,
                description: input.description,
                category_id: input.category_id,
                branch_id: input.branch_id,
                quantity: input.quantity,
                price,
                status,
            },
        );
        scope.collection(self.db.products()).insert(&product).await?;

        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        self.details(scope, product).await
    }

    /// Partial update. A quantity change without an explicit status re-derives it.
    pub async fn update(
        &self,
        scope: &OwnerScope,
        id: &str,
        changes: ProductChanges,
    ) -> Result<ProductDetails, InventoryError> {
        let mut set = doc! { "updated_at": bson::DateTime::now() };

        if let Some(name) = changes.name.as_deref().map(str::trim) {
            if name.is_empty() {
                return Err(InventoryError::Validation("Product name cannot be empty".into()));
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
        if let Some(category_id) = &changes.category_id {
            self.check_category(scope, category_id).await?;
            set.insert("category_id", category_id.clone());
        }
        if let Some(branch_id) = &changes.branch_id {
            self.check_branch(scope, branch_id).await?;
            set.insert("branch_id", branch_id.clone());
        }
        if let Some(price) = changes.price {
            let price = normalize_price(price)?
                .to_f64()
                .ok_or_else(|| InventoryError::Validation("Price is out of range".into()))?;
            set.insert("price", price);
        }
        if let Some(quantity) = changes.quantity {
            check_quantity(quantity)?;
            set.insert("quantity", quantity);
        }
        let status = changes.status.or_else(|| {
            changes
                .quantity
                .map(|q| StockStatus::for_quantity(q, self.low_stock_threshold))
        });
        if let Some(status) = status {
            set.insert("status", status.as_str());
        }

        let product = scope
            .collection(self.db.products())
            .update_by_id(id, doc! { "$set": set })
            .await?
            .ok_or(InventoryError::NotFound("Product"))?;
        self.details(scope, product).await
    }

    pub async fn update_status(
        &self,
        scope: &OwnerScope,
        id: &str,
        status: StockStatus,
    ) -> Result<ProductDetails, InventoryError> {
        let product = scope
            .collection(self.db.products())
            .update_by_id(
                id,
                doc! { "$set": { "status": status.as_str(), "updated_at": bson::DateTime::now() } },
            )
            .await?
            .ok_or(InventoryError::NotFound("Product"))?;
        self.details(scope, product).await
    }

    /// Invoices that reference the product keep their line items.
    pub async fn delete(&self, scope: &OwnerScope, id: &str) -> Result<(), InventoryError> {
        scope
            .collection(self.db.products())
            .delete_by_id(id)
            .await?
            .ok_or(InventoryError::NotFound("Product"))?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn check_category(&self, scope: &OwnerScope, id: &str) -> Result<(), InventoryError> {
        let exists = scope
            .collection(self.db.categories())
            .exists(doc! { "_id": id })
            .await?;
        if !exists {
            return Err(InventoryError::InvalidReference(format!("Category not found: {}", id)));
        }
        Ok(())
    }

    async fn check_branch(&self, scope: &OwnerScope, id: &str) -> Result<(), InventoryError> {
        let exists = scope
            .collection(self.db.branches())
            .exists(doc! { "_id": id })
            .await?;
        if !exists {
            return Err(InventoryError::InvalidReference(format!("Branch not found: {}", id)));
        }
        Ok(())
    }

    async fn details(
        &self,
        scope: &OwnerScope,
        product: Product,
    ) -> Result<ProductDetails, InventoryError> {
        let mut details = self.with_references(scope, vec![product]).await?;
        details
            .pop()
            .ok_or_else(|| InventoryError::Internal(anyhow::anyhow!("Product details lost")))
    }

    async fn with_references(
        &self,
        scope: &OwnerScope,
        products: Vec<Product>,
    ) -> Result<Vec<ProductDetails>, InventoryError> {
        let category_ids: Vec<&str> = products.iter().map(|p| p.category_id.as_str()).collect();
        let branch_ids: Vec<&str> = products.iter().map(|p| p.branch_id.as_str()).collect();
        let categories = self.categories.lookup(scope, &category_ids).await?;
        let branches = self.branches.lookup(scope, &branch_ids).await?;

        Ok(products
            .into_iter()
            .map(|product| ProductDetails {
                category: categories.get(&product.category_id).cloned(),
                branch: branches.get(&product.branch_id).cloned(),
                product,
            })
            .collect())
    }
}
