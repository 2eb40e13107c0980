use crate::models::{Branch, Category, Invoice, InvoiceCounter, Product, User};
use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

struct IndexSpec {
    collection: &'static str,
    name: &'static str,
    keys: Document,
    unique: bool,
}

impl IndexSpec {
    fn new(collection: &'static str, name: &'static str, keys: Document) -> Self {
        Self {
            collection,
            name,
            keys,
            unique: false,
        }
    }

    fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

fn index_specs() -> Vec<IndexSpec> {
    vec![
        IndexSpec::new("users", "email_unique", doc! { "email": 1 }).unique(),
        IndexSpec::new(
            "branches",
            "owner_name_unique",
            doc! { "owner_id": 1, "name": 1 },
        )
        .unique(),
        IndexSpec::new(
            "branches",
            "owner_active",
            doc! { "owner_id": 1, "is_active": 1 },
        ),
        IndexSpec::new(
            "categories",
            "owner_name_unique",
            doc! { "owner_id": 1, "name": 1 },
        )
        .unique(),
        IndexSpec::new(
            "categories",
            "owner_active",
            doc! { "owner_id": 1, "is_active": 1 },
        ),
        IndexSpec::new(
            "products",
            "owner_branch",
            doc! { "owner_id": 1, "branch_id": 1 },
        ),
        IndexSpec::new(
            "products",
            "owner_category",
            doc! { "owner_id": 1, "category_id": 1 },
        ),
        IndexSpec::new(
            "products",
            "owner_status",
            doc! { "owner_id": 1, "status": 1 },
        ),
        IndexSpec::new(
            "invoices",
            "invoice_number_unique",
            doc! { "invoice_number": 1 },
        )
        .unique(),
        IndexSpec::new(
            "invoices",
            "owner_branch_created",
            doc! { "owner_id": 1, "branch_id": 1, "created_at": -1 },
        ),
        IndexSpec::new(
            "invoices",
            "owner_status",
            doc! { "owner_id": 1, "status": 1 },
        ),
        IndexSpec::new("invoice_counters", "owner_lookup", doc! { "owner_id": 1 }),
    ]
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for inventory-service");

        for spec in index_specs() {
            let index = IndexModel::builder()
                .keys(spec.keys)
                .options(
                    IndexOptions::builder()
                        .name(spec.name.to_string())
                        .unique(spec.unique)
                        .build(),
                )
                .build();

            self.db
                .collection::<Document>(spec.collection)
                .create_index(index, None)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to create {} index on {} collection: {}",
                        spec.name,
                        spec.collection,
                        e
                    );
                    AppError::from(e)
                })?;
            tracing::debug!(collection = spec.collection, index = spec.name, "Created index");
        }

        tracing::info!("MongoDB indexes ready");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn branches(&self) -> Collection<Branch> {
        self.db.collection("branches")
    }

    pub fn categories(&self) -> Collection<Category> {
        self.db.collection("categories")
    }

    pub fn products(&self) -> Collection<Product> {
        self.db.collection("products")
    }

    pub fn invoices(&self) -> Collection<Invoice> {
        self.db.collection("invoices")
    }

    pub fn invoice_counters(&self) -> Collection<InvoiceCounter> {
        self.db.collection("invoice_counters")
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
