#![allow(dead_code)]

use inventory_service::config::InventoryConfig;
use inventory_service::services::{init_metrics, MongoDb};
use inventory_service::startup::Application;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

/// Needs a replica set: invoice writes run in multi-document transactions.
const DEFAULT_TEST_MONGODB_URI: &str = "mongodb://localhost:27017/?replicaSet=rs0";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: MongoDb,
    pub db_name: String,
    pub client: Client,
}

/// A signed-up user and the bearer token issued to them.
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        init_metrics();
        if std::env::var("MONGODB_URI").is_err() {
            std::env::set_var("MONGODB_URI", DEFAULT_TEST_MONGODB_URI);
        }

        let db_name = format!("inventory_test_{}", Uuid::new_v4().simple());

        let mut config = InventoryConfig::load().expect("Failed to load configuration");
        config.common.port = 0;
        config.mongodb.database = db_name.clone();

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let db = app.db().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            db,
            db_name,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    pub fn get(&self, user: &TestUser, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(&user.token)
    }

    pub fn post(&self, user: &TestUser, path: &str, body: &Value) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(&user.token).json(body)
    }

    pub fn put(&self, user: &TestUser, path: &str, body: &Value) -> RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(&user.token).json(body)
    }

    pub fn delete(&self, user: &TestUser, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(&user.token)
    }

    pub async fn signup(&self, name: &str) -> TestUser {
        let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4().simple());
        let response = self
            .client
            .post(self.url("/signup"))
            .json(&json!({ "name": name, "email": email, "password": "s3cret-pass" }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: Value = response.json().await.expect("Failed to parse JSON");
        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            email,
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn create_branch(&self, user: &TestUser, name: &str, location: &str) -> Value {
        let response = self
            .post(user, "/branches", &json!({ "name": name, "location": location }))
            .send()
            .await
            .expect("Failed to execute request");
        expect_status(response, StatusCode::CREATED).await
    }

    pub async fn create_category(&self, user: &TestUser, name: &str) -> Value {
        let response = self
            .post(user, "/categories", &json!({ "name": name }))
            .send()
            .await
            .expect("Failed to execute request");
        expect_status(response, StatusCode::CREATED).await
    }

    pub async fn create_product(
        &self,
        user: &TestUser,
        name: &str,
        category_id: &str,
        branch_id: &str,
        quantity: i64,
        price: f64,
    ) -> Value {
        let response = self
            .post(
                user,
                "/products",
                &json!({
                    "name": name,
                    "category": category_id,
                    "branch": branch_id,
                    "quantity": quantity,
                    "price": price
                }),
            )
            .send()
            .await
            .expect("Failed to execute request");
        expect_status(response, StatusCode::CREATED).await
    }

    /// Branch "Downtown" on "Main St" stocking 50 "Widget" at 9.99.
    pub async fn seed_widget(&self, user: &TestUser) -> (Value, Value) {
        let branch = self.create_branch(user, "Downtown", "Main St").await;
        let category = self.create_category(user, "Hardware").await;
        let product = self
            .create_product(
                user,
                "Widget",
                category["id"].as_str().unwrap(),
                branch["id"].as_str().unwrap(),
                50,
                9.99,
            )
            .await;
        (branch, product)
    }

    pub async fn product_quantity(&self, user: &TestUser, product_id: &str) -> i64 {
        let response = self
            .get(user, &format!("/products/{}", product_id))
            .send()
            .await
            .expect("Failed to execute request");
        let body = expect_status(response, StatusCode::OK).await;
        body["quantity"].as_i64().unwrap()
    }

    pub async fn cleanup(&self) {
        let _ = self.db.client().database(&self.db_name).drop(None).await;
    }
}

pub async fn expect_status(response: Response, expected: StatusCode) -> Value {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    assert_eq!(status, expected, "unexpected response body: {}", body);
    body
}
