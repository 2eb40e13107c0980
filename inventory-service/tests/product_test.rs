mod common;

use common::{expect_status, TestApp, TestUser};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn search(app: &TestApp, user: &TestUser, query: &str) -> Vec<Value> {
    let response = app
        .get(user, &format!("/products/search?{}", query))
        .send()
        .await
        .expect("Failed to execute request");
    expect_status(response, StatusCode::OK)
        .await
        .as_array()
        .cloned()
        .unwrap_or_default()
}

#[tokio::test]
async fn created_product_embeds_branch_and_category() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let (branch, product) = app.seed_widget(&user).await;

    assert_eq!(product["name"], "Widget");
    assert_eq!(product["quantity"], 50);
    assert_eq!(product["price"].as_f64(), Some(9.99));
    assert_eq!(product["status"], "In Stock");
    assert_eq!(product["branchId"], branch["id"]);
    assert_eq!(product["branch"]["name"], "Downtown");
    assert_eq!(product["branch"]["location"], "Main St");
    assert_eq!(product["category"]["name"], "Hardware");

    app.cleanup().await;
}

#[tokio::test]
async fn initial_status_follows_quantity() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let branch = app.create_branch(&user, "Downtown", "Main St").await;
    let category = app.create_category(&user, "Hardware").await;
    let (branch_id, category_id) = (branch["id"].as_str().unwrap(), category["id"].as_str().unwrap());

    let low = app.create_product(&user, "Bolt", category_id, branch_id, 3, 0.25).await;
    assert_eq!(low["status"], "Low Stock");

    let none = app.create_product(&user, "Nut", category_id, branch_id, 0, 0.1).await;
    assert_eq!(none["status"], "Out of Stock");

    app.cleanup().await;
}

#[tokio::test]
async fn invalid_references_and_prices_are_rejected() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let branch = app.create_branch(&user, "Downtown", "Main St").await;
    let category = app.create_category(&user, "Hardware").await;

    let response = app
        .post(
            &user,
            "/products",
            &json!({
                "name": "Widget",
                "category": "missing-category",
                "branch": branch["id"],
                "quantity": 1,
                "price": 1.0
            }),
        )
        .send()
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["message"], "Category not found: missing-category");

    let response = app
        .post(
            &user,
            "/products",
            &json!({
                "name": "Widget",
                "categoryId": category["id"],
                "branchId": branch["id"],
                "quantity": 1,
                "price": 0
            }),
        )
        .send()
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["message"], "Price must be greater than zero");

    // Rounds to 0.00 in cents.
    let response = app
        .post(
            &user,
            "/products",
            &json!({
                "name": "Washer",
                "category": category["id"],
                "branch": branch["id"],
                "quantity": 1,
                "price": 0.004
            }),
        )
        .send()
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["message"], "Price must be greater than zero");

    let response = app
        .post(
            &user,
            "/products",
            &json!({
                "name": "Widget",
                "category": category["id"],
                "branch": branch["id"],
                "quantity": -4,
                "price": 1.0
            }),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await;
}

#[tokio::test]
async fn quantity_update_rederives_status() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let (_branch, product) = app.seed_widget(&user).await;
    let path = format!("/products/{}", product["id"].as_str().unwrap());

    let response = app
        .put(&user, &path, &json!({ "quantity": 2, "price": 12.5 }))
        .send()
        .await
        .unwrap();
    let updated = expect_status(response, StatusCode::OK).await;
    assert_eq!(updated["quantity"], 2);
    assert_eq!(updated["price"].as_f64(), Some(12.5));
    assert_eq!(updated["status"], "Low Stock");

    let response = app
        .put(&user, &format!("{}/status", path), &json!({ "status": "Out of Stock" }))
        .send()
        .await
        .unwrap();
    let updated = expect_status(response, StatusCode::OK).await;
    assert_eq!(updated["status"], "Out of Stock");
    assert_eq!(updated["quantity"], 2);

    let response = app
        .put(&user, &format!("{}/status", path), &json!({ "status": "Sold Out" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await;
}

#[tokio::test]
async fn search_combines_text_and_filters() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let downtown = app.create_branch(&user, "Downtown", "Main St").await;
    let uptown = app.create_branch(&user, "Uptown", "Hill Rd").await;
    let hardware = app.create_category(&user, "Hardware").await;
    let (downtown_id, uptown_id, hardware_id) = (
        downtown["id"].as_str().unwrap(),
        uptown["id"].as_str().unwrap(),
        hardware["id"].as_str().unwrap(),
    );

    app.create_product(&user, "Blue Widget", hardware_id, downtown_id, 50, 9.99).await;
    app.create_product(&user, "Red Widget", hardware_id, uptown_id, 5, 9.99).await;
    app.create_product(&user, "Gadget (v2.0)", hardware_id, downtown_id, 20, 19.0).await;

    let found = search(&app, &user, "query=widget").await;
    assert_eq!(found.len(), 2);

    let found = search(&app, &user, &format!("query=WIDGET&branch={}", uptown_id)).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "Red Widget");

    let found = search(&app, &user, "status=Low%20Stock").await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "Red Widget");

    // Regex metacharacters are matched literally.
    let found = search(&app, &user, "query=(v2.0)").await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "Gadget (v2.0)");
    assert!(search(&app, &user, "query=v2.").await.len() == 1);
    assert!(search(&app, &user, "query=.%2A").await.is_empty());

    let found = search(&app, &user, &format!("category={}", hardware_id)).await;
    assert_eq!(found.len(), 3);

    let response = app
        .get(&user, "/products/search?status=Plenty")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await;
}

#[tokio::test]
async fn products_are_isolated_per_owner() {
    let app = TestApp::spawn().await;
    let alice = app.signup("Alice").await;
    let bob = app.signup("Bob").await;
    let (branch, product) = app.seed_widget(&alice).await;
    let path = format!("/products/{}", product["id"].as_str().unwrap());

    let response = app.get(&bob, &path).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.delete(&bob, &path).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert!(search(&app, &bob, "query=widget").await.is_empty());

    // Bob cannot file a product under Alice's branch.
    let bob_category = app.create_category(&bob, "Hardware").await;
    let response = app
        .post(
            &bob,
            "/products",
            &json!({
                "name": "Sneaky",
                "category": bob_category["id"],
                "branch": branch["id"],
                "quantity": 1,
                "price": 1.0
            }),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.delete(&alice, &path).send().await.unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["message"], "Product deleted successfully");

    app.cleanup().await;
}
