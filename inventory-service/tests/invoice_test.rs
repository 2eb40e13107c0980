mod common;

use common::{expect_status, TestApp, TestUser};
use futures::future::join_all;
use inventory_service::models::Branch;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn invoice_body(branch_id: &str, items: Value) -> Value {
    json!({
        "branch": branch_id,
        "client": { "name": "Acme Corp", "email": "billing@acme.test" },
        "items": items,
        "paymentTerms": "Net 30"
    })
}

async fn create_invoice(app: &TestApp, user: &TestUser, body: &Value) -> Value {
    let response = app
        .post(user, "/invoices", body)
        .send()
        .await
        .expect("Failed to execute request");
    expect_status(response, StatusCode::CREATED).await
}

fn suffix(branch_id: &str) -> &str {
    &branch_id[branch_id.len() - 4..]
}

#[tokio::test]
async fn invoice_decrements_stock_and_delete_restores_it() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let (branch, product) = app.seed_widget(&user).await;
    let product_id = product["id"].as_str().unwrap();

    let invoice = create_invoice(
        &app,
        &user,
        &invoice_body(
            branch["id"].as_str().unwrap(),
            json!([{ "product": product_id, "quantity": 5 }]),
        ),
    )
    .await;

    assert_eq!(invoice["totalAmount"].as_f64(), Some(49.95));
    assert_eq!(invoice["status"], "Pending");
    assert_eq!(invoice["items"][0]["description"], "Widget");
    assert_eq!(invoice["items"][0]["price"].as_f64(), Some(9.99));
    assert_eq!(invoice["items"][0]["amount"].as_f64(), Some(49.95));
    assert_eq!(invoice["branch"]["name"], "Downtown");
    assert_eq!(app.product_quantity(&user, product_id).await, 45);

    let response = app
        .delete(&user, &format!("/invoices/{}", invoice["id"].as_str().unwrap()))
        .send()
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["message"], "Invoice deleted successfully");
    assert_eq!(app.product_quantity(&user, product_id).await, 50);

    app.cleanup().await;
}

#[tokio::test]
async fn invoice_numbers_are_sequential_per_branch() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let (branch, product) = app.seed_widget(&user).await;
    let branch_id = branch["id"].as_str().unwrap();
    let body = invoice_body(branch_id, json!([{ "product": product["id"], "quantity": 1 }]));

    let first = create_invoice(&app, &user, &body).await;
    let second = create_invoice(&app, &user, &body).await;

    let prefix = format!(
        "INV-{}-{}",
        chrono::Utc::now().format("%y-%m"),
        suffix(branch_id)
    );
    assert_eq!(first["invoiceNumber"], format!("{}-0001", prefix));
    assert_eq!(second["invoiceNumber"], format!("{}-0002", prefix));

    app.cleanup().await;
}

#[tokio::test]
async fn custom_price_and_description_override_product_defaults() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let (branch, product) = app.seed_widget(&user).await;

    let invoice = create_invoice(
        &app,
        &user,
        &invoice_body(
            branch["id"].as_str().unwrap(),
            json!([{
                "productId": product["id"],
                "description": "Widget, bulk rate",
                "quantity": 3,
                "price": 8.5
            }]),
        ),
    )
    .await;

    assert_eq!(invoice["items"][0]["description"], "Widget, bulk rate");
    assert_eq!(invoice["totalAmount"].as_f64(), Some(25.5));

    app.cleanup().await;
}

#[tokio::test]
async fn insufficient_stock_rolls_back_every_line() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let (branch, widget) = app.seed_widget(&user).await;
    let branch_id = branch["id"].as_str().unwrap();
    let gadget = app
        .create_product(
            &user,
            "Gadget",
            widget["categoryId"].as_str().unwrap(),
            branch_id,
            2,
            19.99,
        )
        .await;

    let response = app
        .post(
            &user,
            "/invoices",
            &invoice_body(
                branch_id,
                json!([
                    { "product": widget["id"], "quantity": 5 },
                    { "product": gadget["id"], "quantity": 3 }
                ]),
            ),
        )
        .send()
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["message"], "Insufficient quantity for product: Gadget");

    assert_eq!(app.product_quantity(&user, widget["id"].as_str().unwrap()).await, 50);
    assert_eq!(app.product_quantity(&user, gadget["id"].as_str().unwrap()).await, 2);

    let response = app.get(&user, "/invoices").send().await.unwrap();
    let invoices = expect_status(response, StatusCode::OK).await;
    assert!(invoices.as_array().unwrap().is_empty());

    // The failed attempt does not consume a number.
    let invoice = create_invoice(
        &app,
        &user,
        &invoice_body(branch_id, json!([{ "product": widget["id"], "quantity": 1 }])),
    )
    .await;
    assert!(invoice["invoiceNumber"].as_str().unwrap().ends_with("-0001"));

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_product_and_branch_are_rejected() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let (branch, product) = app.seed_widget(&user).await;

    let response = app
        .post(
            &user,
            "/invoices",
            &invoice_body(
                branch["id"].as_str().unwrap(),
                json!([{ "product": "no-such-product", "quantity": 1 }]),
            ),
        )
        .send()
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["message"], "Product not found: no-such-product");

    let response = app
        .post(
            &user,
            "/invoices",
            &invoice_body("no-such-branch", json!([{ "product": product["id"], "quantity": 1 }])),
        )
        .send()
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["message"], "Branch not found");

    let response = app
        .post(
            &user,
            "/invoices",
            &invoice_body(branch["id"].as_str().unwrap(), json!([])),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.product_quantity(&user, product["id"].as_str().unwrap()).await, 50);

    app.cleanup().await;
}

#[tokio::test]
async fn concurrent_invoices_get_distinct_numbers() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let (branch, product) = app.seed_widget(&user).await;
    let body = invoice_body(
        branch["id"].as_str().unwrap(),
        json!([{ "product": product["id"], "quantity": 2 }]),
    );

    let responses = join_all((0..5).map(|_| app.post(&user, "/invoices", &body).send())).await;

    let mut numbers = Vec::new();
    for response in responses {
        let invoice = expect_status(response.expect("Failed to execute request"), StatusCode::CREATED).await;
        numbers.push(invoice["invoiceNumber"].as_str().unwrap().to_string());
    }
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 5);
    assert!(numbers.last().unwrap().ends_with("-0005"));
    assert_eq!(app.product_quantity(&user, product["id"].as_str().unwrap()).await, 40);

    app.cleanup().await;
}

#[tokio::test]
async fn concurrent_invoices_never_oversell() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let branch = app.create_branch(&user, "Downtown", "Main St").await;
    let category = app.create_category(&user, "Hardware").await;
    let product = app
        .create_product(
            &user,
            "Widget",
            category["id"].as_str().unwrap(),
            branch["id"].as_str().unwrap(),
            5,
            9.99,
        )
        .await;
    let body = invoice_body(
        branch["id"].as_str().unwrap(),
        json!([{ "product": product["id"], "quantity": 2 }]),
    );

    let responses = join_all((0..3).map(|_| app.post(&user, "/invoices", &body).send())).await;

    let mut created = 0;
    let mut rejected = 0;
    for response in responses {
        let response = response.expect("Failed to execute request");
        match response.status() {
            StatusCode::CREATED => created += 1,
            StatusCode::BAD_REQUEST => {
                let body: Value = response.json().await.unwrap();
                assert_eq!(body["message"], "Insufficient quantity for product: Widget");
                rejected += 1;
            }
            other => panic!("unexpected status {}", other),
        }
    }
    assert_eq!(created, 2);
    assert_eq!(rejected, 1);
    assert_eq!(app.product_quantity(&user, product["id"].as_str().unwrap()).await, 1);

    app.cleanup().await;
}

/// Inserts a branch with a chosen id so suffixes can be made to collide.
async fn insert_branch(app: &TestApp, user: &TestUser, id: &str, name: &str) -> String {
    let mut branch = Branch::new(user.id.clone(), name, "Shared St");
    branch.id = id.to_string();
    app.db
        .branches()
        .insert_one(&branch, None)
        .await
        .expect("Failed to insert branch");
    branch.id
}

#[tokio::test]
async fn branches_sharing_a_suffix_still_get_unique_numbers() {
    let app = TestApp::spawn().await;
    let alice = app.signup("Alice").await;
    let bob = app.signup("Bob").await;

    let mut invoice_for = Vec::new();
    for (user, branch_id) in [
        (&alice, "11111111-1111-4111-8111-11111111abcd"),
        (&bob, "22222222-2222-4222-8222-22222222abcd"),
    ] {
        let branch_id = insert_branch(&app, user, branch_id, "Shared").await;
        let category = app.create_category(user, "Hardware").await;
        let product = app
            .create_product(user, "Widget", category["id"].as_str().unwrap(), &branch_id, 50, 9.99)
            .await;
        invoice_for.push((user, invoice_body(&branch_id, json!([{ "product": product["id"], "quantity": 1 }]))));
    }

    let mut numbers = Vec::new();
    for (user, body) in invoice_for.iter().chain(invoice_for.iter()) {
        let invoice = create_invoice(&app, user, body).await;
        let number = invoice["invoiceNumber"].as_str().unwrap().to_string();
        assert!(number.contains("-abcd-"));
        numbers.push(number);
    }

    let mut unique = numbers.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), numbers.len(), "numbers collided: {:?}", numbers);

    app.cleanup().await;
}

#[tokio::test]
async fn past_due_invoices_are_reported_overdue() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let (branch, product) = app.seed_widget(&user).await;
    let branch_id = branch["id"].as_str().unwrap();

    let mut old = invoice_body(branch_id, json!([{ "product": product["id"], "quantity": 1 }]));
    old["issueDate"] = json!("2020-01-01");
    old["paymentTerms"] = json!("Net 7");
    let old = create_invoice(&app, &user, &old).await;
    assert!(old["dueDate"].as_str().unwrap().starts_with("2020-01-08"));

    let fresh = create_invoice(
        &app,
        &user,
        &invoice_body(branch_id, json!([{ "product": product["id"], "quantity": 1 }])),
    )
    .await;

    let response = app.get(&user, "/invoices?status=Overdue").send().await.unwrap();
    let overdue = expect_status(response, StatusCode::OK).await;
    let overdue = overdue.as_array().unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0]["id"], old["id"]);

    let response = app.get(&user, "/invoices?status=Pending").send().await.unwrap();
    let pending = expect_status(response, StatusCode::OK).await;
    assert_eq!(pending[0]["id"], fresh["id"]);

    app.cleanup().await;
}

#[tokio::test]
async fn list_filters_status_updates_and_stats() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let (downtown, product) = app.seed_widget(&user).await;
    let uptown = app.create_branch(&user, "Uptown", "Hill Rd").await;
    let line = json!([{ "product": product["id"], "quantity": 1 }]);

    let a = create_invoice(&app, &user, &invoice_body(downtown["id"].as_str().unwrap(), line.clone())).await;
    create_invoice(&app, &user, &invoice_body(downtown["id"].as_str().unwrap(), line.clone())).await;
    let c = create_invoice(&app, &user, &invoice_body(uptown["id"].as_str().unwrap(), line)).await;
    assert!(c["invoiceNumber"].as_str().unwrap().ends_with("-0001"));

    let response = app.get(&user, "/invoices").send().await.unwrap();
    let all = expect_status(response, StatusCode::OK).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0]["id"], c["id"]);

    let response = app
        .get(&user, &format!("/invoices?branch={}", uptown["id"].as_str().unwrap()))
        .send()
        .await
        .unwrap();
    let uptown_only = expect_status(response, StatusCode::OK).await;
    assert_eq!(uptown_only.as_array().unwrap().len(), 1);

    let response = app
        .put(&user, &format!("/invoices/{}/status", a["id"].as_str().unwrap()), &json!({ "status": "Paid" }))
        .send()
        .await
        .unwrap();
    let paid = expect_status(response, StatusCode::OK).await;
    assert_eq!(paid["status"], "Paid");

    let response = app
        .put(&user, &format!("/invoices/{}/status", a["id"].as_str().unwrap()), &json!({ "status": "Refunded" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get(&user, "/invoices?status=Refunded").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get(&user, "/invoices/stats").send().await.unwrap();
    let stats = expect_status(response, StatusCode::OK).await;
    let stats = stats.as_array().unwrap();
    let paid = stats.iter().find(|s| s["status"] == "Paid").unwrap();
    assert_eq!(paid["count"], 1);
    assert_eq!(paid["totalAmount"].as_f64(), Some(9.99));
    let pending = stats.iter().find(|s| s["status"] == "Pending").unwrap();
    assert_eq!(pending["count"], 2);
    assert_eq!(pending["totalAmount"].as_f64(), Some(19.98));

    app.cleanup().await;
}

#[tokio::test]
async fn invoices_are_isolated_per_owner() {
    let app = TestApp::spawn().await;
    let alice = app.signup("Alice").await;
    let bob = app.signup("Bob").await;
    let (branch, product) = app.seed_widget(&alice).await;

    let invoice = create_invoice(
        &app,
        &alice,
        &invoice_body(
            branch["id"].as_str().unwrap(),
            json!([{ "product": product["id"], "quantity": 1 }]),
        ),
    )
    .await;
    let path = format!("/invoices/{}", invoice["id"].as_str().unwrap());

    let response = app.get(&bob, &path).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.delete(&bob, &path).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get(&bob, "/invoices").send().await.unwrap();
    let listed = expect_status(response, StatusCode::OK).await;
    assert!(listed.as_array().unwrap().is_empty());

    // Bob cannot invoice against Alice's stock.
    let bob_branch = app.create_branch(&bob, "Bob's", "Side St").await;
    let response = app
        .post(
            &bob,
            "/invoices",
            &invoice_body(
                bob_branch["id"].as_str().unwrap(),
                json!([{ "product": product["id"], "quantity": 1 }]),
            ),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.product_quantity(&alice, product["id"].as_str().unwrap()).await, 49);

    app.cleanup().await;
}
