mod common;

use common::{expect_status, TestApp};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn category_crud_round_trip() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;

    let response = app
        .post(&user, "/categories", &json!({ "name": "Tools", "description": "Hand tools" }))
        .send()
        .await
        .expect("Failed to execute request");
    let category = expect_status(response, StatusCode::CREATED).await;
    assert_eq!(category["description"], "Hand tools");
    let path = format!("/categories/{}", category["id"].as_str().unwrap());

    let response = app
        .put(&user, &path, &json!({ "name": "Power Tools", "description": "" }))
        .send()
        .await
        .expect("Failed to execute request");
    let updated = expect_status(response, StatusCode::OK).await;
    assert_eq!(updated["name"], "Power Tools");
    assert!(updated["description"].is_null());

    let response = app.delete(&user, &path).send().await.unwrap();
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["message"], "Category deleted successfully");

    let response = app.delete(&user, &path).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_category_is_rejected() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;
    let other = app.signup("Other").await;

    app.create_category(&user, "Tools").await;
    let response = app
        .post(&user, "/categories", &json!({ "name": "Tools" }))
        .send()
        .await
        .expect("Failed to execute request");
    let body = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["message"], "Category already exists");

    let garden = app.create_category(&user, "Garden").await;
    let response = app
        .put(
            &user,
            &format!("/categories/{}", garden["id"].as_str().unwrap()),
            &json!({ "name": "Tools" }),
        )
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.create_category(&other, "Tools").await;

    app.cleanup().await;
}

#[tokio::test]
async fn active_categories_and_in_use_guard() {
    let app = TestApp::spawn().await;
    let user = app.signup("Owner").await;

    let branch = app.create_branch(&user, "Downtown", "Main St").await;
    let used = app.create_category(&user, "Hardware").await;
    let retired = app.create_category(&user, "Retired").await;
    app.create_product(
        &user,
        "Widget",
        used["id"].as_str().unwrap(),
        branch["id"].as_str().unwrap(),
        5,
        1.5,
    )
    .await;

    let response = app
        .put(
            &user,
            &format!("/categories/{}", retired["id"].as_str().unwrap()),
            &json!({ "isActive": false }),
        )
        .send()
        .await
        .unwrap();
    expect_status(response, StatusCode::OK).await;

    let response = app.get(&user, "/categories/active").send().await.unwrap();
    let active = expect_status(response, StatusCode::OK).await;
    let names: Vec<&str> = active
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Hardware"]);

    let response = app
        .delete(&user, &format!("/categories/{}", used["id"].as_str().unwrap()))
        .send()
        .await
        .unwrap();
    let body = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["message"], "Cannot delete category as it is being used by products");

    app.cleanup().await;
}
