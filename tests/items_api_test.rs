//! Item endpoint tests. Items are isolated CRUD; nothing here touches
//! projects, tasks, or members.

mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn create_requires_a_name() {
    let app = common::spawn_app().await;

    let res = app.post("/items", json!({ "price": 10 })).await;
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Item name is required");
}

#[tokio::test]
async fn create_validates_numeric_ranges() {
    let app = common::spawn_app().await;

    let res = app
        .post("/items", json!({ "name": "Tripod", "price": -5 }))
        .await;
    assert_eq!(res.status(), 400);

    let res = app
        .post("/items", json!({ "name": "Tripod", "quantity": -1 }))
        .await;
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn crud_round_trip() {
    let app = common::spawn_app().await;

    let res = app
        .post(
            "/items",
            json!({ "name": "Tripod", "description": "carbon", "price": 129.5, "quantity": 3 }),
        )
        .await;
    assert_eq!(res.status(), 201);
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["category"], "General");
    assert_eq!(created["status"], "Active");

    let fetched: Value = app.get(&format!("/items/{id}")).await.json().await.unwrap();
    assert_eq!(fetched["name"], "Tripod");
    assert_eq!(fetched["price"], 129.5);

    let res = app
        .put(
            &format!("/items/{id}"),
            json!({ "status": "Inactive", "quantity": 0 }),
        )
        .await;
    assert_eq!(res.status(), 200);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["status"], "Inactive");
    assert_eq!(updated["quantity"], 0);
    // Untouched fields survive a partial PUT.
    assert_eq!(updated["name"], "Tripod");

    let list: Value = app.get("/items").await.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);

    let res = app.delete(&format!("/items/{id}")).await;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Item deleted");
    assert_eq!(body["item"]["name"], "Tripod");

    let res = app.get(&format!("/items/{id}")).await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn unknown_item_is_404() {
    let app = common::spawn_app().await;

    assert_eq!(app.get("/items/missing").await.status(), 404);
    assert_eq!(app.put("/items/missing", json!({})).await.status(), 404);
    assert_eq!(app.delete("/items/missing").await.status(), 404);
}
