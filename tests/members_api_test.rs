//! Team member endpoint tests: validation, derived workload, and the
//! assignee cleanup that runs when a member is deleted.

mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn create_requires_a_name_and_valid_capacity() {
    let app = common::spawn_app().await;

    let res = app.post("/team-members", json!({})).await;
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Name is required");

    let res = app
        .post("/team-members", json!({ "name": "Ada", "capacity": 0 }))
        .await;
    assert_eq!(res.status(), 400);

    let res = app
        .post("/team-members", json!({ "name": "Ada", "capacity": 11 }))
        .await;
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn create_applies_defaults() {
    let app = common::spawn_app().await;

    let res = app.post("/team-members", json!({ "name": "Ada" })).await;
    assert_eq!(res.status(), 201);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["role"], "Architect");
    assert_eq!(body["capacity"], 5);
    assert_eq!(body["taskCount"], 0);
    assert_eq!(body["workload"], 0);
}

#[tokio::test]
async fn workload_derives_from_task_count_and_capacity() {
    let app = common::spawn_app().await;
    let project = app.create_project("Aurora").await;
    let member = app.create_member("Ada").await;

    for title in ["a", "b"] {
        app.post(
            "/tasks",
            json!({ "title": title, "project": project, "assigneeId": member }),
        )
        .await;
    }

    let m: Value = app
        .get(&format!("/team-members/{member}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(m["taskCount"], 2);
    assert_eq!(m["workload"], 40); // 2 of 5 capacity

    // Populated task set carries the owning project's name and color.
    assert_eq!(m["tasks"][0]["project"]["name"], "Aurora");
    assert_eq!(m["tasks"][0]["project"]["color"], "#2563eb");
}

#[tokio::test]
async fn workload_caps_at_one_hundred() {
    let app = common::spawn_app().await;
    let project = app.create_project("Aurora").await;
    let res = app
        .post("/team-members", json!({ "name": "Solo", "capacity": 1 }))
        .await;
    let member = res.json::<Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    for title in ["a", "b", "c"] {
        app.post(
            "/tasks",
            json!({ "title": title, "project": project, "assigneeId": member }),
        )
        .await;
    }

    let m: Value = app
        .get(&format!("/team-members/{member}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(m["taskCount"], 3);
    assert_eq!(m["workload"], 100);
}

#[tokio::test]
async fn patch_updates_whitelisted_fields() {
    let app = common::spawn_app().await;
    let member = app.create_member("Ada").await;

    let res = app
        .patch(
            &format!("/team-members/{member}"),
            json!({ "role": "Director", "capacity": 8 }),
        )
        .await;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["role"], "Director");
    assert_eq!(body["capacity"], 8);

    let res = app
        .patch(&format!("/team-members/{member}"), json!({ "capacity": 42 }))
        .await;
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn delete_nulls_assignees_but_keeps_tasks() {
    let app = common::spawn_app().await;
    let project = app.create_project("Aurora").await;
    let member = app.create_member("Ada").await;

    let res = app
        .post(
            "/tasks",
            json!({ "title": "left behind", "project": project, "assigneeId": member }),
        )
        .await;
    let task_id = res.json::<Value>().await.unwrap()["task"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = app.delete(&format!("/team-members/{member}")).await;
    assert_eq!(res.status(), 200);

    let res = app.get(&format!("/team-members/{member}")).await;
    assert_eq!(res.status(), 404);

    let task: Value = app
        .get(&format!("/tasks/{task_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(task["title"], "left behind");
    assert!(task["assignee"].is_null());
}

#[tokio::test]
async fn deleting_unknown_member_is_404() {
    let app = common::spawn_app().await;
    let res = app.delete("/team-members/no-such-id").await;
    assert_eq!(res.status(), 404);
}
