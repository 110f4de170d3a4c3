//! Storage-level tests for the progress synchronizer: the derived
//! (progress, status) pair always reflects full current task counts.

use tempfile::TempDir;

use studiod::progress::sync_project_progress;
use studiod::storage::{NewProject, NewTask, ProjectRow, Storage};

async fn make_storage() -> (Storage, TempDir) {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(dir.path()).await.unwrap();
    (storage, dir)
}

async fn make_project(storage: &Storage) -> ProjectRow {
    storage
        .create_project(NewProject {
            name: "Night Shift".to_string(),
            status: "Planned".to_string(),
            progress: 0,
            studio: "Core Studio".to_string(),
            due_date: None,
            notes: None,
            color: "#2563eb".to_string(),
            project_lead: None,
        })
        .await
        .unwrap()
}

async fn add_task(storage: &Storage, project_id: &str, status: &str) {
    storage
        .create_task(NewTask {
            title: "task".to_string(),
            status: status.to_string(),
            project_id: project_id.to_string(),
            assignee_id: None,
            priority: "Medium".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn missing_project_id_is_a_noop() {
    let (storage, _dir) = make_storage().await;
    let result = sync_project_progress(&storage, None).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn unknown_project_id_returns_none() {
    let (storage, _dir) = make_storage().await;
    let result = sync_project_progress(&storage, Some("no-such-id"))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn zero_tasks_yields_planned_at_zero() {
    let (storage, _dir) = make_storage().await;
    let project = make_project(&storage).await;

    let synced = sync_project_progress(&storage, Some(&project.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(synced.progress, 0);
    assert_eq!(synced.status, "Planned");
}

#[tokio::test]
async fn partial_completion_yields_in_progress() {
    let (storage, _dir) = make_storage().await;
    let project = make_project(&storage).await;
    add_task(&storage, &project.id, "Complete").await;
    add_task(&storage, &project.id, "Pending").await;
    add_task(&storage, &project.id, "Incomplete").await;

    let synced = sync_project_progress(&storage, Some(&project.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(synced.progress, 33);
    assert_eq!(synced.status, "In Progress");
}

#[tokio::test]
async fn all_complete_yields_completed() {
    let (storage, _dir) = make_storage().await;
    let project = make_project(&storage).await;
    add_task(&storage, &project.id, "Complete").await;
    add_task(&storage, &project.id, "Complete").await;

    let synced = sync_project_progress(&storage, Some(&project.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(synced.progress, 100);
    assert_eq!(synced.status, "Completed");
}

#[tokio::test]
async fn sync_overwrites_manually_set_at_risk() {
    let (storage, _dir) = make_storage().await;
    let mut project = make_project(&storage).await;
    add_task(&storage, &project.id, "Complete").await;
    add_task(&storage, &project.id, "Pending").await;

    project.status = "At Risk".to_string();
    storage.update_project(&project).await.unwrap();

    let synced = sync_project_progress(&storage, Some(&project.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(synced.progress, 50);
    assert_eq!(synced.status, "In Progress");
}

#[tokio::test]
async fn fifth_task_completed_moves_to_forty_percent() {
    // Project with 4 tasks, 1 complete; a 5th task created and marked
    // complete lands at round(100 * 2/5) = 40.
    let (storage, _dir) = make_storage().await;
    let project = make_project(&storage).await;
    add_task(&storage, &project.id, "Complete").await;
    add_task(&storage, &project.id, "Pending").await;
    add_task(&storage, &project.id, "Pending").await;
    add_task(&storage, &project.id, "Incomplete").await;

    add_task(&storage, &project.id, "Complete").await;

    let synced = sync_project_progress(&storage, Some(&project.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(synced.progress, 40);
    assert_eq!(synced.status, "In Progress");
}
