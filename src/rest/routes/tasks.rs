// rest/routes/tasks.rs — Task routes.
//
// Every mutation here ends with a progress re-sync on the task's project,
// and any assignee change flows through `assignment` so the member task
// set never drifts from `tasks.assignee_id`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::assignment;
use crate::error::{ApiError, ApiResult};
use crate::model::{self, TaskPriority, TaskStatus};
use crate::progress::sync_project_progress;
use crate::storage::{NewTask, ProjectRow, TaskRow, TeamMemberRow};
use crate::AppContext;

async fn lookup_assignee(ctx: &AppContext, t: &TaskRow) -> ApiResult<Option<TeamMemberRow>> {
    match &t.assignee_id {
        Some(id) => Ok(ctx.storage.get_member(id).await?),
        None => Ok(None),
    }
}

fn parse_task_status(s: &str) -> ApiResult<TaskStatus> {
    TaskStatus::parse(s).ok_or_else(|| ApiError::validation(format!("Invalid task status: {s}")))
}

fn parse_priority(s: &str) -> ApiResult<TaskPriority> {
    TaskPriority::parse(s)
        .ok_or_else(|| ApiError::validation(format!("Invalid task priority: {s}")))
}

fn project_value(project: Option<ProjectRow>) -> Value {
    match project {
        Some(p) => model::project_body(&p, None, None),
        None => Value::Null,
    }
}

pub async fn list_tasks(State(ctx): State<Arc<AppContext>>) -> ApiResult<Json<Value>> {
    let tasks = ctx.storage.list_tasks().await?;
    let mut out = Vec::with_capacity(tasks.len());
    for t in &tasks {
        let project = ctx
            .storage
            .get_project(&t.project_id)
            .await?
            .map(|p| model::project_body(&p, None, None));
        let assignee = lookup_assignee(&ctx, t).await?;
        out.push(model::task_body(t, project, assignee.as_ref()));
    }
    Ok(Json(Value::Array(out)))
}

pub async fn list_project_tasks(
    State(ctx): State<Arc<AppContext>>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let tasks = ctx.storage.list_project_tasks(&project_id).await?;
    let mut out = Vec::with_capacity(tasks.len());
    for t in &tasks {
        let assignee = lookup_assignee(&ctx, t).await?;
        out.push(model::task_body(t, None, assignee.as_ref()));
    }
    Ok(Json(Value::Array(out)))
}

pub async fn get_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let Some(task) = ctx.storage.get_task(&id).await? else {
        return Err(ApiError::not_found("Task not found"));
    };
    let project = ctx
        .storage
        .get_project(&task.project_id)
        .await?
        .map(|p| model::project_body(&p, None, None));
    let assignee = lookup_assignee(&ctx, &task).await?;
    Ok(Json(model::task_body(&task, project, assignee.as_ref())))
}

pub async fn create_task(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let title = body
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let project_id = body
        .get("project")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let (Some(title), Some(project_id)) = (title, project_id) else {
        return Err(ApiError::validation("Task title and project are required"));
    };

    if ctx.storage.get_project(project_id).await?.is_none() {
        return Err(ApiError::not_found("Project not found"));
    }

    let assignee_id = body
        .get("assigneeId")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if let Some(assignee) = &assignee_id {
        assignment::ensure_assignee_exists(&ctx.storage, assignee).await?;
    }

    let status = match body.get("status").and_then(Value::as_str) {
        Some(s) => parse_task_status(s)?,
        None => TaskStatus::Pending,
    };
    let priority = match body.get("priority").and_then(Value::as_str) {
        Some(s) => parse_priority(s)?,
        None => TaskPriority::Medium,
    };

    let task = ctx
        .storage
        .create_task(NewTask {
            title: title.to_string(),
            status: status.as_str().to_string(),
            project_id: project_id.to_string(),
            assignee_id: assignee_id.clone(),
            priority: priority.as_str().to_string(),
        })
        .await?;

    assignment::reassign(&ctx.storage, &task.id, None, assignee_id.as_deref()).await?;
    let project = sync_project_progress(&ctx.storage, Some(project_id)).await?;

    let assignee = lookup_assignee(&ctx, &task).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "task": model::task_body(&task, None, assignee.as_ref()),
            "project": project_value(project),
        })),
    ))
}

pub async fn toggle_status(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let Some(mut task) = ctx.storage.get_task(&id).await? else {
        return Err(ApiError::not_found("Task not found"));
    };

    let next = match body.get("status").and_then(Value::as_str) {
        Some(s) => parse_task_status(s)?,
        // No explicit status: flip between Complete and Incomplete.
        None => {
            if task.status == TaskStatus::Complete.as_str() {
                TaskStatus::Incomplete
            } else {
                TaskStatus::Complete
            }
        }
    };
    task.status = next.as_str().to_string();
    let task = ctx.storage.update_task(&task).await?;

    let project = sync_project_progress(&ctx.storage, Some(&task.project_id)).await?;
    let assignee = lookup_assignee(&ctx, &task).await?;

    Ok(Json(json!({
        "task": model::task_body(&task, None, assignee.as_ref()),
        "project": project_value(project),
    })))
}

pub async fn update_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let Some(mut task) = ctx.storage.get_task(&id).await? else {
        return Err(ApiError::not_found("Task not found"));
    };

    let previous_assignee = task.assignee_id.clone();
    // An absent assigneeId unassigns the task; callers resend it on
    // every patch.
    let next_assignee = body
        .get("assigneeId")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if let Some(next) = &next_assignee {
        assignment::ensure_assignee_exists(&ctx.storage, next).await?;
    }

    if let Some(title) = body.get("title").and_then(Value::as_str) {
        let title = title.trim();
        if title.is_empty() {
            return Err(ApiError::validation("Task title is required"));
        }
        task.title = title.to_string();
    }
    if let Some(s) = body.get("status").and_then(Value::as_str) {
        task.status = parse_task_status(s)?.as_str().to_string();
    }
    if let Some(s) = body.get("priority").and_then(Value::as_str) {
        task.priority = parse_priority(s)?.as_str().to_string();
    }
    task.assignee_id = next_assignee.clone();

    let task = ctx.storage.update_task(&task).await?;
    assignment::reassign(
        &ctx.storage,
        &task.id,
        previous_assignee.as_deref(),
        next_assignee.as_deref(),
    )
    .await?;

    let project = sync_project_progress(&ctx.storage, Some(&task.project_id)).await?;
    let assignee = lookup_assignee(&ctx, &task).await?;

    Ok(Json(json!({
        "task": model::task_body(&task, None, assignee.as_ref()),
        "project": project_value(project),
    })))
}

pub async fn delete_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let Some(task) = ctx.storage.get_task(&id).await? else {
        return Err(ApiError::not_found("Task not found"));
    };

    ctx.storage.delete_task(&task.id).await?;
    assignment::on_task_deleted(&ctx.storage, &task.id, task.assignee_id.as_deref()).await?;
    let project = sync_project_progress(&ctx.storage, Some(&task.project_id)).await?;

    Ok(Json(json!({
        "message": "Task deleted",
        "project": project_value(project),
    })))
}
