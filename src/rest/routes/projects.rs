// rest/routes/projects.rs — Project routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::model::{self, ProjectStatus};
use crate::storage::{NewProject, ProjectRow, TeamMemberRow};
use crate::AppContext;

async fn lookup_lead(ctx: &AppContext, p: &ProjectRow) -> ApiResult<Option<TeamMemberRow>> {
    match &p.project_lead {
        Some(id) => Ok(ctx.storage.get_member(id).await?),
        None => Ok(None),
    }
}

fn parse_status(s: &str) -> ApiResult<ProjectStatus> {
    ProjectStatus::parse(s)
        .ok_or_else(|| ApiError::validation(format!("Invalid project status: {s}")))
}

/// Accepts RFC 3339 or a plain `YYYY-MM-DD` date; null/empty clears.
fn parse_due_date(v: &Value) -> ApiResult<Option<String>> {
    match v {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => {
            let valid = chrono::DateTime::parse_from_rfc3339(s).is_ok()
                || s.parse::<chrono::NaiveDate>().is_ok();
            if !valid {
                return Err(ApiError::validation("Invalid due date"));
            }
            Ok(Some(s.clone()))
        }
        _ => Err(ApiError::validation("Invalid due date")),
    }
}

pub async fn list_projects(State(ctx): State<Arc<AppContext>>) -> ApiResult<Json<Value>> {
    let projects = ctx.storage.list_projects().await?;
    let summaries: HashMap<String, (i64, i64)> = ctx
        .storage
        .project_task_summaries()
        .await?
        .into_iter()
        .map(|s| (s.project_id, (s.total, s.completed)))
        .collect();

    let mut out = Vec::with_capacity(projects.len());
    for p in &projects {
        let lead = lookup_lead(&ctx, p).await?;
        let summary = summaries.get(&p.id).copied().unwrap_or((0, 0));
        out.push(model::project_body(p, lead.as_ref(), Some(summary)));
    }
    Ok(Json(Value::Array(out)))
}

pub async fn create_project(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let name = body
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("Project name is required"))?;

    let status = match body.get("status").and_then(Value::as_str) {
        Some(s) => parse_status(s)?,
        None => ProjectStatus::Planned,
    };

    let progress = match body.get("progress") {
        Some(v) => {
            let n = v
                .as_f64()
                .ok_or_else(|| ApiError::validation("Invalid progress value"))?
                .round() as i64;
            if !(0..=100).contains(&n) {
                return Err(ApiError::validation("Progress must be between 0 and 100"));
            }
            n
        }
        None => 0,
    };

    let due_date = match body.get("dueDate") {
        Some(v) => parse_due_date(v)?,
        None => None,
    };

    let project_lead = body
        .get("projectLead")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let studio = body
        .get("studio")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Core Studio")
        .to_string();

    let color = body
        .get("color")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("#2563eb")
        .to_string();

    let notes = body
        .get("notes")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string());

    let project = ctx
        .storage
        .create_project(NewProject {
            name: name.to_string(),
            status: status.as_str().to_string(),
            progress,
            studio,
            due_date,
            notes,
            color,
            project_lead,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(model::project_body(&project, None, None)),
    ))
}

pub async fn get_project(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let Some(project) = ctx.storage.get_project(&id).await? else {
        return Err(ApiError::not_found("Project not found"));
    };

    let total = ctx.storage.count_project_tasks(&project.id).await?;
    let completed = ctx.storage.count_project_tasks_complete(&project.id).await?;
    let lead = lookup_lead(&ctx, &project).await?;

    Ok(Json(model::project_body(
        &project,
        lead.as_ref(),
        Some((total, completed)),
    )))
}

pub async fn update_project(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let Some(mut project) = ctx.storage.get_project(&id).await? else {
        return Err(ApiError::not_found("Project not found"));
    };

    if let Some(name) = body.get("name").and_then(Value::as_str) {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("Project name is required"));
        }
        project.name = name.to_string();
    }

    let explicit_status = match body.get("status").and_then(Value::as_str) {
        Some(s) => Some(parse_status(s)?),
        None => None,
    };
    if let Some(status) = explicit_status {
        project.status = status.as_str().to_string();
    }

    if let Some(studio) = body.get("studio").and_then(Value::as_str) {
        project.studio = studio.trim().to_string();
    }
    if let Some(notes) = body.get("notes").and_then(Value::as_str) {
        project.notes = Some(notes.trim().to_string());
    }
    if let Some(color) = body.get("color").and_then(Value::as_str) {
        project.color = color.to_string();
    }

    if let Some(v) = body.get("projectLead") {
        project.project_lead = match v {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            _ => return Err(ApiError::validation("Invalid project lead")),
        };
    }

    if let Some(v) = body.get("dueDate") {
        project.due_date = parse_due_date(v)?;
    }

    if let Some(v) = body.get("progress") {
        let n = v
            .as_f64()
            .ok_or_else(|| ApiError::validation("Invalid progress value"))?;
        let clamped = (n.round() as i64).clamp(0, 100);
        project.progress = clamped;
        // Clamped endpoints re-derive status; an explicit status in the
        // same payload wins only in the middle of the range.
        if clamped == 100 {
            project.status = ProjectStatus::Completed.as_str().to_string();
        } else if clamped == 0 && explicit_status.is_none() {
            project.status = ProjectStatus::Planned.as_str().to_string();
        }
    }

    let updated = ctx.storage.update_project(&project).await?;
    let lead = lookup_lead(&ctx, &updated).await?;
    Ok(Json(model::project_body(&updated, lead.as_ref(), None)))
}

pub async fn patch_progress(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let n = body
        .get("progress")
        .and_then(Value::as_f64)
        .ok_or_else(|| ApiError::validation("Invalid progress value"))?;

    let progress = (n.round() as i64).clamp(0, 100);
    let status = if progress == 100 {
        ProjectStatus::Completed
    } else if progress == 0 {
        ProjectStatus::Planned
    } else {
        ProjectStatus::InProgress
    };

    let Some(project) = ctx
        .storage
        .set_project_progress(&id, progress, status.as_str())
        .await?
    else {
        return Err(ApiError::not_found("Project not found"));
    };

    Ok(Json(model::project_body(&project, None, None)))
}

pub async fn delete_project(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    if !ctx.storage.delete_project(&id).await? {
        return Err(ApiError::not_found("Project not found"));
    }

    // Two-phase cascade. Not transactional: a failure partway leaves
    // partial state, repairable by re-running the same idempotent steps.
    let task_ids = ctx.storage.list_project_task_ids(&id).await?;
    ctx.storage.delete_project_tasks(&id).await?;
    for task_id in &task_ids {
        ctx.storage.remove_task_refs(task_id).await?;
    }

    Ok(Json(json!({ "message": "Project deleted" })))
}
