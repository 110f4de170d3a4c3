// rest/routes/team_members.rs — Team member routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::assignment;
use crate::error::{ApiError, ApiResult};
use crate::model;
use crate::storage::TeamMemberRow;
use crate::AppContext;

fn parse_capacity(v: &Value) -> ApiResult<i64> {
    let n = v
        .as_i64()
        .ok_or_else(|| ApiError::validation("Invalid capacity"))?;
    if !(1..=10).contains(&n) {
        return Err(ApiError::validation("Capacity must be between 1 and 10"));
    }
    Ok(n)
}

/// Member body with its task set populated (title/status/priority plus
/// the owning project's name and color).
async fn member_with_tasks(ctx: &AppContext, m: &TeamMemberRow) -> ApiResult<Value> {
    let tasks = ctx.storage.list_member_tasks(&m.id).await?;
    let mut bodies = Vec::with_capacity(tasks.len());
    for t in &tasks {
        let project = ctx
            .storage
            .get_project(&t.project_id)
            .await?
            .map(|p| json!({ "id": p.id, "name": p.name, "color": p.color }))
            .unwrap_or(Value::Null);
        bodies.push(json!({
            "id": t.id,
            "title": t.title,
            "status": t.status,
            "priority": t.priority,
            "project": project,
        }));
    }
    let count = bodies.len() as i64;
    Ok(model::member_body(m, Value::Array(bodies), count))
}

pub async fn list_members(State(ctx): State<Arc<AppContext>>) -> ApiResult<Json<Value>> {
    let members = ctx.storage.list_members().await?;
    let mut out = Vec::with_capacity(members.len());
    for m in &members {
        out.push(member_with_tasks(&ctx, m).await?);
    }
    Ok(Json(Value::Array(out)))
}

pub async fn create_member(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let name = body
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("Name is required"))?;

    let role = body
        .get("role")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Architect");

    let capacity = match body.get("capacity") {
        Some(v) => parse_capacity(v)?,
        None => 5,
    };

    let member = ctx.storage.create_member(name, role, capacity).await?;
    Ok((
        StatusCode::CREATED,
        Json(model::member_body(&member, json!([]), 0)),
    ))
}

pub async fn get_member(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let Some(member) = ctx.storage.get_member(&id).await? else {
        return Err(ApiError::not_found("Team member not found"));
    };
    Ok(Json(member_with_tasks(&ctx, &member).await?))
}

pub async fn update_member(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let Some(mut member) = ctx.storage.get_member(&id).await? else {
        return Err(ApiError::not_found("Team member not found"));
    };

    if let Some(name) = body.get("name").and_then(Value::as_str) {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("Name is required"));
        }
        member.name = name.to_string();
    }
    if let Some(role) = body.get("role").and_then(Value::as_str) {
        member.role = role.trim().to_string();
    }
    if let Some(v) = body.get("capacity") {
        member.capacity = parse_capacity(v)?;
    }

    let member = ctx.storage.update_member(&member).await?;
    let task_ids = ctx.storage.list_member_task_ids(&member.id).await?;
    let count = task_ids.len() as i64;
    Ok(Json(model::member_body(&member, json!(task_ids), count)))
}

pub async fn delete_member(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    if !ctx.storage.delete_member(&id).await? {
        return Err(ApiError::not_found("Team member not found"));
    }

    // Tasks previously assigned to the member survive, unassigned.
    assignment::on_member_deleted(&ctx.storage, &id).await?;

    Ok(Json(json!({ "message": "Team member deleted" })))
}
