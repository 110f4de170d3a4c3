// rest/routes/items.rs — Inventory item routes. No cross-entity effects.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::model::ItemStatus;
use crate::storage::{ItemRow, NewItem};
use crate::AppContext;

fn item_body(i: &ItemRow) -> Value {
    json!({
        "id": i.id,
        "name": i.name,
        "description": i.description,
        "category": i.category,
        "status": i.status,
        "price": i.price,
        "quantity": i.quantity,
        "createdAt": i.created_at,
        "updatedAt": i.updated_at,
    })
}

fn parse_item_status(s: &str) -> ApiResult<ItemStatus> {
    ItemStatus::parse(s).ok_or_else(|| ApiError::validation(format!("Invalid item status: {s}")))
}

fn parse_price(v: &Value) -> ApiResult<f64> {
    let n = v
        .as_f64()
        .ok_or_else(|| ApiError::validation("Invalid price"))?;
    if n < 0.0 {
        return Err(ApiError::validation("Price must be non-negative"));
    }
    Ok(n)
}

fn parse_quantity(v: &Value) -> ApiResult<i64> {
    let n = v
        .as_i64()
        .ok_or_else(|| ApiError::validation("Invalid quantity"))?;
    if n < 0 {
        return Err(ApiError::validation("Quantity must be non-negative"));
    }
    Ok(n)
}

pub async fn list_items(State(ctx): State<Arc<AppContext>>) -> ApiResult<Json<Value>> {
    let items = ctx.storage.list_items().await?;
    Ok(Json(Value::Array(items.iter().map(item_body).collect())))
}

pub async fn get_item(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let Some(item) = ctx.storage.get_item(&id).await? else {
        return Err(ApiError::not_found("Item not found"));
    };
    Ok(Json(item_body(&item)))
}

pub async fn create_item(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let name = body
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("Item name is required"))?;

    let status = match body.get("status").and_then(Value::as_str) {
        Some(s) => parse_item_status(s)?,
        None => ItemStatus::Active,
    };
    let price = match body.get("price") {
        Some(v) => parse_price(v)?,
        None => 0.0,
    };
    let quantity = match body.get("quantity") {
        Some(v) => parse_quantity(v)?,
        None => 0,
    };

    let item = ctx
        .storage
        .create_item(NewItem {
            name: name.to_string(),
            description: body
                .get("description")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string()),
            category: body
                .get("category")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("General")
                .to_string(),
            status: status.as_str().to_string(),
            price,
            quantity,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(item_body(&item))))
}

pub async fn update_item(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let Some(mut item) = ctx.storage.get_item(&id).await? else {
        return Err(ApiError::not_found("Item not found"));
    };

    if let Some(name) = body.get("name").and_then(Value::as_str) {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("Item name is required"));
        }
        item.name = name.to_string();
    }
    if let Some(desc) = body.get("description").and_then(Value::as_str) {
        item.description = Some(desc.trim().to_string());
    }
    if let Some(category) = body.get("category").and_then(Value::as_str) {
        item.category = category.trim().to_string();
    }
    if let Some(s) = body.get("status").and_then(Value::as_str) {
        item.status = parse_item_status(s)?.as_str().to_string();
    }
    if let Some(v) = body.get("price") {
        item.price = parse_price(v)?;
    }
    if let Some(v) = body.get("quantity") {
        item.quantity = parse_quantity(v)?;
    }

    let item = ctx.storage.update_item(&item).await?;
    Ok(Json(item_body(&item)))
}

pub async fn delete_item(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let Some(item) = ctx.storage.delete_item(&id).await? else {
        return Err(ApiError::not_found("Item not found"));
    };
    Ok(Json(json!({ "message": "Item deleted", "item": item_body(&item) })))
}
