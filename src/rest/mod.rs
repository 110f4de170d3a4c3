// rest/mod.rs — HTTP surface.
//
// Endpoints:
//   GET  /health
//   GET/POST          /projects
//   GET/PUT/DELETE    /projects/{id}
//   PATCH             /projects/{id}/progress
//   GET/POST          /tasks
//   GET               /tasks/project/{project_id}
//   GET/PATCH/DELETE  /tasks/{id}
//   PATCH             /tasks/{id}/status
//   GET/POST          /team-members
//   GET/PATCH/DELETE  /team-members/{id}
//   GET/POST          /items
//   GET/PUT/DELETE    /items/{id}

pub mod routes;

use anyhow::Result;
use axum::{
    routing::{get, patch},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let listener = tokio::net::TcpListener::bind(&bind).await?;

    info!("REST API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(ctx)).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        // Health
        .route("/health", get(routes::health::health))
        // Projects
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/projects/{id}/progress",
            patch(routes::projects::patch_progress),
        )
        // Tasks
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/project/{project_id}",
            get(routes::tasks::list_project_tasks),
        )
        .route(
            "/tasks/{id}",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/tasks/{id}/status", patch(routes::tasks::toggle_status))
        // Team members
        .route(
            "/team-members",
            get(routes::team_members::list_members).post(routes::team_members::create_member),
        )
        .route(
            "/team-members/{id}",
            get(routes::team_members::get_member)
                .patch(routes::team_members::update_member)
                .delete(routes::team_members::delete_member),
        )
        // Items
        .route(
            "/items",
            get(routes::items::list_items).post(routes::items::create_item),
        )
        .route(
            "/items/{id}",
            get(routes::items::get_item)
                .put(routes::items::update_item)
                .delete(routes::items::delete_item),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
