//! Reference maintenance between tasks and team members.
//!
//! `tasks.assignee_id` is the authoritative side; `member_tasks` is a
//! maintained index over it. Every code path that changes one side goes
//! through this module so the two can never be updated in different
//! ways at different call sites. All set mutations are idempotent, so a
//! sequence interrupted partway can be re-run to convergence.

use crate::error::{ApiError, ApiResult};
use crate::storage::Storage;

/// Fail with NotFound unless the prospective assignee exists.
pub async fn ensure_assignee_exists(storage: &Storage, member_id: &str) -> ApiResult<()> {
    if storage.member_exists(member_id).await? {
        Ok(())
    } else {
        Err(ApiError::not_found("Assignee not found"))
    }
}

/// Move a task between member task sets when its assignee changes.
///
/// Either side may be absent (unassigned). When previous == next the
/// sets are untouched.
pub async fn reassign(
    storage: &Storage,
    task_id: &str,
    previous: Option<&str>,
    next: Option<&str>,
) -> ApiResult<()> {
    if previous == next {
        return Ok(());
    }
    if let Some(prev) = previous {
        storage.remove_member_task(prev, task_id).await?;
    }
    if let Some(next) = next {
        storage.add_member_task(next, task_id).await?;
    }
    Ok(())
}

/// Reference cleanup after a task is deleted.
pub async fn on_task_deleted(
    storage: &Storage,
    task_id: &str,
    assignee_id: Option<&str>,
) -> ApiResult<()> {
    if let Some(member_id) = assignee_id {
        storage.remove_member_task(member_id, task_id).await?;
    }
    Ok(())
}

/// Reference cleanup after a member is deleted: every task that pointed
/// at the member loses its assignee (the tasks themselves survive), and
/// the member's set rows go with the member.
pub async fn on_member_deleted(storage: &Storage, member_id: &str) -> ApiResult<u64> {
    let cleared = storage.clear_member_assignments(member_id).await?;
    storage.clear_member_tasks(member_id).await?;
    Ok(cleared)
}
