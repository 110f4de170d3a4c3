//! Project progress synchronization.
//!
//! A project's `progress` and `status` are derived state: they are
//! recomputed from the full current task counts after every task
//! create/delete/status/project change. Because each run recomputes from
//! scratch rather than applying deltas, a run clobbered by a concurrent
//! one self-corrects on the next call.

use crate::error::ApiResult;
use crate::model::ProjectStatus;
use crate::storage::{ProjectRow, Storage};

/// Derive `(progress, status)` from task counts.
///
/// The derived status overwrites whatever is stored, including a
/// manually set "At Risk".
pub fn derive_progress(total: i64, completed: i64) -> (i64, ProjectStatus) {
    let progress = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as i64
    };

    let status = if progress == 0 {
        ProjectStatus::Planned
    } else if progress == 100 && total > 0 {
        ProjectStatus::Completed
    } else {
        ProjectStatus::InProgress
    };

    (progress, status)
}

/// Recompute and persist a project's progress/status from its task set.
///
/// A `None` project id is a no-op: callers must tolerate tasks without
/// a resolvable project. Returns the updated project, or `None` when
/// the project row no longer exists.
pub async fn sync_project_progress(
    storage: &Storage,
    project_id: Option<&str>,
) -> ApiResult<Option<ProjectRow>> {
    let Some(project_id) = project_id else {
        return Ok(None);
    };

    let total = storage.count_project_tasks(project_id).await?;
    let completed = storage.count_project_tasks_complete(project_id).await?;
    let (progress, status) = derive_progress(total, completed);

    let project = storage
        .set_project_progress(project_id, progress, status.as_str())
        .await?;
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_project_is_planned() {
        assert_eq!(derive_progress(0, 0), (0, ProjectStatus::Planned));
    }

    #[test]
    fn no_complete_tasks_is_planned() {
        // progress 0 maps to Planned even when tasks exist.
        assert_eq!(derive_progress(4, 0), (0, ProjectStatus::Planned));
    }

    #[test]
    fn partial_completion_is_in_progress() {
        assert_eq!(derive_progress(5, 2), (40, ProjectStatus::InProgress));
        assert_eq!(derive_progress(3, 1), (33, ProjectStatus::InProgress));
        assert_eq!(derive_progress(3, 2), (67, ProjectStatus::InProgress));
        assert_eq!(derive_progress(4, 1), (25, ProjectStatus::InProgress));
    }

    #[test]
    fn all_complete_is_completed() {
        assert_eq!(derive_progress(1, 1), (100, ProjectStatus::Completed));
        assert_eq!(derive_progress(8, 8), (100, ProjectStatus::Completed));
    }

    #[test]
    fn status_follows_the_rounded_progress() {
        // 199/200 rounds up to 100 and 1/1000 rounds down to 0; the status
        // tracks the rounded value, not the raw counts.
        let (progress, status) = derive_progress(200, 199);
        assert_eq!(progress, 100);
        assert_eq!(status, ProjectStatus::Completed);

        let (progress, status) = derive_progress(1000, 1);
        assert_eq!(progress, 0);
        assert_eq!(status, ProjectStatus::Planned);
    }
}
