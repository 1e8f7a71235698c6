//! Employee submission state machine: PENDING -> COMPLETED | INCOMPLETE -> PENDING.

use super::Lifecycle;
use crate::error::{ApiError, ApiResult};
use crate::types::{Submission, Task, TaskKind, TaskStatus};
use tracing::info;

/// Check the outcome-specific rules of a submission.
///
/// COMPLETED needs at least one photo; INCOMPLETE needs notes. PENDING is not a
/// submittable outcome.
pub fn validate_submission(submission: &Submission) -> ApiResult<()> {
    if !submission.outcome.is_outcome() {
        return Err(ApiError::invalid_value(
            "status",
            "status must be COMPLETED or INCOMPLETE",
        ));
    }
    match submission.outcome {
        TaskStatus::Completed if submission.photos.is_empty() => Err(ApiError::invalid_value(
            "photos",
            "At least one photo is required to complete a task",
        )),
        TaskStatus::Incomplete if submission.notes.is_none() => Err(ApiError::invalid_value(
            "notes",
            "Notes are required when a task cannot be completed",
        )),
        _ => Ok(()),
    }
}

impl Lifecycle {
    fn load_employee_copy(&self, task_id: &str) -> ApiResult<Task> {
        let task = self
            .db
            .get_task(task_id)?
            .ok_or_else(|| ApiError::task_not_found(task_id))?;
        if task.kind != TaskKind::EmployeeCopy {
            return Err(ApiError::invalid_value(
                "id",
                "Only employee copies accept submissions",
            ));
        }
        Ok(task)
    }

    /// Record an employee's outcome for a task.
    ///
    /// The new submission replaces any previous one; nothing is merged.
    pub fn submit(&self, task_id: &str, submission: Submission) -> ApiResult<Task> {
        let mut task = self.load_employee_copy(task_id)?;
        validate_submission(&submission)?;

        task.apply_submission(submission, self.now_ms());
        if !self.db.update_submission(&task)? {
            return Err(ApiError::task_not_found(task_id));
        }

        info!(task_id = %task.id, status = %task.status, "Task submission recorded");
        Ok(task)
    }

    /// Clear a task's submission and return it to PENDING. Idempotent.
    pub fn undo(&self, task_id: &str) -> ApiResult<Task> {
        let mut task = self.load_employee_copy(task_id)?;

        task.reset_submission(self.now_ms());
        if !self.db.update_submission(&task)? {
            return Err(ApiError::task_not_found(task_id));
        }

        info!(task_id = %task.id, "Task submission cleared");
        Ok(task)
    }
}
