//! End-of-day rollover: archive every employee copy, wipe them, and redeploy a
//! fresh copy of each master template.
//!
//! Phases are durable steps, not one transaction. The archive write is atomic,
//! so a failure before the wipe leaves the day untouched. A failure after it is
//! reported with the phase name; running the rollover again is safe.

use super::Lifecycle;
use crate::error::ApiResult;
use crate::schedule::{archive_expiry, day_key};
use crate::types::{ArchivedTask, RolloverSummary, Task, TaskKind};
use anyhow::Context;
use std::sync::PoisonError;
use tracing::{debug, info, warn};

impl Lifecycle {
    /// Run one rollover and report what it did.
    pub fn rollover(&self) -> ApiResult<RolloverSummary> {
        // The guarded value is (), so a poisoned lock carries no broken state.
        let _guard = self
            .rollover_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let now = self.clock.local();
        let now_ms = now.timestamp_millis();
        let date = day_key(&now);
        let max_batch = self.policy.max_batch;

        info!(date = %date, "Starting rollover");

        let copies = self
            .db
            .load_tasks_of_kind(TaskKind::EmployeeCopy, max_batch)
            .context("rollover: load employee copies")?;
        if copies.len() >= max_batch {
            warn!(
                limit = max_batch,
                "Employee copy count reached the batch cap; extra copies are wiped without a snapshot"
            );
        }

        let snapshots: Vec<ArchivedTask> = copies
            .iter()
            .map(|(task, category_name)| task.snapshot(category_name.clone()))
            .collect();

        let archived_count = snapshots.len();
        if snapshots.is_empty() {
            debug!(date = %date, "No employee copies to archive");
        } else {
            let expires_at = archive_expiry(now_ms, self.policy.archive_retention_days);
            let archive_id = self
                .db
                .append_to_archive(&date, &snapshots, expires_at, now_ms)
                .context("rollover: archive phase")?;
            debug!(archive_id = %archive_id, archived = archived_count, "Archive updated");
        }

        let cleared_count = self
            .db
            .delete_tasks_of_kind(TaskKind::EmployeeCopy)
            .context("rollover: clear phase")?;

        let masters = self
            .db
            .load_tasks_of_kind(TaskKind::Master, max_batch)
            .context("rollover: load master templates")?;
        if masters.len() >= max_batch {
            warn!(limit = max_batch, "Master template count reached the batch cap");
        }

        let fresh: Vec<Task> = masters
            .iter()
            .map(|(master, _)| Task::employee_copy_of(master, &now, self.policy.expiry_hour))
            .collect();
        let deployed_count = self
            .db
            .insert_tasks(&fresh)
            .context("rollover: redeploy phase")?;

        info!(
            date = %date,
            archived = archived_count,
            cleared = cleared_count,
            deployed = deployed_count,
            "Rollover complete"
        );

        Ok(RolloverSummary {
            date,
            archived_count,
            cleared_count,
            deployed_count,
        })
    }
}
