//! The daily task lifecycle engine.
//!
//! Every mutating daily-cycle operation goes through [`Lifecycle`]:
//! - employee submissions and undo ([`submissions`])
//! - admin category and master-task management ([`admin`])
//! - the end-of-day rollover that archives employee copies and redeploys
//!   fresh ones from the master templates ([`rollover`])

pub mod admin;
pub mod rollover;
pub mod submissions;

use crate::config::LifecycleConfig;
use crate::db::Database;
use crate::error::ApiResult;
use crate::types::{Archive, Category, TaskFilter, TaskView};
use mockable::Clock;
use std::sync::{Arc, Mutex};

pub use submissions::validate_submission;

/// Tunables for the daily cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Local hour at which employee copies expire.
    pub expiry_hour: u32,
    /// Days an archive is kept before the reaper removes it.
    pub archive_retention_days: i64,
    /// Safety cap on tasks loaded per rollover phase.
    pub max_batch: usize,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self::from(&LifecycleConfig::default())
    }
}

impl From<&LifecycleConfig> for LifecyclePolicy {
    fn from(config: &LifecycleConfig) -> Self {
        Self {
            expiry_hour: config.expiry_hour,
            archive_retention_days: config.archive_retention_days,
            max_batch: config.max_batch,
        }
    }
}

/// Orchestrates task state transitions and rollover over the shared store.
pub struct Lifecycle {
    db: Arc<Database>,
    clock: Arc<dyn Clock + Send + Sync>,
    policy: LifecyclePolicy,
    /// Serializes rollovers within this process.
    rollover_lock: Mutex<()>,
}

impl Lifecycle {
    pub fn new(
        db: Arc<Database>,
        clock: Arc<dyn Clock + Send + Sync>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            db,
            clock,
            policy,
            rollover_lock: Mutex::new(()),
        }
    }

    /// Get the database reference.
    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    /// Get the clock the engine reads time from.
    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    fn now_ms(&self) -> i64 {
        self.clock.utc().timestamp_millis()
    }

    /// List tasks, newest first, with categories populated.
    pub fn list_tasks(&self, filter: TaskFilter) -> ApiResult<Vec<TaskView>> {
        Ok(self.db.list_tasks(filter)?)
    }

    /// List categories, newest first.
    pub fn list_categories(&self) -> ApiResult<Vec<Category>> {
        Ok(self.db.list_categories()?)
    }

    /// List archives, newest date first.
    pub fn list_archives(&self) -> ApiResult<Vec<Archive>> {
        Ok(self.db.list_archives()?)
    }
}
