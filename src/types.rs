//! Core types for the shiftlist service.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::schedule::next_expiry;

/// Error returned when a stored or submitted enum value is not recognized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Whether a task is an admin template or one day's actionable copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    Master,
    EmployeeCopy,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Master => "MASTER",
            TaskKind::EmployeeCopy => "EMPLOYEE_COPY",
        }
    }
}

impl FromStr for TaskKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MASTER" => Ok(TaskKind::Master),
            "EMPLOYEE_COPY" => Ok(TaskKind::EmployeeCopy),
            _ => Err(ParseEnumError {
                kind: "task kind",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submission status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    Incomplete,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Incomplete => "INCOMPLETE",
        }
    }

    /// Outcomes an employee may submit. PENDING is only reachable through undo.
    pub fn is_outcome(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Incomplete)
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(TaskStatus::Pending),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "INCOMPLETE" => Ok(TaskStatus::Incomplete),
            _ => Err(ParseEnumError {
                kind: "task status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named grouping for tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Category fields populated onto task listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A master template or an employee copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub kind: TaskKind,
    pub title: String,
    pub description: String,
    pub category_id: String,
    pub initials: Option<String>,
    pub notes: Option<String>,
    pub photos: Vec<String>,
    pub status: TaskStatus,
    pub date_assigned: i64,
    pub date_completed: Option<i64>,
    pub expires_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    /// Build a new master template. Masters never expire.
    pub fn master(
        title: impl Into<String>,
        description: impl Into<String>,
        category_id: impl Into<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            kind: TaskKind::Master,
            title: title.into(),
            description: description.into(),
            category_id: category_id.into(),
            initials: None,
            notes: None,
            photos: Vec::new(),
            status: TaskStatus::Pending,
            date_assigned: now_ms,
            date_completed: None,
            expires_at: None,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Build today's employee copy of a master template.
    ///
    /// `expires_at` is fixed here, at construction, to the first `expiry_hour`
    /// boundary strictly after `now` in `now`'s time zone.
    pub fn employee_copy_of<Tz: TimeZone>(master: &Task, now: &DateTime<Tz>, expiry_hour: u32) -> Self {
        let now_ms = now.timestamp_millis();
        Self {
            id: Uuid::now_v7().to_string(),
            kind: TaskKind::EmployeeCopy,
            title: master.title.clone(),
            description: master.description.clone(),
            category_id: master.category_id.clone(),
            initials: None,
            notes: None,
            photos: Vec::new(),
            status: TaskStatus::Pending,
            date_assigned: now_ms,
            date_completed: None,
            expires_at: Some(next_expiry(now, expiry_hour).timestamp_millis()),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Overwrite the submission fields with a new submission.
    pub fn apply_submission(&mut self, submission: Submission, now_ms: i64) {
        self.initials = submission.initials;
        self.notes = submission.notes;
        self.photos = submission.photos;
        self.status = submission.outcome;
        self.date_completed = Some(now_ms);
        self.updated_at = now_ms;
    }

    /// Return the task to PENDING with no submission fields.
    pub fn reset_submission(&mut self, now_ms: i64) {
        self.initials = None;
        self.notes = None;
        self.photos.clear();
        self.status = TaskStatus::Pending;
        self.date_completed = None;
        self.updated_at = now_ms;
    }

    /// Snapshot this task for an archive.
    pub fn snapshot(&self, category_name: Option<String>) -> ArchivedTask {
        ArchivedTask {
            title: self.title.clone(),
            description: self.description.clone(),
            category_id: Some(self.category_id.clone()),
            category_name,
            initials: self.initials.clone(),
            notes: self.notes.clone(),
            photos: self.photos.clone(),
            status: self.status,
            completed_at: Some(self.date_completed.unwrap_or(self.updated_at)),
        }
    }
}

/// A task with its category populated, as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub category: Option<CategoryRef>,
}

/// Filters for task listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub kind: Option<TaskKind>,
    pub status: Option<TaskStatus>,
}

/// An employee's submission for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub initials: Option<String>,
    pub notes: Option<String>,
    pub photos: Vec<String>,
    pub outcome: TaskStatus,
}

impl Submission {
    /// Normalize raw input: trim text, drop blank strings and blank photo URLs.
    pub fn new(
        initials: Option<String>,
        notes: Option<String>,
        photos: Vec<String>,
        outcome: TaskStatus,
    ) -> Self {
        Self {
            initials: non_blank(initials),
            notes: non_blank(notes),
            photos: photos
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            outcome,
        }
    }
}

/// Trim a string, mapping blank values to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Immutable copy of an employee task taken at rollover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedTask {
    pub title: String,
    pub description: String,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub initials: Option<String>,
    pub notes: Option<String>,
    pub photos: Vec<String>,
    pub status: TaskStatus,
    pub completed_at: Option<i64>,
}

/// All snapshots recorded for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Archive {
    pub id: String,
    /// Calendar-day key, `YYYY-MM-DD`.
    pub date: String,
    pub tasks: Vec<ArchivedTask>,
    pub expires_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Outcome of one rollover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloverSummary {
    pub date: String,
    pub archived_count: usize,
    pub cleared_count: usize,
    pub deployed_count: usize,
}

/// Rows removed by one expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeStats {
    pub tasks: usize,
    pub archives: usize,
}
