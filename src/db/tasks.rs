//! Task CRUD and bulk operations used by the daily cycle.

use super::{Database, decode_photos, encode_photos, get_enum};
use crate::types::{CategoryRef, Task, TaskFilter, TaskKind, TaskView};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

const TASK_COLUMNS: &str = "t.id, t.kind, t.title, t.description, t.category_id, t.initials,
    t.notes, t.photos, t.status, t.date_assigned, t.date_completed, t.expires_at,
    t.created_at, t.updated_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        kind: get_enum(row, "kind")?,
        title: row.get("title")?,
        description: row.get("description")?,
        category_id: row.get("category_id")?,
        initials: row.get("initials")?,
        notes: row.get("notes")?,
        photos: decode_photos(row.get("photos")?),
        status: get_enum(row, "status")?,
        date_assigned: row.get("date_assigned")?,
        date_completed: row.get("date_completed")?,
        expires_at: row.get("expires_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Parse a task row joined with its category (`cat_*` columns).
fn parse_task_view_row(row: &Row) -> rusqlite::Result<TaskView> {
    let task = parse_task_row(row)?;
    let cat_id: Option<String> = row.get("cat_id")?;
    let cat_name: Option<String> = row.get("cat_name")?;
    let category = match (cat_id, cat_name) {
        (Some(id), Some(name)) => Some(CategoryRef {
            id,
            name,
            description: row.get("cat_description")?,
        }),
        _ => None,
    };
    Ok(TaskView { task, category })
}

fn insert_task_internal(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        "INSERT INTO tasks (
            id, kind, title, description, category_id, initials, notes, photos, status,
            date_assigned, date_completed, expires_at, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            &task.id,
            task.kind.as_str(),
            &task.title,
            &task.description,
            &task.category_id,
            &task.initials,
            &task.notes,
            encode_photos(&task.photos)?,
            task.status.as_str(),
            task.date_assigned,
            task.date_completed,
            task.expires_at,
            task.created_at,
            task.updated_at,
        ],
    )?;
    Ok(())
}

impl Database {
    /// Insert a single task.
    pub fn insert_task(&self, task: &Task) -> Result<()> {
        self.with_conn(|conn| insert_task_internal(conn, task))
    }

    /// Insert a batch of tasks in one transaction: either all land or none do.
    pub fn insert_tasks(&self, tasks: &[Task]) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for task in tasks {
                insert_task_internal(&tx, task)?;
            }
            tx.commit()?;
            Ok(tasks.len())
        })
    }

    /// Get a task by id.
    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM tasks t WHERE t.id = ?1", TASK_COLUMNS);
            let task = conn
                .query_row(&sql, params![id], parse_task_row)
                .optional()?;
            Ok(task)
        })
    }

    /// Persist a task's submission fields and status.
    ///
    /// Returns `Ok(false)` if the task no longer exists.
    pub fn update_submission(&self, task: &Task) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE tasks SET initials = ?1, notes = ?2, photos = ?3, status = ?4,
                    date_completed = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    &task.initials,
                    &task.notes,
                    encode_photos(&task.photos)?,
                    task.status.as_str(),
                    task.date_completed,
                    task.updated_at,
                    &task.id,
                ],
            )?;
            Ok(updated > 0)
        })
    }

    /// Delete a task by id. Returns whether a row was removed.
    pub fn delete_task(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
    }

    /// List tasks with their categories populated, newest first.
    pub fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<TaskView>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {}, c.id AS cat_id, c.name AS cat_name, c.description AS cat_description
                 FROM tasks t
                 LEFT JOIN categories c ON c.id = t.category_id
                 WHERE (?1 IS NULL OR t.kind = ?1)
                   AND (?2 IS NULL OR t.status = ?2)
                 ORDER BY t.created_at DESC, t.id DESC",
                TASK_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(
                    params![
                        filter.kind.map(|k| k.as_str()),
                        filter.status.map(|s| s.as_str()),
                    ],
                    parse_task_view_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    /// Load up to `limit` tasks of one kind, oldest first, paired with their
    /// category names (if the category still exists).
    pub fn load_tasks_of_kind(
        &self,
        kind: TaskKind,
        limit: usize,
    ) -> Result<Vec<(Task, Option<String>)>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {}, c.name AS cat_name
                 FROM tasks t
                 LEFT JOIN categories c ON c.id = t.category_id
                 WHERE t.kind = ?1
                 ORDER BY t.created_at ASC, t.id ASC
                 LIMIT ?2",
                TASK_COLUMNS
            );
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params![kind.as_str(), limit], |row| {
                    Ok((parse_task_row(row)?, row.get("cat_name")?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    /// Count tasks of one kind.
    pub fn count_tasks_of_kind(&self, kind: TaskKind) -> Result<i64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tasks WHERE kind = ?1",
                params![kind.as_str()],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Delete every task of one kind. Returns the number removed.
    pub fn delete_tasks_of_kind(&self, kind: TaskKind) -> Result<usize> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE kind = ?1", params![kind.as_str()])?;
            Ok(deleted)
        })
    }
}
