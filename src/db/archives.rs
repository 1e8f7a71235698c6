//! Per-day archive storage.

use super::{Database, decode_photos, encode_photos, get_enum};
use crate::types::{Archive, ArchivedTask};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;
use uuid::Uuid;

fn parse_snapshot_row(row: &Row) -> rusqlite::Result<ArchivedTask> {
    Ok(ArchivedTask {
        title: row.get("title")?,
        description: row.get("description")?,
        category_id: row.get("category_id")?,
        category_name: row.get("category_name")?,
        initials: row.get("initials")?,
        notes: row.get("notes")?,
        photos: decode_photos(row.get("photos")?),
        status: get_enum(row, "status")?,
        completed_at: row.get("completed_at")?,
    })
}

fn load_snapshots(conn: &Connection, archive_id: &str) -> Result<Vec<ArchivedTask>> {
    let mut stmt = conn.prepare(
        "SELECT title, description, category_id, category_name, initials, notes, photos,
                status, completed_at
         FROM archived_tasks
         WHERE archive_id = ?1
         ORDER BY seq ASC",
    )?;
    let tasks = stmt
        .query_map(params![archive_id], parse_snapshot_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

impl Database {
    /// Append snapshots to the archive for `date`, creating it if absent.
    ///
    /// Runs as one transaction, so a failure leaves no partial snapshots.
    /// `expires_at` only applies when the archive is created.
    /// Returns the archive id.
    pub fn append_to_archive(
        &self,
        date: &str,
        snapshots: &[ArchivedTask],
        expires_at: i64,
        now: i64,
    ) -> Result<String> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM archives WHERE date = ?1",
                    params![date],
                    |row| row.get(0),
                )
                .optional()?;

            let archive_id = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE archives SET updated_at = ?1 WHERE id = ?2",
                        params![now, &id],
                    )?;
                    id
                }
                None => {
                    let id = Uuid::now_v7().to_string();
                    tx.execute(
                        "INSERT INTO archives (id, date, expires_at, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![&id, date, expires_at, now, now],
                    )?;
                    id
                }
            };

            for snap in snapshots {
                tx.execute(
                    "INSERT INTO archived_tasks (
                        archive_id, title, description, category_id, category_name,
                        initials, notes, photos, status, completed_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        &archive_id,
                        &snap.title,
                        &snap.description,
                        &snap.category_id,
                        &snap.category_name,
                        &snap.initials,
                        &snap.notes,
                        encode_photos(&snap.photos)?,
                        snap.status.as_str(),
                        snap.completed_at,
                    ],
                )?;
            }

            tx.commit()?;
            Ok(archive_id)
        })
    }

    /// Get the archive for one calendar day.
    pub fn get_archive_by_date(&self, date: &str) -> Result<Option<Archive>> {
        self.with_conn(|conn| {
            let header: Option<(String, String, i64, i64, i64)> = conn
                .query_row(
                    "SELECT id, date, expires_at, created_at, updated_at
                     FROM archives WHERE date = ?1",
                    params![date],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
                )
                .optional()?;

            match header {
                Some((id, date, expires_at, created_at, updated_at)) => {
                    let tasks = load_snapshots(conn, &id)?;
                    Ok(Some(Archive {
                        id,
                        date,
                        tasks,
                        expires_at,
                        created_at,
                        updated_at,
                    }))
                }
                None => Ok(None),
            }
        })
    }

    /// List all archives, newest date first, each with its snapshots in order.
    pub fn list_archives(&self) -> Result<Vec<Archive>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, date, expires_at, created_at, updated_at
                 FROM archives ORDER BY date DESC",
            )?;
            let mut archives: Vec<Archive> = stmt
                .query_map([], |row| {
                    Ok(Archive {
                        id: row.get(0)?,
                        date: row.get(1)?,
                        tasks: Vec::new(),
                        expires_at: row.get(2)?,
                        created_at: row.get(3)?,
                        updated_at: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut index: HashMap<String, usize> = HashMap::new();
            for (i, archive) in archives.iter().enumerate() {
                index.insert(archive.id.clone(), i);
            }

            let mut snap_stmt = conn.prepare(
                "SELECT archive_id, title, description, category_id, category_name, initials,
                        notes, photos, status, completed_at
                 FROM archived_tasks ORDER BY seq ASC",
            )?;
            let rows = snap_stmt.query_map([], |row| {
                let archive_id: String = row.get("archive_id")?;
                Ok((archive_id, parse_snapshot_row(row)?))
            })?;

            for row in rows {
                let (archive_id, snap) = row?;
                if let Some(archive) = index.get(&archive_id).and_then(|&i| archives.get_mut(i)) {
                    archive.tasks.push(snap);
                }
            }

            Ok(archives)
        })
    }
}
