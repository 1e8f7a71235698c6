//! Category CRUD.

use super::Database;
use crate::error::ApiError;
use crate::types::Category;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

fn parse_category_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn get_category_internal(conn: &Connection, id: &str) -> Result<Option<Category>> {
    let category = conn
        .query_row(
            "SELECT * FROM categories WHERE id = ?1",
            params![id],
            parse_category_row,
        )
        .optional()?;
    Ok(category)
}

impl Database {
    /// Create a category. Names are unique; a duplicate yields a `Conflict` ApiError.
    pub fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
        now: i64,
    ) -> Result<Category> {
        let category = Category {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
        };

        self.with_conn(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM categories WHERE name = ?1",
                    params![&category.name],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Err(ApiError::category_exists(&category.name).into());
            }

            conn.execute(
                "INSERT INTO categories (id, name, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    &category.id,
                    &category.name,
                    &category.description,
                    category.created_at,
                    category.updated_at,
                ],
            )?;
            Ok(())
        })?;

        Ok(category)
    }

    /// Get a category by id.
    pub fn get_category(&self, id: &str) -> Result<Option<Category>> {
        self.with_conn(|conn| get_category_internal(conn, id))
    }

    /// List all categories, newest first.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM categories ORDER BY created_at DESC, id DESC")?;
            let categories = stmt
                .query_map([], parse_category_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(categories)
        })
    }

    /// Count tasks (of any kind) referencing a category.
    pub fn count_tasks_in_category(&self, id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tasks WHERE category_id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Delete a category unless tasks still reference it.
    ///
    /// Returns `Ok(false)` when the category does not exist. The reference
    /// check and the delete run under one connection lock.
    pub fn delete_category(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tasks WHERE category_id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            if count > 0 {
                return Err(ApiError::category_in_use(count).into());
            }

            let deleted = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
    }
}
