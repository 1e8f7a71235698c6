//! Admin operations: categories and master templates.

use super::Lifecycle;
use crate::error::{ApiError, ApiResult};
use crate::types::{Category, Task, non_blank};
use tracing::info;

impl Lifecycle {
    /// Create a category with a unique trimmed name.
    pub fn create_category(
        &self,
        name: Option<String>,
        description: Option<String>,
    ) -> ApiResult<Category> {
        let name = non_blank(name).ok_or_else(|| ApiError::missing_field("name"))?;
        let description = non_blank(description);

        let category = self
            .db
            .create_category(&name, description.as_deref(), self.now_ms())?;
        info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Delete a category no task references.
    pub fn delete_category(&self, id: Option<String>) -> ApiResult<()> {
        let id = non_blank(id).ok_or_else(|| ApiError::missing_field("id"))?;

        if !self.db.delete_category(&id)? {
            return Err(ApiError::category_not_found(&id));
        }
        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    /// Create a master template in an existing category.
    pub fn create_master(
        &self,
        title: Option<String>,
        description: Option<String>,
        category_id: Option<String>,
    ) -> ApiResult<Task> {
        let category_id =
            non_blank(category_id).ok_or_else(|| ApiError::missing_field("category"))?;
        let title = non_blank(title).ok_or_else(|| ApiError::missing_field("title"))?;
        let description =
            non_blank(description).ok_or_else(|| ApiError::missing_field("description"))?;

        if self.db.get_category(&category_id)?.is_none() {
            return Err(ApiError::category_not_found(&category_id).with_field("category"));
        }

        let task = Task::master(title, description, category_id, self.now_ms());
        self.db.insert_task(&task)?;
        info!(task_id = %task.id, title = %task.title, "Master task created");
        Ok(task)
    }

    /// Delete any task by id.
    pub fn delete_task(&self, task_id: &str) -> ApiResult<()> {
        if !self.db.delete_task(task_id)? {
            return Err(ApiError::task_not_found(task_id));
        }
        info!(task_id = %task_id, "Task deleted");
        Ok(())
    }
}
