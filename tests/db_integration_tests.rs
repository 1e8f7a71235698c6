//! Integration tests for the database layer.
//!
//! These tests verify the storage operations using an in-memory SQLite database.
//! Tests are organized by table.

use shiftlist::db::Database;
use shiftlist::error::{ApiError, ErrorCode};
use shiftlist::types::{ArchivedTask, Task, TaskFilter, TaskKind, TaskStatus};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn api_error(err: anyhow::Error) -> ApiError {
    ApiError::from(err)
}

fn employee_copy(category_id: &str, title: &str, created_at: i64, expires_at: i64) -> Task {
    let mut task = Task::master(title, "desc", category_id, created_at);
    task.kind = TaskKind::EmployeeCopy;
    task.expires_at = Some(expires_at);
    task
}

fn snapshot(title: &str, status: TaskStatus) -> ArchivedTask {
    ArchivedTask {
        title: title.to_string(),
        description: "desc".to_string(),
        category_id: Some("cat".to_string()),
        category_name: Some("Kitchen".to_string()),
        initials: None,
        notes: None,
        photos: vec![],
        status,
        completed_at: Some(1),
    }
}

mod category_tests {
    use super::*;

    #[test]
    fn create_and_list_newest_first() {
        let db = setup_db();
        db.create_category("Kitchen", None, 100).unwrap();
        db.create_category("Front", Some("Front of house"), 200).unwrap();

        let categories = db.list_categories().unwrap();
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Front", "Kitchen"]);
        assert_eq!(categories[0].description.as_deref(), Some("Front of house"));
    }

    #[test]
    fn duplicate_name_is_conflict() {
        let db = setup_db();
        db.create_category("Kitchen", None, 100).unwrap();

        let err = api_error(db.create_category("Kitchen", None, 200).unwrap_err());
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(db.list_categories().unwrap().len(), 1);
    }

    #[test]
    fn delete_blocked_while_tasks_reference_it() {
        let db = setup_db();
        let cat = db.create_category("Kitchen", None, 100).unwrap();
        db.insert_task(&Task::master("Mop", "Floor", &cat.id, 100))
            .unwrap();
        db.insert_task(&employee_copy(&cat.id, "Mop", 110, 10_000))
            .unwrap();

        assert_eq!(db.count_tasks_in_category(&cat.id).unwrap(), 2);
        let err = api_error(db.delete_category(&cat.id).unwrap_err());
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.details.as_deref(), Some("2"));
        assert!(err.message.contains("2 task(s)"));
        assert!(db.get_category(&cat.id).unwrap().is_some());
    }

    #[test]
    fn delete_unreferenced_and_missing() {
        let db = setup_db();
        let cat = db.create_category("Kitchen", None, 100).unwrap();

        assert!(db.delete_category(&cat.id).unwrap());
        assert!(!db.delete_category(&cat.id).unwrap());
        assert!(db.get_category(&cat.id).unwrap().is_none());
    }
}

mod task_tests {
    use super::*;

    #[test]
    fn insert_and_get_roundtrips_fields() {
        let db = setup_db();
        let cat = db.create_category("Kitchen", None, 100).unwrap();
        let mut task = employee_copy(&cat.id, "Mop", 100, 5_000);
        task.photos = vec!["https://img/1.jpg".to_string(), "https://img/2.jpg".to_string()];
        task.status = TaskStatus::Completed;
        task.date_completed = Some(150);
        db.insert_task(&task).unwrap();

        let loaded = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(loaded, task);
    }

    #[test]
    fn get_unknown_task_returns_none() {
        let db = setup_db();
        assert!(db.get_task("nope").unwrap().is_none());
    }

    #[test]
    fn insert_requires_existing_category() {
        let db = setup_db();
        let task = Task::master("Mop", "Floor", "missing-category", 100);
        assert!(db.insert_task(&task).is_err());
    }

    #[test]
    fn list_filters_by_kind_and_status_newest_first() {
        let db = setup_db();
        let cat = db.create_category("Kitchen", Some("Back of house"), 100).unwrap();
        let master = Task::master("Mop", "Floor", &cat.id, 100);
        let older = employee_copy(&cat.id, "Older", 200, 5_000);
        let mut newer = employee_copy(&cat.id, "Newer", 300, 5_000);
        newer.status = TaskStatus::Incomplete;
        newer.notes = Some("out of soap".to_string());
        db.insert_tasks(&[master.clone(), older.clone(), newer.clone()])
            .unwrap();

        let all = db.list_tasks(TaskFilter::default()).unwrap();
        let titles: Vec<&str> = all.iter().map(|v| v.task.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer", "Older", "Mop"]);

        let copies = db
            .list_tasks(TaskFilter {
                kind: Some(TaskKind::EmployeeCopy),
                status: None,
            })
            .unwrap();
        assert_eq!(copies.len(), 2);

        let incomplete = db
            .list_tasks(TaskFilter {
                kind: Some(TaskKind::EmployeeCopy),
                status: Some(TaskStatus::Incomplete),
            })
            .unwrap();
        assert_eq!(incomplete.len(), 1);
        assert_eq!(incomplete[0].task.id, newer.id);

        let category = incomplete[0].category.as_ref().unwrap();
        assert_eq!(category.name, "Kitchen");
        assert_eq!(category.description.as_deref(), Some("Back of house"));
    }

    #[test]
    fn update_submission_persists_and_reports_missing() {
        let db = setup_db();
        let cat = db.create_category("Kitchen", None, 100).unwrap();
        let mut task = employee_copy(&cat.id, "Mop", 100, 5_000);
        db.insert_task(&task).unwrap();

        task.initials = Some("JD".to_string());
        task.photos = vec!["u1".to_string()];
        task.status = TaskStatus::Completed;
        task.date_completed = Some(120);
        task.updated_at = 120;
        assert!(db.update_submission(&task).unwrap());
        assert_eq!(db.get_task(&task.id).unwrap().unwrap(), task);

        assert!(db.delete_task(&task.id).unwrap());
        assert!(!db.update_submission(&task).unwrap());
        assert!(!db.delete_task(&task.id).unwrap());
    }

    #[test]
    fn bulk_operations_by_kind() {
        let db = setup_db();
        let cat = db.create_category("Kitchen", None, 100).unwrap();
        let first = Task::master("First", "d", &cat.id, 100);
        let second = Task::master("Second", "d", &cat.id, 200);
        db.insert_tasks(&[second.clone(), first.clone()]).unwrap();
        db.insert_tasks(&[
            employee_copy(&cat.id, "a", 300, 5_000),
            employee_copy(&cat.id, "b", 300, 5_000),
            employee_copy(&cat.id, "c", 300, 5_000),
        ])
        .unwrap();

        let masters = db.load_tasks_of_kind(TaskKind::Master, 10).unwrap();
        let titles: Vec<&str> = masters.iter().map(|(t, _)| t.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(masters[0].1.as_deref(), Some("Kitchen"));

        assert_eq!(db.load_tasks_of_kind(TaskKind::EmployeeCopy, 2).unwrap().len(), 2);
        assert_eq!(db.count_tasks_of_kind(TaskKind::EmployeeCopy).unwrap(), 3);

        assert_eq!(db.delete_tasks_of_kind(TaskKind::EmployeeCopy).unwrap(), 3);
        assert_eq!(db.count_tasks_of_kind(TaskKind::EmployeeCopy).unwrap(), 0);
        assert_eq!(db.count_tasks_of_kind(TaskKind::Master).unwrap(), 2);
    }

    #[test]
    fn batch_insert_is_all_or_nothing() {
        let db = setup_db();
        let cat = db.create_category("Kitchen", None, 100).unwrap();
        let good = Task::master("Good", "d", &cat.id, 100);
        let bad = Task::master("Bad", "d", "missing-category", 100);

        assert!(db.insert_tasks(&[good.clone(), bad]).is_err());
        assert!(db.get_task(&good.id).unwrap().is_none());
    }
}

mod archive_tests {
    use super::*;

    #[test]
    fn append_creates_then_extends_one_archive_per_date() {
        let db = setup_db();
        let first_id = db
            .append_to_archive(
                "2024-06-15",
                &[snapshot("a", TaskStatus::Completed), snapshot("b", TaskStatus::Pending)],
                9_000,
                1_000,
            )
            .unwrap();
        let second_id = db
            .append_to_archive("2024-06-15", &[snapshot("c", TaskStatus::Incomplete)], 99_999, 2_000)
            .unwrap();
        assert_eq!(first_id, second_id);

        let archive = db.get_archive_by_date("2024-06-15").unwrap().unwrap();
        let titles: Vec<&str> = archive.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        // expiry is fixed at creation; later appends only touch updated_at
        assert_eq!(archive.expires_at, 9_000);
        assert_eq!(archive.created_at, 1_000);
        assert_eq!(archive.updated_at, 2_000);
    }

    #[test]
    fn list_archives_newest_date_first_with_snapshots() {
        let db = setup_db();
        db.append_to_archive("2024-06-14", &[snapshot("old", TaskStatus::Completed)], 9_000, 1_000)
            .unwrap();
        db.append_to_archive("2024-06-15", &[snapshot("new", TaskStatus::Pending)], 9_000, 2_000)
            .unwrap();

        let archives = db.list_archives().unwrap();
        assert_eq!(archives.len(), 2);
        assert_eq!(archives[0].date, "2024-06-15");
        assert_eq!(archives[0].tasks[0].title, "new");
        assert_eq!(archives[1].tasks[0].title, "old");
        assert_eq!(archives[1].tasks[0].category_name.as_deref(), Some("Kitchen"));
    }

    #[test]
    fn missing_date_returns_none() {
        let db = setup_db();
        assert!(db.get_archive_by_date("2024-01-01").unwrap().is_none());
    }
}

mod expiry_tests {
    use super::*;

    #[test]
    fn purge_removes_only_expired_rows() {
        let db = setup_db();
        let cat = db.create_category("Kitchen", None, 100).unwrap();
        let master = Task::master("Mop", "Floor", &cat.id, 100);
        let expired = employee_copy(&cat.id, "old", 100, 1_000);
        let boundary = employee_copy(&cat.id, "edge", 100, 2_000);
        let live = employee_copy(&cat.id, "live", 100, 3_000);
        db.insert_tasks(&[master.clone(), expired.clone(), boundary.clone(), live.clone()])
            .unwrap();
        db.append_to_archive("2024-06-01", &[snapshot("a", TaskStatus::Completed)], 1_500, 100)
            .unwrap();
        db.append_to_archive("2024-06-02", &[snapshot("b", TaskStatus::Completed)], 5_000, 100)
            .unwrap();

        let stats = db.purge_expired(2_000).unwrap();
        assert_eq!(stats.tasks, 2);
        assert_eq!(stats.archives, 1);

        assert!(db.get_task(&master.id).unwrap().is_some());
        assert!(db.get_task(&live.id).unwrap().is_some());
        assert!(db.get_task(&expired.id).unwrap().is_none());
        assert!(db.get_task(&boundary.id).unwrap().is_none());

        let archives = db.list_archives().unwrap();
        assert_eq!(archives.len(), 1);
        assert_eq!(archives[0].date, "2024-06-02");
    }

    #[test]
    fn purge_with_nothing_expired_is_a_noop() {
        let db = setup_db();
        let stats = db.purge_expired(i64::MAX).unwrap();
        assert_eq!(stats.tasks, 0);
        assert_eq!(stats.archives, 0);
    }

    #[test]
    fn open_on_disk_runs_migrations() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("shiftlist.db");
        {
            let db = Database::open(&path).unwrap();
            db.create_category("Kitchen", None, 100).unwrap();
        }
        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.list_categories().unwrap().len(), 1);
    }
}
