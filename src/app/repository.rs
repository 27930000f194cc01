// Data access contract shared by the request handlers.
// `Storage` is the SQLite implementation; tests substitute a mock.
use crate::app::error::Result;
use crate::app::models::{Status, Task};

#[cfg_attr(test, mockall::automock)]
pub trait TaskRepository {
    // Every task with its status attached, in storage order
    fn get_all_tasks(&self) -> Result<Vec<Task>>;

    fn get_task_by_id(&self, id: i64) -> Result<Option<Task>>;

    // Persist a new task and assign its id; `task.status` must already be populated
    fn add_task(&self, task: &mut Task) -> Result<()>;

    // Persist title, description, status and dates of an existing task.
    // Fails with StorageError::Concurrency when the row changed or vanished since it was read.
    fn update_task(&self, task: &Task) -> Result<()>;

    // Absent ids are not an error
    fn delete_task(&self, id: i64) -> Result<()>;

    fn task_exists(&self, id: i64) -> Result<bool>;

    // The status assigned to newly created tasks, if any status exists
    fn get_default_status(&self) -> Result<Option<Status>>;

    // "Done" stamps the completion date and "Pending" clears it; other names leave it alone.
    // Does nothing when either the task or the status is missing.
    fn set_task_status(&self, id: i64, status_name: &str) -> Result<()>;

    // Returns how many "Done" tasks were removed
    fn clear_done_tasks(&self) -> Result<usize>;
}
