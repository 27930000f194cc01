// Communication with SQLite
// Philosophy of CRUD lives here
// Every operation checks a connection out of the pool and returns it when the guard drops.
use std::time::Duration;

use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, instrument};

use crate::app::error::{Result, StorageError};
use crate::app::models::{Status, Task, STATUS_DONE, STATUS_IN_PROGRESS, STATUS_PENDING};
use crate::app::repository::TaskRepository;

pub type ConnectionPool = Pool<SqliteConnectionManager>;

const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.created_date, t.completed_date, \
                            t.status_id, t.version, s.id, s.status_name, s.is_default";

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub pool_size: u32,
    pub busy_timeout_ms: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            busy_timeout_ms: 5_000,
        }
    }
}

// Runs on each new connection so foreign keys are always enforced
#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;\
             PRAGMA busy_timeout = {};\
             PRAGMA foreign_keys = ON;",
            self.busy_timeout_ms
        ))
    }
}

#[derive(Clone)]
pub struct Storage {
    pool: ConnectionPool,
}

impl Storage {
    // Open (or create) a file-backed database
    pub fn open(path: &str, config: &StorageConfig) -> Result<Storage> {
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(Duration::from_secs(5))
            .connection_customizer(Box::new(PragmaCustomizer {
                busy_timeout_ms: config.busy_timeout_ms,
            }))
            .build(SqliteConnectionManager::file(path))?;
        info!(path, pool_size = config.pool_size, "database opened");
        Ok(Storage { pool })
    }

    // In-memory database behind a single long-lived connection.
    // Every in-memory connection is its own database, so the pool must never hold more than one.
    pub fn in_memory() -> Result<Storage> {
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_customizer(Box::new(PragmaCustomizer {
                busy_timeout_ms: StorageConfig::default().busy_timeout_ms,
            }))
            .build(SqliteConnectionManager::memory())?;
        Ok(Storage { pool })
    }

    pub fn create_tables_if_not_exist(&self) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS statuses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                status_name TEXT NOT NULL UNIQUE CHECK (length(status_name) <= 50),
                is_default INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                created_date TEXT NOT NULL,
                completed_date TEXT,
                status_id INTEGER NOT NULL REFERENCES statuses(id),
                version INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status_id);",
        )?;
        Ok(())
    }

    // Make sure the canonical statuses exist; Pending becomes the default unless one is already flagged
    pub fn seed_statuses(&self) -> Result<()> {
        let conn = self.pool.get()?;
        let mut inserted = 0;
        for name in [STATUS_PENDING, STATUS_IN_PROGRESS, STATUS_DONE] {
            inserted += conn.execute(
                "INSERT OR IGNORE INTO statuses (status_name, is_default) VALUES (?1, 0);",
                [name],
            )?;
        }
        conn.execute(
            "UPDATE statuses SET is_default = 1 WHERE status_name = ?1
             AND NOT EXISTS (SELECT 1 FROM statuses WHERE is_default = 1);",
            [STATUS_PENDING],
        )?;
        info!(inserted, "statuses seeded");
        Ok(())
    }

    // READ (status)
    pub fn get_all_statuses(&self) -> Result<Vec<Status>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, status_name, is_default FROM statuses ORDER BY id;")?;
        let statuses = stmt
            .query_map([], status_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(statuses)
    }
}

fn status_from_row(row: &Row<'_>) -> rusqlite::Result<Status> {
    Ok(Status {
        id: row.get(0)?,
        status_name: row.get(1)?,
        is_default: row.get(2)?,
    })
}

// Maps a row selected with TASK_COLUMNS
fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        created_date: row.get(3)?,
        completed_date: row.get(4)?,
        status_id: row.get(5)?,
        version: row.get(6)?,
        status: Status {
            id: row.get(7)?,
            status_name: row.get(8)?,
            is_default: row.get(9)?,
        },
    })
}

impl TaskRepository for Storage {
    // READ
    #[instrument(skip(self))]
    fn get_all_tasks(&self) -> Result<Vec<Task>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t JOIN statuses s ON s.id = t.status_id ORDER BY t.id;"
        ))?;
        let tasks = stmt
            .query_map([], task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    #[instrument(skip(self))]
    fn get_task_by_id(&self, id: i64) -> Result<Option<Task>> {
        let conn = self.pool.get()?;
        let task = conn
            .query_row(
                &format!(
                    "SELECT {TASK_COLUMNS} FROM tasks t JOIN statuses s ON s.id = t.status_id WHERE t.id = ?1;"
                ),
                [id],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    // CREATE
    #[instrument(skip(self, task), fields(title = %task.title))]
    fn add_task(&self, task: &mut Task) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO tasks (title, description, created_date, completed_date, status_id, version)
             VALUES (?1, ?2, ?3, ?4, ?5, 0);",
            params![
                task.title,
                task.description,
                task.created_date,
                task.completed_date,
                task.status.id
            ],
        )?;
        task.id = Some(conn.last_insert_rowid());
        task.status_id = task.status.id;
        task.version = 0;
        debug!(id = ?task.id, "task added");
        Ok(())
    }

    // UPDATE
    #[instrument(skip(self, task), fields(id = ?task.id, version = task.version))]
    fn update_task(&self, task: &Task) -> Result<()> {
        let id = task.id.unwrap_or(-1);
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE tasks SET title = ?1, description = ?2, completed_date = ?3, status_id = ?4,
             version = version + 1 WHERE id = ?5 AND version = ?6;",
            params![
                task.title,
                task.description,
                task.completed_date,
                task.status_id,
                id,
                task.version
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::Concurrency { id });
        }
        debug!("task updated");
        Ok(())
    }

    // DELETE
    #[instrument(skip(self))]
    fn delete_task(&self, id: i64) -> Result<()> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        debug!(deleted, "task delete");
        Ok(())
    }

    #[instrument(skip(self))]
    fn task_exists(&self, id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        let exists = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM tasks WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    #[instrument(skip(self))]
    fn get_default_status(&self) -> Result<Option<Status>> {
        let conn = self.pool.get()?;
        let status = conn
            .query_row(
                "SELECT id, status_name, is_default FROM statuses
                 ORDER BY is_default DESC, id ASC LIMIT 1;",
                [],
                status_from_row,
            )
            .optional()?;
        Ok(status)
    }

    #[instrument(skip(self))]
    fn set_task_status(&self, id: i64, status_name: &str) -> Result<()> {
        let conn = self.pool.get()?;
        let task_found: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM tasks WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        if !task_found {
            debug!("task not found, status unchanged");
            return Ok(());
        }

        let status_id: Option<i64> = conn
            .query_row(
                "SELECT id FROM statuses WHERE status_name = ?1;",
                [status_name],
                |row| row.get(0),
            )
            .optional()?;
        let Some(status_id) = status_id else {
            debug!("status not found, task unchanged");
            return Ok(());
        };

        match status_name {
            STATUS_DONE => conn.execute(
                "UPDATE tasks SET status_id = ?1, completed_date = ?2, version = version + 1 WHERE id = ?3;",
                params![status_id, Utc::now(), id],
            )?,
            STATUS_PENDING => conn.execute(
                "UPDATE tasks SET status_id = ?1, completed_date = NULL, version = version + 1 WHERE id = ?2;",
                params![status_id, id],
            )?,
            _ => conn.execute(
                "UPDATE tasks SET status_id = ?1, version = version + 1 WHERE id = ?2;",
                params![status_id, id],
            )?,
        };
        debug!(status_id, "task status changed");
        Ok(())
    }

    #[instrument(skip(self))]
    fn clear_done_tasks(&self) -> Result<usize> {
        let conn = self.pool.get()?;
        let removed = conn.execute(
            "DELETE FROM tasks WHERE status_id IN (SELECT id FROM statuses WHERE status_name = ?1);",
            [STATUS_DONE],
        )?;
        info!(removed, "done tasks cleared");
        Ok(removed)
    }
}
