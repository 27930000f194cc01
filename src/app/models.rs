use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_IN_PROGRESS: &str = "In Progress";
pub const STATUS_DONE: &str = "Done";

pub const TITLE_MAX_CHARS: usize = 50;
pub const DESCRIPTION_MAX_CHARS: usize = 250;

// A named state a task can occupy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub id: i64,
    pub status_name: String,
    pub is_default: bool,
}

// A to-do item together with its attached status.
// `id` is None until the task is persisted; `version` is bumped by storage on every write.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub created_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub status_id: i64,
    pub status: Status,
    pub version: i64,
}

impl Task {
    // Build an unsaved task with the given status attached
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        created_date: DateTime<Utc>,
        status: Status,
    ) -> Task {
        Task {
            id: None,
            title: title.into(),
            description,
            created_date,
            completed_date: None,
            status_id: status.id,
            status,
            version: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status.status_name == STATUS_DONE
    }
}

// The three user-facing status transitions, named in URLs in kebab-case
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transition {
    InProgress,
    Pending,
    Done,
}

impl Transition {
    pub const ALL: [Transition; 3] = [Transition::Pending, Transition::InProgress, Transition::Done];

    pub fn status_name(self) -> &'static str {
        match self {
            Transition::InProgress => STATUS_IN_PROGRESS,
            Transition::Pending => STATUS_PENDING,
            Transition::Done => STATUS_DONE,
        }
    }

    pub fn path_segment(self) -> &'static str {
        match self {
            Transition::InProgress => "in-progress",
            Transition::Pending => "pending",
            Transition::Done => "done",
        }
    }
}
