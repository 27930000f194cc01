use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::app::models::{Status, Task, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS};

pub const FIELD_TITLE: &str = "title";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_STATUS: &str = "status";

// Content of the task create/edit form as submitted by the browser
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TaskForm {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

// A missing, empty or non-numeric id binds as None instead of rejecting the whole form
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|id| id.trim().parse().ok()))
}

// Field-level validation messages, in the order they were raised
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(&'static str, String)>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push((field, message.into()));
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|(name, _)| *name == field)
    }

    // First message raised for the field
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl TaskForm {
    // Prefill the form with a stored task
    pub fn from_task(task: &Task) -> TaskForm {
        TaskForm {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
        }
    }

    // Blank descriptions are stored as absent
    pub fn normalized_description(&self) -> Option<String> {
        self.description
            .as_ref()
            .filter(|description| !description.trim().is_empty())
            .cloned()
    }

    // Validate the input; lengths are counted in characters, not bytes
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();

        if self.title.trim().is_empty() {
            errors.add(FIELD_TITLE, "Enter the task title.");
        } else if self.title.chars().count() > TITLE_MAX_CHARS {
            errors.add(
                FIELD_TITLE,
                format!("The title must have a maximum of {TITLE_MAX_CHARS} characters"),
            );
        }

        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_MAX_CHARS {
                errors.add(
                    FIELD_DESCRIPTION,
                    format!(
                        "The description must have a maximum of {DESCRIPTION_MAX_CHARS} characters"
                    ),
                );
            }
        }

        errors
    }

    // Construct an unsaved task object from the form
    pub fn to_new_task(&self, created_date: DateTime<Utc>, status: Status) -> Task {
        Task::new(
            self.title.clone(),
            self.normalized_description(),
            created_date,
            status,
        )
    }

    // Overlay title and description; status and dates stay as stored
    pub fn apply_to(&self, task: &mut Task) {
        task.title = self.title.clone();
        task.description = self.normalized_description();
    }
}
