// Renders the HTML pages for every handler outcome through tera templates.
// Values are autoescaped because every template name ends in `.html`.
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::{Context, Tera};
use tracing::error;

use crate::app::handlers::Page;
use crate::app::models::{Task, Transition, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS};
use crate::app::task_edit::{TaskForm, ValidationErrors, FIELD_DESCRIPTION, FIELD_STATUS, FIELD_TITLE};

const DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

const TEMPLATE_SOURCES: [(&str, &str); 5] = [
    ("layout.html", include_str!("../../templates/layout.html")),
    ("task_list.html", include_str!("../../templates/task_list.html")),
    ("task_edit.html", include_str!("../../templates/task_edit.html")),
    ("task_delete.html", include_str!("../../templates/task_delete.html")),
    ("not_found.html", include_str!("../../templates/not_found.html")),
];

static TEMPLATES: OnceLock<Tera> = OnceLock::new();

// Parsed on first use. A broken set leaves an empty engine, so every render reports the missing template.
fn templates() -> &'static Tera {
    TEMPLATES.get_or_init(|| {
        let mut tera = Tera::default();
        match tera.add_raw_templates(TEMPLATE_SOURCES) {
            Ok(()) => tera,
            Err(err) => {
                error!(error = %err, "failed to load page templates");
                Tera::default()
            }
        }
    })
}

// A task as shown in the list and on the delete page
#[derive(Debug, Serialize)]
struct TaskView<'a> {
    id: i64,
    title: &'a str,
    description: &'a str,
    status_name: &'a str,
    created_date: String,
    completed_date: String,
    transitions: Vec<TransitionLink>,
}

#[derive(Debug, Serialize)]
struct TransitionLink {
    segment: &'static str,
    label: &'static str,
}

impl<'a> TaskView<'a> {
    fn new(task: &'a Task) -> TaskView<'a> {
        // Offer every status the task is not already in
        let transitions = Transition::ALL
            .iter()
            .filter(|t| t.status_name() != task.status.status_name)
            .map(|t| TransitionLink {
                segment: t.path_segment(),
                label: t.status_name(),
            })
            .collect();
        TaskView {
            id: task.id.unwrap_or_default(),
            title: &task.title,
            description: task.description.as_deref().unwrap_or_default(),
            status_name: &task.status.status_name,
            created_date: format_date(Some(&task.created_date)),
            completed_date: format_date(task.completed_date.as_ref()),
            transitions,
        }
    }
}

pub fn render_page(page: &Page) -> tera::Result<String> {
    match page {
        Page::Index(tasks) => get_task_list_ui(tasks),
        Page::Create { form, errors } => get_task_edit_ui("Add Task", "Create", None, form, errors),
        Page::Edit { form, errors } => get_task_edit_ui("Edit Task", "Save", form.id, form, errors),
        Page::Delete(task) => get_delete_ui(task),
    }
}

pub fn render_not_found() -> tera::Result<String> {
    let mut context = Context::new();
    context.insert("heading", "Not Found");
    templates().render("not_found.html", &context)
}

fn format_date(date: Option<&DateTime<Utc>>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default()
}

fn get_task_list_ui(tasks: &[Task]) -> tera::Result<String> {
    let views: Vec<TaskView<'_>> = tasks.iter().map(TaskView::new).collect();
    let mut context = Context::new();
    context.insert("heading", "Tasks");
    context.insert("tasks", &views);
    context.insert("any_done", &tasks.iter().any(Task::is_done));
    templates().render("task_list.html", &context)
}

// Form for creating a task, or editing the one with `edit_id`
fn get_task_edit_ui(
    heading: &str,
    submit: &str,
    edit_id: Option<i64>,
    form: &TaskForm,
    errors: &ValidationErrors,
) -> tera::Result<String> {
    let mut context = Context::new();
    context.insert("heading", heading);
    context.insert("submit", submit);
    context.insert("edit_id", &edit_id);
    context.insert("title", &form.title);
    context.insert("description", form.description.as_deref().unwrap_or_default());
    context.insert("title_max", &TITLE_MAX_CHARS);
    context.insert("description_max", &DESCRIPTION_MAX_CHARS);
    context.insert("title_error", &errors.get(FIELD_TITLE));
    context.insert("description_error", &errors.get(FIELD_DESCRIPTION));
    context.insert("status_error", &errors.get(FIELD_STATUS));
    templates().render("task_edit.html", &context)
}

fn get_delete_ui(task: &Task) -> tera::Result<String> {
    let mut context = Context::new();
    context.insert("heading", "Delete Task");
    context.insert("task", &TaskView::new(task));
    templates().render("task_delete.html", &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::Status;

    fn task(id: i64, title: &str, status_name: &str) -> Task {
        let status = Status {
            id: 1,
            status_name: status_name.to_string(),
            is_default: false,
        };
        let mut task = Task::new(title, None, Utc::now(), status);
        task.id = Some(id);
        task
    }

    #[test]
    fn templates_parse() {
        for (name, _) in TEMPLATE_SOURCES {
            assert!(templates().get_template_names().any(|loaded| loaded == name));
        }
    }

    #[test]
    fn empty_list_says_so() {
        let html = render_page(&Page::Index(Vec::new())).unwrap();
        assert!(html.contains("<h1>Tasks</h1>"));
        assert!(html.contains("No tasks yet."));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn list_escapes_titles_and_offers_other_transitions() {
        let html = render_page(&Page::Index(vec![task(3, "<b>bold</b>", "Pending")])).unwrap();
        assert!(html.contains("&lt;b&gt;bold"));
        assert!(!html.contains("<b>bold"));
        assert!(html.contains("/tasks/3/status/in-progress"));
        assert!(html.contains("/tasks/3/status/done"));
        assert!(!html.contains("/tasks/3/status/pending"));
        assert!(!html.contains("/tasks/clear-done"));
    }

    #[test]
    fn list_offers_clearing_when_something_is_done() {
        let html = render_page(&Page::Index(vec![task(1, "Finished", "Done")])).unwrap();
        assert!(html.contains("action=\"/tasks/clear-done\""));
    }

    #[test]
    fn edit_form_keeps_id_and_shows_errors() {
        let mut errors = ValidationErrors::default();
        errors.add(FIELD_TITLE, "Enter the task title.");
        let form = TaskForm {
            id: Some(5),
            title: String::new(),
            description: Some("a \"quoted\" note".to_string()),
        };
        let html = render_page(&Page::Edit { form, errors }).unwrap();
        assert!(html.contains("action=\"/tasks/5\""));
        assert!(html.contains("name=\"id\" value=\"5\""));
        assert!(html.contains("Enter the task title."));
    }

    #[test]
    fn create_form_reports_missing_status() {
        let mut errors = ValidationErrors::default();
        errors.add(FIELD_STATUS, "Default status not found.");
        let html = render_page(&Page::Create {
            form: TaskForm::default(),
            errors,
        })
        .unwrap();
        assert!(html.contains("action=\"/tasks\""));
        assert!(html.contains("Default status not found."));
        assert!(!html.contains("name=\"id\""));
    }

    #[test]
    fn delete_page_posts_to_delete() {
        let html = render_page(&Page::Delete(task(9, "Doomed", "Pending"))).unwrap();
        assert!(html.contains("action=\"/tasks/9/delete\""));
        assert!(html.contains("Doomed"));
    }

    #[test]
    fn not_found_page_links_back() {
        let html = render_not_found().unwrap();
        assert!(html.contains("<h1>Not Found</h1>"));
        assert!(html.contains("href=\"/tasks\""));
    }
}
