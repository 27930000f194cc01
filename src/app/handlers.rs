// One function per user action over the injected repository.
// Handlers decide what happens next and return it as an `Outcome`; the web layer turns it into HTTP.

use chrono::Utc;
use tracing::{debug, warn};

use crate::app::error::{AppError, StorageError};
use crate::app::models::{Task, STATUS_DONE, STATUS_IN_PROGRESS, STATUS_PENDING};
use crate::app::repository::TaskRepository;
use crate::app::task_edit::{TaskForm, ValidationErrors, FIELD_STATUS};

#[derive(Debug, PartialEq)]
pub enum Page {
    Index(Vec<Task>),
    Create {
        form: TaskForm,
        errors: ValidationErrors,
    },
    Edit {
        form: TaskForm,
        errors: ValidationErrors,
    },
    Delete(Task),
}

#[derive(Debug, PartialEq)]
pub enum Outcome {
    Render(Page),
    RedirectToIndex,
    NotFound,
}

pub type HandlerResult = Result<Outcome, AppError>;

pub fn index<R: TaskRepository + ?Sized>(repo: &R) -> HandlerResult {
    let tasks = repo.get_all_tasks()?;
    Ok(Outcome::Render(Page::Index(tasks)))
}

pub fn create_form() -> Outcome {
    Outcome::Render(Page::Create {
        form: TaskForm::default(),
        errors: ValidationErrors::default(),
    })
}

pub fn create<R: TaskRepository + ?Sized>(repo: &R, form: TaskForm) -> HandlerResult {
    let mut errors = form.validate();
    if !errors.is_empty() {
        return Ok(Outcome::Render(Page::Create { form, errors }));
    }

    let created_date = Utc::now();
    let Some(status) = repo.get_default_status()? else {
        warn!("no default status, task not created");
        errors.add(FIELD_STATUS, "Default status not found.");
        return Ok(Outcome::Render(Page::Create { form, errors }));
    };

    let mut task = form.to_new_task(created_date, status);
    repo.add_task(&mut task)?;
    Ok(Outcome::RedirectToIndex)
}

pub fn edit_form<R: TaskRepository + ?Sized>(repo: &R, id: Option<i64>) -> HandlerResult {
    let Some(id) = id else {
        return Ok(Outcome::NotFound);
    };
    Ok(match repo.get_task_by_id(id)? {
        Some(task) => Outcome::Render(Page::Edit {
            form: TaskForm::from_task(&task),
            errors: ValidationErrors::default(),
        }),
        None => Outcome::NotFound,
    })
}

pub fn edit<R: TaskRepository + ?Sized>(repo: &R, id: Option<i64>, form: TaskForm) -> HandlerResult {
    let Some(id) = id else {
        debug!(payload_id = ?form.id, "edit without a valid id");
        return Ok(Outcome::NotFound);
    };
    if form.id != Some(id) {
        debug!(id, payload_id = ?form.id, "edit id mismatch");
        return Ok(Outcome::NotFound);
    }

    let Some(mut existing) = repo.get_task_by_id(id)? else {
        return Ok(Outcome::NotFound);
    };
    form.apply_to(&mut existing);

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(Outcome::Render(Page::Edit { form, errors }));
    }

    match repo.update_task(&existing) {
        Ok(()) => Ok(Outcome::RedirectToIndex),
        Err(StorageError::Concurrency { .. }) if !repo.task_exists(id)? => {
            debug!(id, "task removed during edit");
            Ok(Outcome::NotFound)
        }
        Err(err) => Err(err.into()),
    }
}

pub fn delete_form<R: TaskRepository + ?Sized>(repo: &R, id: Option<i64>) -> HandlerResult {
    let Some(id) = id else {
        return Ok(Outcome::NotFound);
    };
    Ok(match repo.get_task_by_id(id)? {
        Some(task) => Outcome::Render(Page::Delete(task)),
        None => Outcome::NotFound,
    })
}

pub fn delete<R: TaskRepository + ?Sized>(repo: &R, id: i64) -> HandlerResult {
    repo.delete_task(id)?;
    Ok(Outcome::RedirectToIndex)
}

pub fn set_in_progress<R: TaskRepository + ?Sized>(repo: &R, id: i64) -> HandlerResult {
    repo.set_task_status(id, STATUS_IN_PROGRESS)?;
    Ok(Outcome::RedirectToIndex)
}

pub fn set_pending<R: TaskRepository + ?Sized>(repo: &R, id: i64) -> HandlerResult {
    repo.set_task_status(id, STATUS_PENDING)?;
    Ok(Outcome::RedirectToIndex)
}

pub fn set_done<R: TaskRepository + ?Sized>(repo: &R, id: i64) -> HandlerResult {
    repo.set_task_status(id, STATUS_DONE)?;
    Ok(Outcome::RedirectToIndex)
}

pub fn clear_done_tasks<R: TaskRepository + ?Sized>(repo: &R) -> HandlerResult {
    repo.clear_done_tasks()?;
    Ok(Outcome::RedirectToIndex)
}
