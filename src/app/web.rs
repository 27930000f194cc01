// Axum routes mapping the HTTP surface onto the request handlers.
// Storage calls block, so every handler runs on tokio's blocking pool.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::app::error::{AppError, StorageError};
use crate::app::handlers::{self, HandlerResult, Outcome};
use crate::app::models::Transition;
use crate::app::repository::TaskRepository;
use crate::app::task_edit::TaskForm;
use crate::app::ui;

const INDEX_PATH: &str = "/tasks";

pub struct AppState<R> {
    repo: Arc<R>,
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Render(page) => match ui::render_page(&page) {
                Ok(html) => Html(html).into_response(),
                Err(err) => AppError::from(err).into_response(),
            },
            Outcome::RedirectToIndex => Redirect::to(INDEX_PATH).into_response(),
            Outcome::NotFound => match ui::render_not_found() {
                Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
                Err(err) => AppError::from(err).into_response(),
            },
        }
    }
}

// Health check response body
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

// Build the router with every task route over the given repository
pub fn create_router<R>(repo: R) -> Router
where
    R: TaskRepository + Send + Sync + 'static,
{
    let state = AppState {
        repo: Arc::new(repo),
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/tasks", get(index::<R>).post(create::<R>))
        .route("/tasks/new", get(create_form))
        .route("/tasks/clear-done", post(clear_done_tasks::<R>))
        .route("/tasks/{id}", post(edit::<R>))
        .route("/tasks/{id}/edit", get(edit_form::<R>))
        .route("/tasks/{id}/delete", get(delete_form::<R>).post(delete::<R>))
        .route("/tasks/{id}/status/{transition}", post(set_status::<R>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Serve the router until Ctrl+C or SIGTERM
pub async fn serve(address: &str, router: Router) -> anyhow::Result<()> {
    let listener = TcpListener::bind(address).await?;
    tracing::info!(address, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

// Run a handler against the repository on the blocking pool
async fn run_blocking<R, F>(state: &AppState<R>, action: F) -> HandlerResult
where
    R: TaskRepository + Send + Sync + 'static,
    F: FnOnce(&R) -> HandlerResult + Send + 'static,
{
    let repo = Arc::clone(&state.repo);
    tokio::task::spawn_blocking(move || action(repo.as_ref()))
        .await
        .map_err(|err| AppError::from(StorageError::Blocking(err.to_string())))?
}

// Path ids are lenient: anything that is not a number counts as missing
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

async fn root() -> Redirect {
    Redirect::to(INDEX_PATH)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn index<R>(State(state): State<AppState<R>>) -> HandlerResult
where
    R: TaskRepository + Send + Sync + 'static,
{
    run_blocking(&state, |repo| handlers::index(repo)).await
}

async fn create_form() -> Outcome {
    handlers::create_form()
}

async fn create<R>(State(state): State<AppState<R>>, Form(form): Form<TaskForm>) -> HandlerResult
where
    R: TaskRepository + Send + Sync + 'static,
{
    run_blocking(&state, move |repo| handlers::create(repo, form)).await
}

async fn edit_form<R>(State(state): State<AppState<R>>, Path(id): Path<String>) -> HandlerResult
where
    R: TaskRepository + Send + Sync + 'static,
{
    let id = parse_id(&id);
    run_blocking(&state, move |repo| handlers::edit_form(repo, id)).await
}

async fn edit<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    Form(form): Form<TaskForm>,
) -> HandlerResult
where
    R: TaskRepository + Send + Sync + 'static,
{
    let id = parse_id(&id);
    run_blocking(&state, move |repo| handlers::edit(repo, id, form)).await
}

async fn delete_form<R>(State(state): State<AppState<R>>, Path(id): Path<String>) -> HandlerResult
where
    R: TaskRepository + Send + Sync + 'static,
{
    let id = parse_id(&id);
    run_blocking(&state, move |repo| handlers::delete_form(repo, id)).await
}

// Deleting an id that cannot exist does nothing, like deleting a missing task
async fn delete<R>(State(state): State<AppState<R>>, Path(id): Path<String>) -> HandlerResult
where
    R: TaskRepository + Send + Sync + 'static,
{
    let Some(id) = parse_id(&id) else {
        return Ok(Outcome::RedirectToIndex);
    };
    run_blocking(&state, move |repo| handlers::delete(repo, id)).await
}

async fn set_status<R>(
    State(state): State<AppState<R>>,
    Path((id, transition)): Path<(String, Transition)>,
) -> HandlerResult
where
    R: TaskRepository + Send + Sync + 'static,
{
    let Some(id) = parse_id(&id) else {
        return Ok(Outcome::RedirectToIndex);
    };
    run_blocking(&state, move |repo| match transition {
        Transition::InProgress => handlers::set_in_progress(repo, id),
        Transition::Pending => handlers::set_pending(repo, id),
        Transition::Done => handlers::set_done(repo, id),
    })
    .await
}

async fn clear_done_tasks<R>(State(state): State<AppState<R>>) -> HandlerResult
where
    R: TaskRepository + Send + Sync + 'static,
{
    run_blocking(&state, |repo| handlers::clear_done_tasks(repo)).await
}
