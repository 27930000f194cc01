use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

// Failures raised by the data access layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    // The row was changed or removed between read and write
    #[error("task {id} was modified or removed concurrently")]
    Concurrency { id: i64 },

    // The blocking task running a storage call did not complete
    #[error("storage task failed: {0}")]
    Blocking(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

// Fatal errors that terminate a request
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("page rendering failed: {0}")]
    Render(#[from] tera::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
