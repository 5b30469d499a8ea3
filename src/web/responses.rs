use axum::http::StatusCode;
use axum::response::Html;

use crate::web::{csrf::CsrfError, templates::render_error_page};

/// Helper for handlers that need to return `(StatusCode, Html<String>)`.
pub fn html_error(status: StatusCode, detail: impl AsRef<str>) -> (StatusCode, Html<String>) {
    let title = status.canonical_reason().unwrap_or("Error");
    (
        status,
        Html(render_error_page(status, title, detail.as_ref())),
    )
}

pub fn csrf_rejection(err: &CsrfError) -> (StatusCode, Html<String>) {
    html_error(StatusCode::BAD_REQUEST, err.to_string())
}

pub fn server_error() -> (StatusCode, Html<String>) {
    html_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "The server encountered an internal error and was unable to complete your request.",
    )
}
