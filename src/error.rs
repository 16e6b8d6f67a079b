use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use hypertext::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred".to_string())
            }
        };

        let title = status.canonical_reason().unwrap_or("Error");
        let html = maud! {
            div .window.error-window {
                div .title-bar {
                    h1 .title { (title) }
                }
                div .separator {}
                div .window-pane {
                    p { (message) }
                    a href="/trainings" { "Back to Trainings" }
                }
            }
        }
        .render()
        .into_inner();

        (status, Html(html)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
