use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use common::error::AppError;
use tracing::error;

/// Failure while producing a page or fragment.
///
/// Expected outcomes (precondition warnings, upstream error notices, empty
/// lookups) are rendered as regular fragments by the handlers; this type only
/// fires when the surface itself breaks.
#[derive(Debug)]
pub enum HtmlError {
    AppError(AppError),
    TemplateError(String),
}

impl From<AppError> for HtmlError {
    fn from(err: AppError) -> Self {
        Self::AppError(err)
    }
}

impl From<minijinja::Error> for HtmlError {
    fn from(err: minijinja::Error) -> Self {
        Self::TemplateError(err.to_string())
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::AppError(AppError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::AppError(_) | Self::TemplateError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        match &self {
            Self::AppError(err) => error!("Request failed: {err:?}"),
            Self::TemplateError(err) => error!("Template error: {err}"),
        }
        (status, Html(fallback_error())).into_response()
    }
}

fn fallback_error() -> String {
    r#"
    <html>
        <body>
            <div class="container">
                <h1>Error</h1>
                <p>Sorry, something went wrong displaying this page.</p>
            </div>
        </body>
    </html>
    "#
    .to_string()
}
