use axum::{
    extract::{FromRef, State},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use minijinja::context;

use crate::{error::HtmlError, html_state::HtmlState, session_index, SessionType};

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new().route("/", get(index_page))
}

/// Full page shell; the panels inside it refresh themselves over htmx.
async fn index_page(
    State(state): State<HtmlState>,
    session: SessionType,
) -> Result<impl IntoResponse, HtmlError> {
    let index = session_index::load_index(&session);

    let html = state.templates.render(
        "index.html",
        &context! {
            document_count => index.len(),
            documents => session_index::document_names(&index),
        },
    )?;
    Ok(Html(html))
}
