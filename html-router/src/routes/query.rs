use axum::{
    extract::{FromRef, State},
    response::{Html, IntoResponse},
    routing::post,
    Form, Router,
};
use minijinja::context;
use serde::Deserialize;

use retrieval_gateway::QueryError;

use crate::{error::HtmlError, html_state::HtmlState, session_index, SessionType};

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new().route("/query", post(ask_question))
}

#[derive(Deserialize)]
pub struct QueryParams {
    question: String,
}

/// Answers a question against the session's corpus, or renders the warning
/// explaining which precondition stopped it.
async fn ask_question(
    State(state): State<HtmlState>,
    session: SessionType,
    Form(params): Form<QueryParams>,
) -> Result<impl IntoResponse, HtmlError> {
    let index = session_index::load_index(&session);

    let (template, ctx) = match state.queries.answer(&index, &params.question).await {
        Ok(answer) => ("partials/query_answer.html", context! { answer => answer }),
        Err(QueryError::Rejected(precondition)) => (
            "partials/query_notice.html",
            context! { kind => "warning", message => precondition.message() },
        ),
        Err(err @ QueryError::Upstream(_)) => (
            "partials/query_notice.html",
            context! { kind => "error", message => err.to_string() },
        ),
    };

    let html = state.templates.render(template, &ctx)?;
    Ok(Html(html))
}
