use axum::{
    extract::{FromRef, State},
    response::{Html, IntoResponse},
    routing::post,
    Form, Router,
};
use minijinja::context;
use serde::Deserialize;
use tracing::warn;

use retrieval_gateway::LookupOutcome;

use crate::{error::HtmlError, html_state::HtmlState};

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new().route("/lookup", post(lookup_reference))
}

#[derive(Deserialize)]
pub struct LookupParams {
    query: String,
}

/// Searches the external reference repository and renders the best match, a
/// no-results notice, or the service's own error text.
async fn lookup_reference(
    State(state): State<HtmlState>,
    Form(params): Form<LookupParams>,
) -> Result<impl IntoResponse, HtmlError> {
    let ctx = match state.lookups.lookup(&params.query).await {
        Ok(LookupOutcome::Hit(hit)) => context! { outcome => "hit", hit => hit },
        Ok(LookupOutcome::Empty) => context! { outcome => "empty" },
        Ok(LookupOutcome::Error { message }) => {
            context! { outcome => "error", message => message }
        }
        Err(e) => {
            warn!(error = %e, "reference lookup failed");
            context! { outcome => "error", message => e.to_string() }
        }
    };

    let html = state
        .templates
        .render("partials/lookup_result.html", &ctx)?;
    Ok(Html(html))
}
