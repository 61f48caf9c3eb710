use axum::{
    extract::{DefaultBodyLimit, FromRef, State},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use axum_htmx::HX_TRIGGER;
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use bytes::Bytes;
use minijinja::context;
use tracing::info;

use ingestion_gateway::DocumentUpload;

use crate::{error::HtmlError, html_state::HtmlState, session_index, SessionType};

/// Client-side event fired whenever the set of indexed documents changed, so
/// the documents panel re-fetches itself.
const DOCUMENTS_CHANGED_EVENT: &str = "indexed-documents-changed";

pub fn router<S>(max_body_bytes: usize) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new().route(
        "/documents",
        get(document_panel)
            .post(upload_documents)
            .layer(DefaultBodyLimit::max(max_body_bytes)),
    )
}

#[derive(Debug, TryFromMultipart)]
pub struct UploadParams {
    #[form_data(limit = "10000000")]
    #[form_data(default)]
    pub documents: Vec<FieldData<Bytes>>,
}

/// Runs the upload batch through ingestion and renders one report line per
/// file. The trigger header tells the page to refresh the documents panel.
async fn upload_documents(
    State(state): State<HtmlState>,
    session: SessionType,
    TypedMultipart(input): TypedMultipart<UploadParams>,
) -> Result<impl IntoResponse, HtmlError> {
    let uploads: Vec<DocumentUpload> = input
        .documents
        .into_iter()
        .map(|file| DocumentUpload {
            file_name: file.metadata.file_name.unwrap_or_default(),
            bytes: file.contents,
        })
        .collect();

    info!(file_count = uploads.len(), "Received document upload");

    let mut index = session_index::load_index(&session);
    let reports = state.ingestion.ingest_batch(&mut index, uploads).await;
    session_index::store_index(&session, &index);

    let html = state.templates.render(
        "partials/ingest_report.html",
        &context! { reports => reports },
    )?;
    Ok(([(HX_TRIGGER, DOCUMENTS_CHANGED_EVENT)], Html(html)))
}

/// Current state of the indexed-documents panel.
async fn document_panel(
    State(state): State<HtmlState>,
    session: SessionType,
) -> Result<impl IntoResponse, HtmlError> {
    let index = session_index::load_index(&session);

    let html = state.templates.render(
        "partials/document_panel.html",
        &context! {
            document_count => index.len(),
            documents => session_index::document_names(&index),
        },
    )?;
    Ok(Html(html))
}
