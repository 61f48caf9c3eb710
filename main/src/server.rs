use std::sync::Arc;

use axum::{extract::FromRef, Router};
use axum_session::{SessionConfig, SessionStore};
use common::{storage::DocumentStore, utils::config::get_config};
use html_router::{html_routes, html_state::HtmlState, SessionStoreType};
use ingestion_gateway::{indexer::HttpDocumentIndexer, IngestionGateway};
use retrieval_gateway::{HttpReferenceSearcher, LookupGateway, OpenAiAnswerer, QueryGateway};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    // Shared clients and the document store
    let store = DocumentStore::new(&config).await?;
    let http_client = reqwest::Client::new();
    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    // Wire the gateways to their external services
    let indexer = Arc::new(HttpDocumentIndexer::new(
        http_client.clone(),
        &config.ingest_service_url,
    )?);
    let ingestion = Arc::new(IngestionGateway::new(store, indexer));

    let answerer = Arc::new(OpenAiAnswerer::new(openai_client, &config));
    let queries = Arc::new(QueryGateway::new(answerer));

    let searcher = Arc::new(HttpReferenceSearcher::new(
        http_client,
        &config.lookup_service_url,
    )?);
    let lookups = Arc::new(LookupGateway::new(searcher));

    let session_store: Arc<SessionStoreType> =
        Arc::new(SessionStore::new(None, SessionConfig::default()).await?);

    let html_state = HtmlState::new_with_resources(
        session_store,
        ingestion,
        queries,
        lookups,
        config.clone(),
        None,
    );

    // Create Axum router
    let app = Router::new()
        .merge(html_routes(&html_state))
        .with_state(AppState { html_state });

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Clone, FromRef)]
struct AppState {
    html_state: HtmlState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use common::{
        error::AppError,
        storage::store::testing::{memory_store, test_config},
    };
    use ingestion_gateway::indexer::DocumentIndexer;
    use retrieval_gateway::{CorpusAnswerer, ReferenceSearcher};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingIndexer {
        locations: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DocumentIndexer for RecordingIndexer {
        async fn index_document(&self, location: &str) -> Result<(), AppError> {
            self.locations
                .lock()
                .expect("lock locations")
                .push(location.to_string());
            Ok(())
        }
    }

    struct ScriptedAnswerer;

    #[async_trait]
    impl CorpusAnswerer for ScriptedAnswerer {
        async fn answer(&self, question: &str) -> Result<String, AppError> {
            Ok(format!("Answer to: {question}"))
        }
    }

    struct ScriptedSearcher {
        record: Value,
    }

    #[async_trait]
    impl ReferenceSearcher for ScriptedSearcher {
        async fn search(&self, _query: &str) -> Result<Value, AppError> {
            Ok(self.record.clone())
        }
    }

    async fn test_app(
        indexer: Arc<RecordingIndexer>,
        searcher_record: Value,
    ) -> Router {
        let ingestion = Arc::new(IngestionGateway::new(memory_store(), indexer));
        let queries = Arc::new(QueryGateway::new(Arc::new(ScriptedAnswerer)));
        let lookups = Arc::new(LookupGateway::new(Arc::new(ScriptedSearcher {
            record: searcher_record,
        })));
        let session_store = Arc::new(
            SessionStore::new(None, SessionConfig::default())
                .await
                .expect("session store"),
        );

        let html_state = HtmlState::new_with_resources(
            session_store,
            ingestion,
            queries,
            lookups,
            test_config(),
            None,
        );

        Router::new()
            .merge(html_routes(&html_state))
            .with_state(AppState { html_state })
    }

    async fn read_body(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    /// Cookie pairs from the response, ready for a follow-up request.
    fn session_cookie(response: &axum::response::Response) -> String {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn multipart_upload(file_name: &str, content: &str) -> (String, Body) {
        let boundary = "----upload-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"documents\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             {content}\r\n\
             --{boundary}--\r\n"
        );
        (
            format!("multipart/form-data; boundary={boundary}"),
            Body::from(body),
        )
    }

    #[tokio::test]
    async fn serves_the_index_page() {
        let app = test_app(Arc::new(RecordingIndexer::default()), Value::Null).await;

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
            .await
            .expect("index response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_body(response).await;
        assert!(body.contains("Enterprise Document Intelligence Platform"));
        assert!(body.contains("Submit Query"));
        assert!(body.contains("Search Documents"));
    }

    #[tokio::test]
    async fn health_probe_responds() {
        let app = test_app(Arc::new(RecordingIndexer::default()), Value::Null).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("health response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_body(response).await;
        let parsed: Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(parsed, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn question_without_documents_renders_warning() {
        let app = test_app(Arc::new(RecordingIndexer::default()), Value::Null).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/query")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("question=What+are+the+terms%3F"))
                    .expect("request"),
            )
            .await
            .expect("query response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_body(response).await;
        assert!(body.contains("Please upload at least one document before querying."));
    }

    #[tokio::test]
    async fn upload_query_round_trip_keeps_session_state() {
        let indexer = Arc::new(RecordingIndexer::default());
        let app = test_app(indexer.clone(), Value::Null).await;

        // First upload: stored, indexed, recorded.
        let (content_type, body) = multipart_upload("policy.pdf", "%PDF-1.4 sample");
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/documents")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(body)
                    .expect("request"),
            )
            .await
            .expect("upload response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("HX-Trigger")
                .and_then(|value| value.to_str().ok()),
            Some("indexed-documents-changed")
        );
        let cookie = session_cookie(&response);
        let report = read_body(response).await;
        assert!(report.contains("policy.pdf indexed"), "report: {report}");

        // The documents panel now counts one document.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/documents")
                    .header(header::COOKIE, cookie.clone())
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("panel response");
        let panel = read_body(response).await;
        assert!(
            panel.contains("Documents Indexed:</strong> 1"),
            "panel: {panel}"
        );
        assert!(panel.contains("policy.pdf"));

        // Re-uploading the same file skips the indexing service.
        let (content_type, body) = multipart_upload("policy.pdf", "%PDF-1.4 updated");
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/documents")
                    .header(header::CONTENT_TYPE, content_type)
                    .header(header::COOKIE, cookie.clone())
                    .body(body)
                    .expect("request"),
            )
            .await
            .expect("second upload response");
        let report = read_body(response).await;
        assert!(
            report.contains("policy.pdf is already indexed"),
            "report: {report}"
        );
        assert_eq!(indexer.locations.lock().expect("lock locations").len(), 1);

        // The count is unchanged.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/documents")
                    .header(header::COOKIE, cookie.clone())
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("panel response");
        let panel = read_body(response).await;
        assert!(
            panel.contains("Documents Indexed:</strong> 1"),
            "panel: {panel}"
        );

        // A blank question is rejected even with documents present.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/query")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .header(header::COOKIE, cookie.clone())
                    .body(Body::from("question="))
                    .expect("request"),
            )
            .await
            .expect("blank question response");
        let notice = read_body(response).await;
        assert!(notice.contains("Please enter a question to proceed."));

        // A real question reaches the answerer and comes back verbatim.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/query")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .header(header::COOKIE, cookie)
                    .body(Body::from("question=What+are+the+liability+terms%3F"))
                    .expect("request"),
            )
            .await
            .expect("question response");
        let answer = read_body(response).await;
        assert!(
            answer.contains("Answer to: What are the liability terms?"),
            "answer: {answer}"
        );
    }

    #[tokio::test]
    async fn lookup_renders_best_match() {
        let record = json!({
            "title": "Attention Is All You Need",
            "authors": "Vaswani et al.",
            "published": "2017-06-12",
            "summary": "Transformer architecture.",
            "arxiv_url": "https://arxiv.org/abs/1706.03762",
            "pdf_url": "https://arxiv.org/pdf/1706.03762",
        });
        let app = test_app(Arc::new(RecordingIndexer::default()), record).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/lookup")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("query=attention"))
                    .expect("request"),
            )
            .await
            .expect("lookup response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_body(response).await;
        assert!(body.contains("Attention Is All You Need"));
        assert!(body.contains("View Full Document"));
        assert!(body.contains("https://arxiv.org/pdf/1706.03762"));
    }

    #[tokio::test]
    async fn lookup_reports_the_services_own_error() {
        let record = json!({ "error": "ArXiv rate limit exceeded" });
        let app = test_app(Arc::new(RecordingIndexer::default()), record).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/lookup")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("query=anything"))
                    .expect("request"),
            )
            .await
            .expect("lookup response");

        let body = read_body(response).await;
        assert!(body.contains("ArXiv rate limit exceeded"));
        assert!(body.contains("notice-error"));
    }
}
