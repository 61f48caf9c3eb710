use async_trait::async_trait;
use common::error::AppError;
use url::Url;

/// External service that turns a stored document into searchable, indexed
/// form.
///
/// The caller guarantees the call is made at most once per identity per
/// session; this trait only carries the call itself.
#[async_trait]
pub trait DocumentIndexer: Send + Sync {
    async fn index_document(&self, location: &str) -> Result<(), AppError>;
}

/// Default indexer talking to the indexing service over HTTP.
pub struct HttpDocumentIndexer {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpDocumentIndexer {
    pub fn new(http: reqwest::Client, endpoint: &str) -> Result<Self, AppError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            AppError::Validation(format!("invalid ingest service url {endpoint:?}: {e}"))
        })?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl DocumentIndexer for HttpDocumentIndexer {
    async fn index_document(&self, location: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&serde_json::json!({ "location": location }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "ingest service returned {status}: {body}"
            )));
        }

        Ok(())
    }
}
