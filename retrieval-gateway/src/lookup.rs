use std::sync::Arc;

use async_trait::async_trait;
use common::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

/// Best-match reference record returned by the external search service.
///
/// Wire keys for the two links differ from the field names; the service
/// speaks `arxiv_url`/`pdf_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceHit {
    pub title: String,
    pub authors: String,
    pub published: String,
    pub summary: String,
    #[serde(rename(deserialize = "arxiv_url"))]
    pub source_url: String,
    #[serde(rename(deserialize = "pdf_url"))]
    pub download_url: String,
}

/// Outcome of one lookup, decided immediately at the service boundary so
/// downstream code switches on a closed set instead of probing keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Hit(ReferenceHit),
    Error { message: String },
    Empty,
}

/// External search service returning its raw best-match record.
#[async_trait]
pub trait ReferenceSearcher: Send + Sync {
    async fn search(&self, query: &str) -> Result<Value, AppError>;
}

/// Default searcher talking to the search service over HTTP.
pub struct HttpReferenceSearcher {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpReferenceSearcher {
    pub fn new(http: reqwest::Client, endpoint: &str) -> Result<Self, AppError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            AppError::Validation(format!("invalid lookup service url {endpoint:?}: {e}"))
        })?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl ReferenceSearcher for HttpReferenceSearcher {
    async fn search(&self, query: &str) -> Result<Value, AppError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[("query", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "lookup service returned {status}: {body}"
            )));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| {
            AppError::Upstream(format!("lookup service returned invalid JSON: {e}"))
        })
    }
}

/// Wraps the external search call and classifies its reply.
///
/// An empty query is sent through like any other; the query gateway's
/// precondition gate deliberately has no counterpart here, the service's
/// own reply decides the outcome.
pub struct LookupGateway {
    searcher: Arc<dyn ReferenceSearcher>,
}

impl LookupGateway {
    pub fn new(searcher: Arc<dyn ReferenceSearcher>) -> Self {
        Self { searcher }
    }

    /// Look up the single best external match for a query.
    ///
    /// Transport failures (the call could not complete at all) surface as
    /// errors; everything the service actually replied flows through
    /// [`classify`].
    pub async fn lookup(&self, query: &str) -> Result<LookupOutcome, AppError> {
        let record = self.searcher.search(query).await?;
        let outcome = classify(record);
        match &outcome {
            LookupOutcome::Hit(hit) => info!(title = %hit.title, "reference lookup hit"),
            LookupOutcome::Error { message } => {
                warn!(message = %message, "reference lookup reported an error");
            }
            LookupOutcome::Empty => info!("reference lookup found nothing"),
        }
        Ok(outcome)
    }
}

/// Sort a raw search record into the three possible outcomes.
///
/// An `error` key wins over everything else, even when hit fields are also
/// present. A record that is absent or carries no data is empty. Whatever
/// remains must supply the full hit shape; one that does not is reported as
/// an error rather than trusted.
pub fn classify(record: Value) -> LookupOutcome {
    if let Some(error) = record.get("error") {
        return LookupOutcome::Error {
            message: error_message(error),
        };
    }
    if is_falsy(&record) {
        return LookupOutcome::Empty;
    }
    match serde_json::from_value::<ReferenceHit>(record) {
        Ok(hit) => LookupOutcome::Hit(hit),
        Err(e) => LookupOutcome::Error {
            message: format!("unexpected search result shape: {e}"),
        },
    }
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Truthiness rules of the service's reply envelope: null, false, zero and
/// empty strings or containers all count as no result.
fn is_falsy(record: &Value) -> bool {
    match record {
        Value::Null => true,
        Value::Bool(value) => !value,
        Value::String(value) => value.is_empty(),
        Value::Array(values) => values.is_empty(),
        Value::Object(entries) => entries.is_empty(),
        Value::Number(value) => {
            value.as_i64() == Some(0)
                || value.as_u64() == Some(0)
                || value.as_f64().is_some_and(|f| f.abs() < f64::EPSILON)
        }
    }
}
