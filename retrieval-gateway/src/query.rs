use std::sync::Arc;

use async_openai::types::{ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use common::{error::AppError, session::SessionIndex, utils::config::AppConfig};
use thiserror::Error;
use tracing::{info, warn};

pub type OpenAIClientType = async_openai::Client<async_openai::config::OpenAIConfig>;

/// Locally detected invalid input, reported before any external call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    EmptyQuestion,
    NoDocuments,
}

impl Precondition {
    /// Operator-facing warning wording.
    pub fn message(&self) -> &'static str {
        match self {
            Self::EmptyQuestion => "Please enter a question to proceed.",
            Self::NoDocuments => "Please upload at least one document before querying.",
        }
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{}", .0.message())]
    Rejected(Precondition),
    #[error("query service failed: {0}")]
    Upstream(String),
}

/// External service answering a question against the whole indexed corpus.
///
/// The caller guarantees the corpus is non-empty; behavior on an empty
/// corpus is undefined by the collaborator's contract.
#[async_trait]
pub trait CorpusAnswerer: Send + Sync {
    async fn answer(&self, question: &str) -> Result<String, AppError>;
}

/// Default answerer driving a chat completion with the raw question.
pub struct OpenAiAnswerer {
    client: Arc<OpenAIClientType>,
    model: String,
}

impl OpenAiAnswerer {
    pub fn new(client: Arc<OpenAIClientType>, config: &AppConfig) -> Self {
        Self {
            client,
            model: config.query_model.clone(),
        }
    }
}

#[async_trait]
impl CorpusAnswerer for OpenAiAnswerer {
    async fn answer(&self, question: &str) -> Result<String, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([ChatCompletionRequestUserMessage::from(question).into()])
            .build()?;

        let response = self.client.chat().create(request).await?;
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(AppError::Upstream(
                "no content in query service response".into(),
            ))
    }
}

/// Gates question answering on the session's state.
///
/// Both preconditions are checked in order before anything leaves the
/// process: a blank question first, then an empty index. Only when both
/// hold is the collaborator invoked, with the raw question text, and its
/// answer is returned verbatim. A collaborator failure is converted into a
/// reported outcome rather than propagated, so a failed interaction leaves
/// the session untouched.
pub struct QueryGateway {
    answerer: Arc<dyn CorpusAnswerer>,
}

impl QueryGateway {
    pub fn new(answerer: Arc<dyn CorpusAnswerer>) -> Self {
        Self { answerer }
    }

    pub async fn answer(
        &self,
        index: &SessionIndex,
        question: &str,
    ) -> Result<String, QueryError> {
        if question.trim().is_empty() {
            return Err(QueryError::Rejected(Precondition::EmptyQuestion));
        }
        if index.is_empty() {
            return Err(QueryError::Rejected(Precondition::NoDocuments));
        }

        info!(document_count = index.len(), "querying indexed corpus");
        match self.answerer.answer(question).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                warn!(error = %e, "query service call failed");
                Err(QueryError::Upstream(e.to_string()))
            }
        }
    }
}
