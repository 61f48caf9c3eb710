pub mod indexer;


use std::sync::Arc;

use bytes::Bytes;
use common::{
    session::{DocumentId, SessionIndex},
    storage::DocumentStore,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::indexer::DocumentIndexer;

/// One named binary upload as submitted by the operator.
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Per-file result of an ingestion attempt, surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// Stored, indexed by the external service, and recorded in the session.
    Indexed,
    /// Identity was already in the session index; the external service was
    /// not called again.
    AlreadyIndexed,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub file_name: String,
    #[serde(flatten)]
    pub outcome: IngestOutcome,
}

/// Orchestrates upload ingestion: persist the bytes, consult the session
/// index, call the external indexing service, record the identity.
///
/// Idempotence lives in the session index, not in storage: a re-upload of an
/// already indexed name still overwrites the stored bytes but never reaches
/// the indexing service a second time. A failed attempt leaves the identity
/// out of the index, so an identical re-upload retries the whole path.
pub struct IngestionGateway {
    store: DocumentStore,
    indexer: Arc<dyn DocumentIndexer>,
}

impl IngestionGateway {
    pub fn new(store: DocumentStore, indexer: Arc<dyn DocumentIndexer>) -> Self {
        Self { store, indexer }
    }

    /// Ingest a whole upload batch, strictly sequential in submission order.
    ///
    /// Files are independent: a failure produces a `Failed` report for that
    /// file and the batch carries on.
    pub async fn ingest_batch(
        &self,
        index: &mut SessionIndex,
        uploads: Vec<DocumentUpload>,
    ) -> Vec<IngestReport> {
        let mut reports = Vec::with_capacity(uploads.len());
        for upload in uploads {
            reports.push(self.ingest_upload(index, upload).await);
        }
        reports
    }

    /// Ingest a single upload and report its outcome.
    #[tracing::instrument(skip_all, fields(file_name = %upload.file_name))]
    pub async fn ingest_upload(
        &self,
        index: &mut SessionIndex,
        upload: DocumentUpload,
    ) -> IngestReport {
        let DocumentUpload { file_name, bytes } = upload;

        let id = match self.store.persist(&file_name, bytes).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "failed to persist upload");
                return IngestReport {
                    file_name,
                    outcome: IngestOutcome::Failed {
                        reason: e.to_string(),
                    },
                };
            }
        };

        if index.contains(&id) {
            debug!(document_id = %id, "document already indexed this session");
            return IngestReport {
                file_name,
                outcome: IngestOutcome::AlreadyIndexed,
            };
        }

        match self.indexer.index_document(&self.ingest_location(&id)).await {
            Ok(()) => {
                info!(document_id = %id, "document indexed");
                index.add(id);
                IngestReport {
                    file_name,
                    outcome: IngestOutcome::Indexed,
                }
            }
            Err(e) => {
                warn!(document_id = %id, error = %e, "indexing failed");
                IngestReport {
                    file_name,
                    outcome: IngestOutcome::Failed {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    /// The location handed to the indexing service: the filesystem path for
    /// the local backend, the logical location otherwise.
    fn ingest_location(&self, id: &DocumentId) -> String {
        self.store
            .resolve_local_path(id.as_str())
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| id.as_str().to_string())
    }
}
