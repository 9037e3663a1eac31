//! Document Registry - client-side cache of the document list.
//!
//! The registry is the single source of truth for the dashboard. It is only
//! ever replaced wholesale by [`DocumentRegistry::reload`]; deletes never
//! patch the cache, callers reload after a confirmed delete.

use crate::api::DocumentApi;
use crate::models::Document;
use crate::router::View;
use crate::{Error, Result};

/// Result of a confirmed delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The backend removed the document
    Deleted,
    /// The backend no longer knows the id; treated as success
    AlreadyGone,
}

/// Cached document list.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    documents: Vec<Document>,
    /// Whether at least one reload has succeeded
    loaded: bool,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All cached documents in server order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Whether a reload has ever succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Cached lookup by id.
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Documents whose filename contains `query`, case-insensitively.
    /// A blank query matches everything.
    pub fn filter(&self, query: &str) -> Vec<&Document> {
        let needle = query.trim().to_lowercase();
        self.documents
            .iter()
            .filter(|d| needle.is_empty() || d.filename.to_lowercase().contains(&needle))
            .collect()
    }

    /// Replace the cache with a freshly fetched list.
    pub fn replace(&mut self, documents: Vec<Document>) {
        self.documents = documents;
        self.loaded = true;
    }

    /// Fetch the authoritative list and replace the cache.
    ///
    /// On failure the cache is left as it was.
    pub async fn reload<A: DocumentApi>(&mut self, api: &A) -> Result<&[Document]> {
        match api.list_documents().await {
            Ok(documents) => {
                tracing::debug!(count = documents.len(), "document list reloaded");
                self.replace(documents);
                Ok(&self.documents)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load documents");
                Err(e)
            }
        }
    }

    /// Fetch a single document from the backend without touching the cache.
    pub async fn fetch<A: DocumentApi>(&self, api: &A, id: &str) -> Result<Document> {
        api.get_document(id).await
    }

    /// Delete one document. Does not refresh the cache.
    pub async fn delete<A: DocumentApi>(&self, api: &A, id: &str) -> Result<DeleteOutcome> {
        delete_document(api, id).await
    }

    /// The view to start in after the first reload.
    pub fn initial_view(&self) -> View {
        if self.documents.is_empty() {
            View::Upload
        } else {
            View::Dashboard
        }
    }
}

/// Prefix of the backend's detail when the document itself is missing.
/// A 404 without it means the route was not found (for example a wrong
/// base URL).
const DOCUMENT_NOT_FOUND: &str = "Document not found";

/// Issue a delete and interpret the response.
///
/// Success requires the backend's confirmation message. A 404 for a missing
/// document counts as [`DeleteOutcome::AlreadyGone`]. The cache is never
/// touched; reload after.
pub async fn delete_document<A: DocumentApi>(api: &A, id: &str) -> Result<DeleteOutcome> {
    match api.delete_document(id).await {
        Ok(response) if response.is_success() => {
            tracing::info!(document_id = id, "document deleted");
            Ok(DeleteOutcome::Deleted)
        }
        Ok(response) => {
            let message = response.message.unwrap_or_else(|| "<none>".to_string());
            tracing::error!(document_id = id, message = %message, "unexpected delete response");
            Err(Error::UnexpectedResponse(format!(
                "delete returned message {message:?}"
            )))
        }
        Err(Error::NotFound(detail)) if detail.starts_with(DOCUMENT_NOT_FOUND) => {
            tracing::warn!(document_id = id, detail = %detail, "document already deleted");
            Ok(DeleteOutcome::AlreadyGone)
        }
        Err(e) => {
            tracing::error!(document_id = id, error = %e, "delete failed");
            Err(e)
        }
    }
}
