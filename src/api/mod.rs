//! Backend API boundary.
//!
//! [`DocumentApi`] is the seam between the document-lifecycle core and the
//! backend. [`HttpApi`] talks to the real service over HTTP; tests substitute
//! an in-memory implementation.

mod http;

use std::future::Future;
use std::sync::Arc;

pub use http::{HttpApi, UPLOAD_CHUNK_SIZE};

use crate::Result;
use crate::models::{AnalysisResult, ChatEntry, DeleteResponse, Document, UploadReceipt};
use crate::upload::UploadFile;

/// Byte-level upload progress callback: `(bytes_sent, total_bytes)`.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Operations the client consumes from the backend (`{base}/api`).
pub trait DocumentApi: Send + Sync {
    /// `GET /documents`
    fn list_documents(&self) -> impl Future<Output = Result<Vec<Document>>> + Send;

    /// `GET /documents/{id}`
    fn get_document(&self, id: &str) -> impl Future<Output = Result<Document>> + Send;

    /// `POST /documents/upload` (multipart field `file`)
    fn upload_document(
        &self,
        file: UploadFile,
        progress: ProgressFn,
    ) -> impl Future<Output = Result<UploadReceipt>> + Send;

    /// `DELETE /documents/{id}`
    fn delete_document(&self, id: &str) -> impl Future<Output = Result<DeleteResponse>> + Send;

    /// `POST /documents/{id}/analyze`
    fn analyze_document(&self, id: &str) -> impl Future<Output = Result<AnalysisResult>> + Send;

    /// `GET /documents/{id}/chat`
    fn chat_history(&self, id: &str) -> impl Future<Output = Result<Vec<ChatEntry>>> + Send;

    /// `POST /documents/ask`, returning the answer text
    fn ask(&self, document_id: &str, question: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Convert byte counts into a 0-100 percentage, rounding to nearest.
///
/// An empty body counts as complete.
pub fn progress_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let sent = sent.min(total);
    ((sent * 100 + total / 2) / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent_rounds() {
        assert_eq!(progress_percent(0, 200), 0);
        assert_eq!(progress_percent(1, 200), 1);
        assert_eq!(progress_percent(100, 200), 50);
        assert_eq!(progress_percent(199, 200), 100);
        assert_eq!(progress_percent(200, 200), 100);
    }

    #[test]
    fn test_progress_percent_empty_and_overflow() {
        assert_eq!(progress_percent(0, 0), 100);
        assert_eq!(progress_percent(500, 200), 100);
    }
}
