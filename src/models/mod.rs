//! Data models for documents and their analysis.
//!
//! This module defines the structures exchanged with the backend:
//! - `Document` - An uploaded file plus its server-computed analysis metadata
//! - `AnalysisStatus` - Where a document is in the analysis pipeline
//! - `KeyClause` - One clause extracted by the analysis
//! - `AnalysisResult` - Response of the analyze endpoint
//! - `ChatEntry` - One question/answer pair in a document's transcript
//! - `UploadReceipt` - Identity of a freshly uploaded document

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Analysis status of a document as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    /// Convert to the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A clause highlighted by the analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyClause {
    /// Clause heading
    pub clause: String,
    /// Plain-language explanation (markdown)
    #[serde(default)]
    pub explanation: String,
}

/// A user-uploaded legal document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Server-assigned identifier (UUID string)
    pub id: String,

    /// Original filename
    pub filename: String,

    /// When the document was uploaded
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub upload_date: DateTime<Utc>,

    /// Analysis pipeline status
    #[serde(default)]
    pub analysis_status: AnalysisStatus,

    /// MIME type recorded by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,

    /// Full analysis text (markdown)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Structured clauses, when the analysis produced them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_clauses: Option<Vec<KeyClause>>,

    /// Risk assessment text (markdown)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<String>,
}

impl Document {
    /// True when the backend finished analysis and a summary is cached on the record.
    pub fn has_cached_analysis(&self) -> bool {
        self.analysis_status == AnalysisStatus::Completed
            && self.summary.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Build an `AnalysisResult` from the cached fields, if present.
    pub fn cached_analysis(&self) -> Option<AnalysisResult> {
        if !self.has_cached_analysis() {
            return None;
        }
        Some(AnalysisResult {
            summary: self.summary.clone().unwrap_or_default(),
            key_clauses: self.key_clauses.clone().unwrap_or_default(),
            risk_assessment: self.risk_assessment.clone().unwrap_or_default(),
        })
    }

    /// Upload date formatted for lists (YYYY-MM-DD).
    pub fn display_date(&self) -> String {
        self.upload_date.format("%Y-%m-%d").to_string()
    }
}

/// Response of `POST /documents/{id}/analyze`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub key_clauses: Vec<KeyClause>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub risk_assessment: String,
}

/// One question/answer exchange about a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub question: String,
    pub answer: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl ChatEntry {
    /// Create an entry stamped with the current time.
    pub fn now(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Response of `POST /documents/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub document_id: String,
    pub filename: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of `POST /documents/ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub document_id: String,
    pub question: String,
}

/// Response of `POST /documents/ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

/// Response of `DELETE /documents/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// The exact confirmation message the backend sends for a successful delete.
pub const DELETE_SUCCESS_MESSAGE: &str = "Document deleted successfully";

impl DeleteResponse {
    /// Whether the response carries the success confirmation.
    pub fn is_success(&self) -> bool {
        self.message.as_deref() == Some(DELETE_SUCCESS_MESSAGE)
    }
}

/// Accept RFC 3339 timestamps as well as naive ISO timestamps (interpreted as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

/// Parse a backend timestamp.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document_json(status: &str, summary: Option<&str>) -> serde_json::Value {
        serde_json::json!({
            "id": "doc-1",
            "filename": "lease.pdf",
            "file_path": "/uploads/doc-1.pdf",
            "file_type": "application/pdf",
            "upload_date": "2025-03-01T10:15:00.123456",
            "analysis_status": status,
            "summary": summary,
            "key_clauses": null,
            "risk_assessment": null
        })
    }

    #[test]
    fn test_analysis_status_wire_names() {
        for status in [
            AnalysisStatus::Pending,
            AnalysisStatus::Processing,
            AnalysisStatus::Completed,
            AnalysisStatus::Failed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_document_parses_naive_timestamp_and_ignores_extra_fields() {
        let doc: Document = serde_json::from_value(document_json("pending", None)).unwrap();
        assert_eq!(doc.id, "doc-1");
        assert_eq!(doc.analysis_status, AnalysisStatus::Pending);
        assert_eq!(doc.display_date(), "2025-03-01");
        assert!(doc.key_clauses.is_none());
    }

    #[test]
    fn test_document_parses_rfc3339_timestamp() {
        let mut value = document_json("pending", None);
        value["upload_date"] = serde_json::json!("2025-03-01T23:30:00+00:00");
        let doc: Document = serde_json::from_value(value).unwrap();
        assert_eq!(doc.display_date(), "2025-03-01");
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result: Result<Document, _> = serde_json::from_value(document_json("archived", None));
        assert!(result.is_err());
    }

    #[test]
    fn test_cached_analysis_requires_completed_and_summary() {
        let doc: Document =
            serde_json::from_value(document_json("completed", Some("Summary text"))).unwrap();
        let cached = doc.cached_analysis().unwrap();
        assert_eq!(cached.summary, "Summary text");
        assert!(cached.key_clauses.is_empty());
        assert_eq!(cached.risk_assessment, "");

        let doc: Document = serde_json::from_value(document_json("completed", None)).unwrap();
        assert!(doc.cached_analysis().is_none());

        let doc: Document =
            serde_json::from_value(document_json("processing", Some("partial"))).unwrap();
        assert!(doc.cached_analysis().is_none());
    }

    #[test]
    fn test_analysis_result_tolerates_nulls() {
        let result: AnalysisResult = serde_json::from_value(serde_json::json!({
            "document_id": "doc-1",
            "status": "completed",
            "summary": "S",
            "key_clauses": null,
            "risk_assessment": null
        }))
        .unwrap();
        assert_eq!(result.summary, "S");
        assert!(result.key_clauses.is_empty());
        assert!(result.risk_assessment.is_empty());
    }

    #[test]
    fn test_delete_response_success_shape() {
        let ok: DeleteResponse = serde_json::from_value(serde_json::json!({
            "message": "Document deleted successfully",
            "id": "doc-1"
        }))
        .unwrap();
        assert!(ok.is_success());

        let other: DeleteResponse =
            serde_json::from_value(serde_json::json!({"message": "ok"})).unwrap();
        assert!(!other.is_success());

        let empty: DeleteResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(!empty.is_success());
    }

    #[test]
    fn test_chat_entry_from_server_shape() {
        let entry: ChatEntry = serde_json::from_value(serde_json::json!({
            "id": "m-1",
            "document_id": "doc-1",
            "session_id": "qa_doc-1",
            "question": "Who pays?",
            "answer": "The tenant.",
            "timestamp": "2025-03-01T10:15:00Z"
        }))
        .unwrap();
        assert_eq!(entry.question, "Who pays?");
        assert_eq!(entry.answer, "The tenant.");
    }
}
