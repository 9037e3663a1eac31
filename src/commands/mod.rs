//! Command implementations for the Brief CLI.
//!
//! Each command drives the same core components as the terminal UI and
//! returns a value implementing [`Output`], printed by the binary as JSON
//! (default) or human-readable text (`-H`).

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::api::DocumentApi;
use crate::config::{self, BriefConfig, ResolvedConfig};
use crate::models::{AnalysisResult, ChatEntry, Document};
use crate::registry::DocumentRegistry;
use crate::selection::{BulkDeleteReport, delete_many};
use crate::session::{AnalysisSession, ClausesView};
use crate::upload::{UploadCoordinator, UploadEvent, UploadFile};
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{e}"}}"#))
}

// ==================== list ====================

#[derive(Debug, Serialize)]
pub struct DocumentList {
    pub count: usize,
    pub documents: Vec<Document>,
}

impl Output for DocumentList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.documents.is_empty() {
            return "No documents.".to_string();
        }
        let mut lines = vec![format!("{} document(s):", self.count)];
        for doc in &self.documents {
            lines.push(format!(
                "  {}  {:<10}  {}  {}",
                doc.display_date(),
                doc.analysis_status,
                doc.id,
                doc.filename
            ));
        }
        lines.join("\n")
    }
}

/// `brief list [--search q]`
pub async fn list<A: DocumentApi>(api: &A, search: Option<&str>) -> Result<DocumentList> {
    let mut registry = DocumentRegistry::new();
    registry.reload(api).await?;
    let documents: Vec<Document> = registry
        .filter(search.unwrap_or_default())
        .into_iter()
        .cloned()
        .collect();
    Ok(DocumentList {
        count: documents.len(),
        documents,
    })
}

// ==================== show ====================

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct DocumentDetail(pub Document);

impl Output for DocumentDetail {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let doc = &self.0;
        let mut lines = vec![
            format!("{} ({})", doc.filename, doc.id),
            format!("  Uploaded: {}", doc.upload_date.format("%Y-%m-%d %H:%M UTC")),
            format!("  Status:   {}", doc.analysis_status),
        ];
        if let Some(ref mime) = doc.file_type {
            lines.push(format!("  Type:     {mime}"));
        }
        if let Some(analysis) = doc.cached_analysis() {
            lines.push(String::new());
            lines.push(render_analysis(&analysis));
        }
        lines.join("\n")
    }
}

/// `brief show <id>`
pub async fn show<A: DocumentApi>(api: &A, id: &str) -> Result<DocumentDetail> {
    let registry = DocumentRegistry::new();
    Ok(DocumentDetail(registry.fetch(api, id).await?))
}

// ==================== upload ====================

#[derive(Debug, Serialize)]
pub struct Uploaded {
    pub document_id: String,
    pub filename: String,
}

impl Output for Uploaded {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Uploaded {} ({})", self.filename, self.document_id)
    }
}

/// `brief upload <path>`
///
/// With `show_progress`, the percentage is drawn on stderr while the body is
/// streamed.
pub async fn upload<A: DocumentApi>(api: &A, path: &Path, show_progress: bool) -> Result<Uploaded> {
    let file = UploadFile::from_path(path).await?;
    let mut coordinator = UploadCoordinator::new(std::time::Duration::ZERO);

    let reporter = show_progress.then(|| {
        let mut rx = coordinator.subscribe();
        let filename = file.filename.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let percent = *rx.borrow_and_update();
                eprint!("\rUploading {filename}: {percent:>3}%");
            }
            eprintln!();
        })
    });

    let event = coordinator.submit(api, file).await;
    drop(coordinator);
    if let Some(reporter) = reporter {
        let _ = reporter.await;
    }

    match event? {
        UploadEvent::Uploaded {
            document_id,
            filename,
        } => Ok(Uploaded {
            document_id,
            filename,
        }),
        UploadEvent::Failed { filename, reason } => Err(Error::Other(format!(
            "Upload of {filename} failed: {reason}"
        ))),
    }
}

// ==================== analyze ====================

#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub document_id: String,
    pub filename: String,
    /// Served from the document record without calling analyze
    pub cached: bool,
    #[serde(flatten)]
    pub analysis: AnalysisResult,
}

impl Output for AnalysisReport {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let source = if self.cached { " (cached)" } else { "" };
        format!(
            "Analysis of {}{}\n\n{}",
            self.filename,
            source,
            render_analysis(&self.analysis)
        )
    }
}

fn render_analysis(analysis: &AnalysisResult) -> String {
    let mut out = String::new();
    out.push_str("SUMMARY\n");
    out.push_str(analysis.summary.trim());
    out.push_str("\n\nKEY CLAUSES\n");
    match crate::session::clauses::clauses_view(analysis) {
        ClausesView::Structured(clauses) => {
            for (i, clause) in clauses.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, clause.clause));
                if !clause.explanation.is_empty() {
                    out.push_str(&format!("   {}\n", clause.explanation));
                }
            }
        }
        ClausesView::Degraded(text) => {
            out.push_str(text.trim());
            out.push('\n');
        }
        ClausesView::Unavailable => {
            out.push_str(crate::session::clauses::CLAUSES_UNAVAILABLE);
            out.push('\n');
        }
    }
    out.push_str("\nRISK ASSESSMENT\n");
    out.push_str(crate::session::clauses::risk_text(analysis).trim());
    out
}

/// `brief analyze <id> [--force]`
///
/// Follows the session entry rules: a completed document with a summary is
/// served from its record, a pending one is analyzed. Processing and failed
/// documents are analyzed on request since the user asked explicitly.
pub async fn analyze<A: DocumentApi>(api: &A, id: &str, force: bool) -> Result<AnalysisReport> {
    let document = api.get_document(id).await?;
    let (mut session, plan) = AnalysisSession::open(document);

    let mut cached = session.analysis().is_some();
    if plan.analyze {
        let outcome = api.analyze_document(id).await;
        session.finish_analyze(outcome)?;
        cached = false;
    } else if force || !cached {
        session.analyze(api).await?;
        cached = false;
    }

    let analysis = session
        .analysis()
        .cloned()
        .ok_or_else(|| Error::UnexpectedResponse("analysis returned no result".to_string()))?;
    Ok(AnalysisReport {
        document_id: session.document_id().to_string(),
        filename: session.document().filename.clone(),
        cached,
        analysis,
    })
}

// ==================== ask / chat ====================

#[derive(Debug, Serialize)]
pub struct Answer {
    pub document_id: String,
    pub question: String,
    pub answer: String,
}

impl Output for Answer {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Q: {}\nA: {}", self.question, self.answer)
    }
}

/// `brief ask <id> <question>`
pub async fn ask<A: DocumentApi>(api: &A, id: &str, question: &str) -> Result<Answer> {
    let document = api.get_document(id).await?;
    let (mut session, _) = AnalysisSession::open(document);

    if !session.ask(api, question).await? {
        return Err(Error::InvalidInput("Question is empty".to_string()));
    }
    let entry = session
        .transcript()
        .last()
        .ok_or_else(|| Error::Other("no answer recorded".to_string()))?;
    Ok(Answer {
        document_id: id.to_string(),
        question: entry.question.clone(),
        answer: entry.answer.clone(),
    })
}

#[derive(Debug, Serialize)]
pub struct ChatTranscript {
    pub document_id: String,
    pub entries: Vec<ChatEntry>,
}

impl Output for ChatTranscript {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No questions asked yet.".to_string();
        }
        self.entries
            .iter()
            .map(|e| {
                format!(
                    "[{}]\nQ: {}\nA: {}",
                    e.timestamp.format("%Y-%m-%d %H:%M"),
                    e.question,
                    e.answer
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// `brief chat <id>`
pub async fn chat<A: DocumentApi>(api: &A, id: &str) -> Result<ChatTranscript> {
    let entries = api.chat_history(id).await?;
    Ok(ChatTranscript {
        document_id: id.to_string(),
        entries,
    })
}

// ==================== delete ====================

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct DeleteSummary(pub BulkDeleteReport);

impl Output for DeleteSummary {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("Deleted {} document(s)", self.0.deleted.len())];
        for (id, reason) in &self.0.failed {
            lines.push(format!("  failed: {id}: {reason}"));
        }
        lines.join("\n")
    }
}

/// `brief delete <id>...`
///
/// Confirmation happens in the caller. All deletes are issued concurrently
/// and none is aborted by another's failure.
pub async fn delete<A: DocumentApi>(api: &A, ids: &[String]) -> Result<DeleteSummary> {
    if ids.is_empty() {
        return Err(Error::InvalidInput("No document ids given".to_string()));
    }
    Ok(DeleteSummary(delete_many(api, ids).await))
}

// ==================== config ====================

#[derive(Debug, Serialize)]
pub struct ConfigShow {
    pub path: PathBuf,
    #[serde(flatten)]
    pub resolved: ResolvedConfig,
}

impl Output for ConfigShow {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let r = &self.resolved;
        [
            format!("Config file: {}", self.path.display()),
            format!("  backend-url          {} ({})", r.backend_url.value, r.backend_url.source),
            format!(
                "  settle-delay-ms      {} ({})",
                r.settle_delay_ms.value, r.settle_delay_ms.source
            ),
            format!(
                "  request-timeout-secs {} ({})",
                r.request_timeout_secs.value, r.request_timeout_secs.source
            ),
            format!("  log-level            {} ({})", r.log_level.value, r.log_level.source),
        ]
        .join("\n")
    }
}

/// `brief config show`
pub fn config_show(resolved: ResolvedConfig) -> Result<ConfigShow> {
    Ok(ConfigShow {
        path: config::config_path()?,
        resolved,
    })
}

#[derive(Debug, Serialize)]
pub struct ConfigSet {
    pub key: String,
    pub value: String,
    pub path: PathBuf,
}

impl Output for ConfigSet {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Set {} = {} in {}", self.key, self.value, self.path.display())
    }
}

/// `brief config set <key> <value>`
pub fn config_set(key: &str, value: &str) -> Result<ConfigSet> {
    let mut file: BriefConfig = config::read_config()?;
    file.set(key, value)?;
    let path = config::write_config(&file)?;
    let stored = match key {
        "backend-url" => file.backend_url.unwrap_or_default(),
        "log-level" => file.log_level.unwrap_or_default(),
        _ => value.trim().to_string(),
    };
    Ok(ConfigSet {
        key: key.to_string(),
        value: stored,
        path,
    })
}
