//! Upload Coordinator - single file upload lifecycle.
//!
//! A coordinator owns at most one [`UploadTask`] at a time. Submitting a file
//! moves it from `Idle` to `Uploading`, publishes 0-100 progress on a watch
//! channel, and settles in `Done` or `Error`. After a short settle delay the
//! coordinator resets to `Idle` so the final progress value stays visible
//! before the view resets.
//!
//! Two input adapters feed the same [`UploadCoordinator::submit`]:
//! - [`UploadFile::from_path`] for a typed/picked path
//! - [`dropped_path`] for a file dragged onto the terminal (bracketed paste)

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::api::{DocumentApi, progress_percent};
use crate::{Error, Result};

/// Default delay between a terminal phase and the reset to idle.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Extensions the backend accepts, with the MIME type sent for each.
pub const ACCEPTED_TYPES: [(&str, &str); 4] = [
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("txt", "text/plain"),
];

/// Look up the MIME type for an accepted filename.
pub fn mime_type_for(filename: &str) -> Option<&'static str> {
    let ext = Path::new(filename).extension()?.to_str()?.to_lowercase();
    ACCEPTED_TYPES
        .iter()
        .find(|(accepted, _)| *accepted == ext)
        .map(|(_, mime)| *mime)
}

/// A file ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub mime_type: &'static str,
    pub contents: Vec<u8>,
}

impl UploadFile {
    /// Build from in-memory contents, validating the extension.
    pub fn new(filename: impl Into<String>, contents: Vec<u8>) -> Result<Self> {
        let filename = filename.into();
        if filename.trim().is_empty() {
            return Err(Error::InvalidInput("No file selected".to_string()));
        }
        let mime_type =
            mime_type_for(&filename).ok_or_else(|| Error::UnsupportedFile(filename.clone()))?;
        Ok(Self {
            filename,
            mime_type,
            contents,
        })
    }

    /// Read a file from disk (the picker adapter).
    ///
    /// The extension is validated before the file is read.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidInput("No file selected".to_string()))?
            .to_string();
        if mime_type_for(&filename).is_none() {
            return Err(Error::UnsupportedFile(filename));
        }
        let contents = tokio::fs::read(path).await?;
        Self::new(filename, contents)
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Whether the file has no content.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// Normalise a drag-and-drop payload into a path (the drop adapter).
///
/// Terminals paste dropped files as a path that may be quoted, carry a
/// `file://` prefix, or escape spaces with backslashes. Only the first line
/// is used. Returns `None` for blank payloads.
pub fn dropped_path(payload: &str) -> Option<PathBuf> {
    let line = payload.lines().map(str::trim).find(|l| !l.is_empty())?;
    let unquoted = line
        .strip_prefix('\'')
        .and_then(|l| l.strip_suffix('\''))
        .or_else(|| line.strip_prefix('"').and_then(|l| l.strip_suffix('"')))
        .unwrap_or(line);
    let without_scheme = unquoted.strip_prefix("file://").unwrap_or(unquoted);
    let unescaped = without_scheme.replace("\\ ", " ").replace("%20", " ");
    if unescaped.is_empty() {
        None
    } else {
        Some(PathBuf::from(unescaped))
    }
}

/// Upload lifecycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading,
    Done,
    Error,
}

impl UploadPhase {
    /// Done and Error are terminal for an attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadPhase::Done | UploadPhase::Error)
    }
}

/// The in-flight (or just-settled) upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub filename: String,
    pub size: usize,
    pub phase: UploadPhase,
}

/// What happened to a submitted file. Interpreted by the view router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// The backend stored the file
    Uploaded {
        document_id: String,
        filename: String,
    },
    /// The request failed; the attempt is over and the user must resubmit
    Failed { filename: String, reason: String },
}

/// Drives one upload at a time and publishes its progress.
#[derive(Debug)]
pub struct UploadCoordinator {
    task: Option<UploadTask>,
    progress_tx: watch::Sender<u8>,
    settle_delay: Duration,
}

impl Default for UploadCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_DELAY)
    }
}

impl UploadCoordinator {
    pub fn new(settle_delay: Duration) -> Self {
        let (progress_tx, _) = watch::channel(0);
        Self {
            task: None,
            progress_tx,
            settle_delay,
        }
    }

    /// Current phase (`Idle` when no task is held).
    pub fn phase(&self) -> UploadPhase {
        self.task.as_ref().map(|t| t.phase).unwrap_or_default()
    }

    /// The current task, if any.
    pub fn task(&self) -> Option<&UploadTask> {
        self.task.as_ref()
    }

    /// Latest published progress (0-100).
    pub fn progress(&self) -> u8 {
        *self.progress_tx.borrow()
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.progress_tx.subscribe()
    }

    /// Configured settle delay.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Start an upload: `Idle -> Uploading`, progress reset to 0.
    ///
    /// Returns the callback to hand to [`DocumentApi::upload_document`].
    /// Rejected with [`Error::Busy`] while a previous attempt has not settled.
    pub fn begin(&mut self, file: &UploadFile) -> Result<crate::api::ProgressFn> {
        if self.phase() != UploadPhase::Idle {
            return Err(Error::Busy("An upload"));
        }
        self.task = Some(UploadTask {
            filename: file.filename.clone(),
            size: file.len(),
            phase: UploadPhase::Uploading,
        });
        self.progress_tx.send_replace(0);

        let tx = self.progress_tx.clone();
        Ok(Arc::new(move |sent, total| {
            let percent = progress_percent(sent, total);
            // Never publish a value lower than what listeners already saw
            tx.send_if_modified(|current| {
                if percent > *current {
                    *current = percent;
                    true
                } else {
                    false
                }
            });
        }))
    }

    /// Record the outcome of the request and move to a terminal phase.
    pub fn finish(&mut self, outcome: Result<crate::models::UploadReceipt>) -> UploadEvent {
        let filename = self
            .task
            .as_ref()
            .map(|t| t.filename.clone())
            .unwrap_or_default();
        match outcome {
            Ok(receipt) => {
                self.set_phase(UploadPhase::Done);
                self.progress_tx.send_replace(100);
                tracing::info!(document_id = %receipt.document_id, filename = %receipt.filename, "upload complete");
                UploadEvent::Uploaded {
                    document_id: receipt.document_id,
                    filename: receipt.filename,
                }
            }
            Err(e) => {
                self.set_phase(UploadPhase::Error);
                tracing::error!(filename = %filename, error = %e, "upload failed");
                UploadEvent::Failed {
                    filename,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Reset to `Idle` once a terminal phase has settled. Discards the task.
    pub fn reset(&mut self) {
        if self.phase() == UploadPhase::Uploading {
            return;
        }
        self.task = None;
        self.progress_tx.send_replace(0);
    }

    /// Full lifecycle: begin, upload, finish, wait the settle delay, reset.
    pub async fn submit<A: DocumentApi>(&mut self, api: &A, file: UploadFile) -> Result<UploadEvent> {
        let progress = self.begin(&file)?;
        let outcome = api.upload_document(file, progress).await;
        let event = self.finish(outcome);
        tokio::time::sleep(self.settle_delay).await;
        self.reset();
        Ok(event)
    }

    fn set_phase(&mut self, phase: UploadPhase) {
        if let Some(task) = self.task.as_mut() {
            task.phase = phase;
        }
    }
}
