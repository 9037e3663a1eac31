//! Selection Controller - multi-select mode and bulk delete.
//!
//! While select mode is active, clicking a document toggles its membership in
//! the selection instead of opening it. Deleting the selection is a two-step
//! affair: [`SelectionController::request_delete`] produces a prompt, and only
//! [`SelectionController::confirm`] (or the split `take_confirmed` /
//! `finish` pair used by the TUI) issues requests.

use futures::future::join_all;

use crate::api::DocumentApi;
use crate::models::Document;
use crate::registry::{DocumentRegistry, delete_document};

/// What a click on a dashboard row means.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Select mode: the document's membership was toggled
    Toggled { id: String, selected: bool },
    /// Normal mode: open an analysis session
    Open(Document),
}

/// Pending confirmation for a bulk delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePrompt {
    pub ids: Vec<String>,
}

impl DeletePrompt {
    pub fn count(&self) -> usize {
        self.ids.len()
    }

    /// Confirmation text shown to the user.
    pub fn message(&self) -> String {
        match self.count() {
            1 => "Delete 1 selected document?".to_string(),
            n => format!("Delete {n} selected documents?"),
        }
    }
}

/// Outcome of a confirmed bulk delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BulkDeleteReport {
    /// Ids the backend removed (or already did not know)
    pub deleted: Vec<String>,
    /// Ids whose delete failed, with the reason
    pub failed: Vec<(String, String)>,
}

impl BulkDeleteReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SelectionController {
    active: bool,
    /// Selected ids in click order
    selected: Vec<String>,
    pending: Option<DeletePrompt>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// The outstanding confirmation, if one was requested.
    pub fn pending(&self) -> Option<&DeletePrompt> {
        self.pending.as_ref()
    }

    /// Flip select mode. The selection is cleared either way.
    pub fn toggle_mode(&mut self) {
        self.active = !self.active;
        self.selected.clear();
        self.pending = None;
    }

    /// Leave select mode, clearing the selection.
    pub fn exit(&mut self) {
        self.active = false;
        self.selected.clear();
        self.pending = None;
    }

    /// Handle a click on `document`.
    pub fn click(&mut self, document: &Document) -> ClickOutcome {
        if !self.active {
            return ClickOutcome::Open(document.clone());
        }
        let selected = match self.selected.iter().position(|s| *s == document.id) {
            Some(idx) => {
                self.selected.remove(idx);
                false
            }
            None => {
                self.selected.push(document.id.clone());
                true
            }
        };
        ClickOutcome::Toggled {
            id: document.id.clone(),
            selected,
        }
    }

    /// Ask for confirmation. Returns `None` (and does nothing) when select
    /// mode is off or nothing is selected.
    pub fn request_delete(&mut self) -> Option<&DeletePrompt> {
        if !self.active || self.selected.is_empty() {
            return None;
        }
        self.pending = Some(DeletePrompt {
            ids: self.selected.clone(),
        });
        self.pending.as_ref()
    }

    /// Abort a pending confirmation. The selection is kept.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Consume the pending confirmation, returning the ids to delete.
    pub fn take_confirmed(&mut self) -> Option<Vec<String>> {
        self.pending.take().map(|p| p.ids)
    }

    /// Wrap up after the deletes settled: clear and leave select mode.
    pub fn finish(&mut self, report: &BulkDeleteReport) {
        if report.has_failures() {
            tracing::warn!(
                deleted = report.deleted.len(),
                failed = report.failed.len(),
                "bulk delete finished with failures"
            );
        } else {
            tracing::info!(deleted = report.deleted.len(), "bulk delete finished");
        }
        self.exit();
    }

    /// Run a confirmed delete end to end, including the single reload.
    ///
    /// Returns `None` when no confirmation was pending. A failed reload is
    /// logged by the registry and otherwise ignored.
    pub async fn confirm<A: DocumentApi>(
        &mut self,
        api: &A,
        registry: &mut DocumentRegistry,
    ) -> Option<BulkDeleteReport> {
        let ids = self.take_confirmed()?;
        let report = delete_many(api, &ids).await;
        self.finish(&report);
        let _ = registry.reload(api).await;
        Some(report)
    }
}

/// Delete every id concurrently and wait for all outcomes.
///
/// Per-id failures are collected; they never abort the other deletes.
pub async fn delete_many<A: DocumentApi>(api: &A, ids: &[String]) -> BulkDeleteReport {
    let outcomes = join_all(ids.iter().map(|id| delete_document(api, id))).await;

    let mut report = BulkDeleteReport::default();
    for (id, outcome) in ids.iter().zip(outcomes) {
        match outcome {
            Ok(_) => report.deleted.push(id.clone()),
            Err(e) => report.failed.push((id.clone(), e.to_string())),
        }
    }
    report
}
