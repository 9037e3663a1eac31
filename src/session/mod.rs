//! Analysis Session - per-document analysis and Q&A controller.
//!
//! A session is bound to exactly one [`Document`] and moves through
//! `Idle -> Analyzing -> {Ready, Failed}`. Every network interaction is split
//! into a `begin_*` step (guards and state change) and a `finish_*` step
//! (apply the outcome), so an event loop can run the request elsewhere and
//! feed the result back. The async helpers (`analyze`, `ask`, ...) chain both
//! steps for sequential callers.
//!
//! The chat transcript loads independently of analysis; a failure there is
//! logged and leaves the transcript empty.

pub mod clauses;

use std::fmt;

use crate::api::DocumentApi;
use crate::models::{AnalysisResult, AnalysisStatus, ChatEntry, Document};
use crate::{Error, Result};

pub use clauses::{ClausesView, degraded_clause_extract};

/// Result tabs of the analysis view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Summary,
    Clauses,
    Risks,
    Qa,
}

impl Tab {
    /// All tabs in display order.
    pub const ALL: [Tab; 4] = [Tab::Summary, Tab::Clauses, Tab::Risks, Tab::Qa];

    /// Tab label.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Summary => "Summary",
            Tab::Clauses => "Key Clauses",
            Tab::Risks => "Risk Assessment",
            Tab::Qa => "Ask Questions",
        }
    }

    /// Next tab, wrapping around.
    pub fn next(&self) -> Tab {
        let idx = Tab::ALL.iter().position(|t| t == self).unwrap_or(0);
        Tab::ALL[(idx + 1) % Tab::ALL.len()]
    }

    /// Previous tab, wrapping around.
    pub fn previous(&self) -> Tab {
        let idx = Tab::ALL.iter().position(|t| t == self).unwrap_or(0);
        Tab::ALL[(idx + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// Main analysis state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing in flight and no result (processing/failed documents land here)
    #[default]
    Idle,
    Analyzing,
    Ready,
    /// The last analyze request failed; analysis can be retried
    Failed(String),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Analyzing => write!(f, "analyzing"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Failed(_) => write!(f, "failed"),
        }
    }
}

/// Requests the caller must issue right after opening a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPlan {
    /// Issue the analyze request (session is already `Analyzing`)
    pub analyze: bool,
    /// Load the chat transcript (always true)
    pub load_chat: bool,
}

/// State and requests needed to present one document's analysis and chat.
#[derive(Debug)]
pub struct AnalysisSession {
    document: Document,
    state: SessionState,
    analysis: Option<AnalysisResult>,
    tab: Tab,
    transcript: Vec<ChatEntry>,
    /// Question input buffer
    question: String,
    /// Single-flight guard for `ask`
    asking: bool,
}

impl AnalysisSession {
    /// Bind a session to `document` and decide what to request on entry.
    ///
    /// - completed with a summary: `Ready` from the cached fields, no request
    /// - pending: `Analyzing`, analyze request required
    /// - processing / failed: `Idle`, shown as-is, no automatic retry
    pub fn open(document: Document) -> (Self, EntryPlan) {
        let mut session = Self {
            state: SessionState::Idle,
            analysis: None,
            tab: Tab::Summary,
            transcript: Vec::new(),
            question: String::new(),
            asking: false,
            document,
        };

        let mut analyze = false;
        if let Some(cached) = session.document.cached_analysis() {
            session.analysis = Some(cached);
            session.state = SessionState::Ready;
        } else if session.document.analysis_status == AnalysisStatus::Pending {
            session.state = SessionState::Analyzing;
            analyze = true;
        }

        tracing::debug!(
            document_id = %session.document.id,
            state = %session.state,
            "analysis session opened"
        );
        (
            session,
            EntryPlan {
                analyze,
                load_chat: true,
            },
        )
    }

    /// Open a session and run its entry requests.
    ///
    /// The analyze request and the chat load run concurrently; their
    /// outcomes are applied once both are back. An analysis failure leaves
    /// the session in `Failed` rather than returning an error.
    pub async fn enter<A: DocumentApi>(api: &A, document: Document) -> Self {
        let (mut session, plan) = Self::open(document);
        let id = session.document.id.clone();

        let analysis = async {
            if plan.analyze {
                Some(api.analyze_document(&id).await)
            } else {
                None
            }
        };
        let (analysis, history) = tokio::join!(analysis, api.chat_history(&id));

        if let Some(outcome) = analysis {
            // A failure is recorded in the session state
            session.finish_analyze(outcome).ok();
        }
        session.finish_chat_history(history);
        session
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_id(&self) -> &str {
        &self.document.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The analysis to display, if any.
    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.state == SessionState::Analyzing
    }

    /// Note shown for documents whose server status is not actionable here.
    pub fn status_notice(&self) -> Option<&'static str> {
        if self.analysis.is_some() || self.state != SessionState::Idle {
            return None;
        }
        match self.document.analysis_status {
            AnalysisStatus::Processing => Some("Analysis is in progress on the server."),
            AnalysisStatus::Failed => Some("The previous analysis of this document failed."),
            _ => None,
        }
    }

    // --- analysis ---

    /// Enter `Analyzing`. Rejected while an analysis is already running.
    pub fn begin_analyze(&mut self) -> Result<()> {
        if self.state == SessionState::Analyzing {
            return Err(Error::Busy("Analysis"));
        }
        self.state = SessionState::Analyzing;
        Ok(())
    }

    /// Apply the analyze outcome.
    ///
    /// Success stores the result and resets the tab to `Summary`. Failure
    /// keeps any previous result and returns the error for notification.
    pub fn finish_analyze(&mut self, outcome: Result<AnalysisResult>) -> Result<()> {
        match outcome {
            Ok(result) => {
                self.analysis = Some(result);
                self.state = SessionState::Ready;
                self.tab = Tab::Summary;
                Ok(())
            }
            Err(e) => {
                tracing::error!(document_id = %self.document.id, error = %e, "analysis failed");
                self.state = SessionState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// (Re)run analysis. Idempotently re-invocable after a failure.
    pub async fn analyze<A: DocumentApi>(&mut self, api: &A) -> Result<()> {
        self.begin_analyze()?;
        let outcome = api.analyze_document(&self.document.id).await;
        self.finish_analyze(outcome)
    }

    // --- chat transcript ---

    pub fn transcript(&self) -> &[ChatEntry] {
        &self.transcript
    }

    /// Apply the loaded chat history.
    ///
    /// Entries appended locally before the history arrived are kept after
    /// the server's entries unless the server already has them.
    pub fn finish_chat_history(&mut self, outcome: Result<Vec<ChatEntry>>) {
        match outcome {
            Ok(mut history) => {
                let local = std::mem::take(&mut self.transcript);
                for entry in local {
                    let known = history
                        .iter()
                        .any(|h| h.question == entry.question && h.answer == entry.answer);
                    if !known {
                        history.push(entry);
                    }
                }
                self.transcript = history;
            }
            Err(e) => {
                tracing::warn!(document_id = %self.document.id, error = %e, "failed to load chat history");
            }
        }
    }

    /// Load the transcript from the backend.
    pub async fn load_chat_history<A: DocumentApi>(&mut self, api: &A) {
        let outcome = api.chat_history(&self.document.id).await;
        self.finish_chat_history(outcome);
    }

    // --- questions ---

    /// Current contents of the question input.
    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn set_question(&mut self, text: impl Into<String>) {
        self.question = text.into();
    }

    pub fn push_char(&mut self, c: char) {
        self.question.push(c);
    }

    pub fn pop_char(&mut self) {
        self.question.pop();
    }

    pub fn is_asking(&self) -> bool {
        self.asking
    }

    /// Whether a question could be submitted right now.
    pub fn can_ask(&self) -> bool {
        !self.asking && !self.question.trim().is_empty()
    }

    /// Claim the single-flight slot for the current input.
    ///
    /// Returns `Ok(None)` for a blank question (a no-op, not an error) and
    /// [`Error::Busy`] while another question is in flight.
    pub fn begin_ask(&mut self) -> Result<Option<String>> {
        if self.asking {
            return Err(Error::Busy("A question"));
        }
        if self.question.trim().is_empty() {
            return Ok(None);
        }
        self.asking = true;
        Ok(Some(self.question.clone()))
    }

    /// Apply an answer. Success appends to the transcript and clears the
    /// input; failure keeps the input so the user can retry.
    pub fn finish_ask(&mut self, question: String, outcome: Result<String>) -> Result<()> {
        self.asking = false;
        match outcome {
            Ok(answer) => {
                self.transcript.push(ChatEntry::now(question, answer));
                self.question.clear();
                Ok(())
            }
            Err(e) => {
                tracing::error!(document_id = %self.document.id, error = %e, "question failed");
                Err(e)
            }
        }
    }

    /// Submit the current input. Returns `false` if nothing was sent.
    pub async fn submit_question<A: DocumentApi>(&mut self, api: &A) -> Result<bool> {
        let Some(question) = self.begin_ask()? else {
            return Ok(false);
        };
        let outcome = api.ask(&self.document.id, &question).await;
        self.finish_ask(question, outcome)?;
        Ok(true)
    }

    /// Put `question` in the input and submit it.
    pub async fn ask<A: DocumentApi>(&mut self, api: &A, question: &str) -> Result<bool> {
        if self.asking {
            return Err(Error::Busy("A question"));
        }
        self.set_question(question);
        self.submit_question(api).await
    }

    // --- tabs ---

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn next_tab(&mut self) {
        self.tab = self.tab.next();
    }

    pub fn previous_tab(&mut self) {
        self.tab = self.tab.previous();
    }

    /// Clauses tab content, if an analysis is available.
    pub fn clauses_view(&self) -> Option<ClausesView<'_>> {
        self.analysis.as_ref().map(clauses::clauses_view)
    }

    /// Risk tab text, if an analysis is available.
    pub fn risk_text(&self) -> Option<&str> {
        self.analysis.as_ref().map(clauses::risk_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeApi;

    fn document(api: &FakeApi, id: &str) -> Document {
        api.with(|s| s.documents.iter().find(|d| d.id == id).cloned().unwrap())
    }

    #[test]
    fn test_tab_cycle() {
        assert_eq!(Tab::Summary.next(), Tab::Clauses);
        assert_eq!(Tab::Qa.next(), Tab::Summary);
        assert_eq!(Tab::Summary.previous(), Tab::Qa);
        assert_eq!(Tab::Risks.previous(), Tab::Clauses);
    }

    #[tokio::test]
    async fn test_completed_document_never_calls_analyze() {
        let api = FakeApi::new();
        let id = api.insert("lease.pdf", AnalysisStatus::Completed, Some("Cached summary"));

        let session = AnalysisSession::enter(&api, document(&api, &id)).await;

        assert_eq!(session.state(), &SessionState::Ready);
        assert_eq!(session.analysis().unwrap().summary, "Cached summary");
        assert_eq!(api.with(|s| s.analyze_calls), 0);
        assert_eq!(api.with(|s| s.chat_calls), 1);
    }

    #[tokio::test]
    async fn test_completed_without_summary_is_not_a_cache_hit() {
        let api = FakeApi::new();
        let id = api.insert("lease.pdf", AnalysisStatus::Completed, None);

        let (session, plan) = AnalysisSession::open(document(&api, &id));
        assert!(!plan.analyze);
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(session.analysis().is_none());
    }

    #[tokio::test]
    async fn test_pending_document_auto_analyzes() {
        let api = FakeApi::with_documents(&["contract.pdf"]);
        let doc = api.with(|s| s.documents[0].clone());

        let (session, plan) = AnalysisSession::open(doc.clone());
        assert!(plan.analyze);
        assert!(session.is_analyzing());

        let mut session = AnalysisSession::enter(&api, doc).await;
        assert_eq!(session.state(), &SessionState::Ready);
        assert!(!session.analysis().unwrap().summary.is_empty());
        assert_eq!(session.tab(), Tab::Summary);
        assert_eq!(api.with(|s| s.analyze_calls), 1);

        session.set_tab(Tab::Risks);
        session.analyze(&api).await.unwrap();
        assert_eq!(session.tab(), Tab::Summary);
    }

    #[tokio::test]
    async fn test_processing_and_failed_are_surfaced_without_retry() {
        let api = FakeApi::new();
        let processing = api.insert("a.pdf", AnalysisStatus::Processing, None);
        let failed = api.insert("b.pdf", AnalysisStatus::Failed, None);

        let session = AnalysisSession::enter(&api, document(&api, &processing)).await;
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(session.status_notice().unwrap().contains("in progress"));

        let session = AnalysisSession::enter(&api, document(&api, &failed)).await;
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(session.status_notice().unwrap().contains("failed"));

        assert_eq!(api.with(|s| s.analyze_calls), 0);
    }

    #[tokio::test]
    async fn test_analysis_failure_then_retry() {
        let api = FakeApi::with_documents(&["contract.pdf"]);
        api.with(|s| s.fail_analyze = true);
        let doc = api.with(|s| s.documents[0].clone());

        let mut session = AnalysisSession::enter(&api, doc).await;
        assert!(matches!(session.state(), SessionState::Failed(_)));
        assert!(session.analysis().is_none());

        api.with(|s| s.fail_analyze = false);
        session.analyze(&api).await.unwrap();
        assert_eq!(session.state(), &SessionState::Ready);
        assert_eq!(api.with(|s| s.analyze_calls), 2);
    }

    #[test]
    fn test_analyze_is_single_flight() {
        let api = FakeApi::with_documents(&["contract.pdf"]);
        let doc = api.with(|s| s.documents[0].clone());
        let (mut session, _) = AnalysisSession::open(doc);
        assert!(matches!(session.begin_analyze(), Err(Error::Busy(_))));
    }

    #[tokio::test]
    async fn test_chat_history_failure_leaves_empty_transcript() {
        let api = FakeApi::new();
        let id = api.insert("a.pdf", AnalysisStatus::Completed, Some("S"));
        api.with(|s| s.fail_chat = true);

        let session = AnalysisSession::enter(&api, document(&api, &id)).await;
        assert!(session.transcript().is_empty());
        assert_eq!(session.state(), &SessionState::Ready);
    }

    #[tokio::test]
    async fn test_chat_history_is_loaded_on_entry() {
        let api = FakeApi::new();
        let id = api.insert("a.pdf", AnalysisStatus::Completed, Some("S"));
        api.with(|s| {
            s.chats.insert(
                id.clone(),
                vec![ChatEntry::now("Q1", "A1"), ChatEntry::now("Q2", "A2")],
            );
        });

        let session = AnalysisSession::enter(&api, document(&api, &id)).await;
        let questions: Vec<_> = session.transcript().iter().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, ["Q1", "Q2"]);
    }

    #[tokio::test]
    async fn test_load_chat_history_refreshes_transcript() {
        let api = FakeApi::new();
        let id = api.insert("a.pdf", AnalysisStatus::Completed, Some("S"));
        let (mut session, _) = AnalysisSession::open(document(&api, &id));

        session.load_chat_history(&api).await;
        assert!(session.transcript().is_empty());

        // Another client asked in the meantime
        api.with(|s| s.chats.insert(id.clone(), vec![ChatEntry::now("Elsewhere?", "Yes")]));
        session.load_chat_history(&api).await;
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].question, "Elsewhere?");

        // A failed refresh keeps what is already shown
        api.with(|s| s.fail_chat = true);
        session.load_chat_history(&api).await;
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(api.with(|s| s.chat_calls), 3);
    }

    #[test]
    fn test_history_arriving_after_local_answer_keeps_both() {
        let api = FakeApi::new();
        let id = api.insert("a.pdf", AnalysisStatus::Completed, Some("S"));
        let (mut session, _) = AnalysisSession::open(document(&api, &id));

        session.set_question("Local?");
        let question = session.begin_ask().unwrap().unwrap();
        session.finish_ask(question, Ok("Yes".to_string())).unwrap();

        session.finish_chat_history(Ok(vec![ChatEntry::now("Old?", "Old")]));
        let questions: Vec<_> = session.transcript().iter().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, ["Old?", "Local?"]);

        // Server already persisted the local entry: no duplicate
        session.finish_chat_history(Ok(vec![
            ChatEntry::now("Old?", "Old"),
            ChatEntry::now("Local?", "Yes"),
        ]));
        assert_eq!(session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_questions_are_noops() {
        let api = FakeApi::new();
        let id = api.insert("a.pdf", AnalysisStatus::Completed, Some("S"));
        let (mut session, _) = AnalysisSession::open(document(&api, &id));

        assert!(!session.ask(&api, "").await.unwrap());
        assert!(!session.ask(&api, "   ").await.unwrap());
        assert_eq!(api.with(|s| s.ask_calls), 0);
        assert!(session.transcript().is_empty());
        assert!(!session.is_asking());
    }

    #[tokio::test]
    async fn test_two_sequential_asks_in_order() {
        let api = FakeApi::new();
        let id = api.insert("a.pdf", AnalysisStatus::Completed, Some("S"));
        let (mut session, _) = AnalysisSession::open(document(&api, &id));

        assert!(session.ask(&api, "First?").await.unwrap());
        assert!(session.ask(&api, "Second?").await.unwrap());

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].question, "First?");
        assert_eq!(transcript[0].answer, "Answer to: First?");
        assert_eq!(transcript[1].question, "Second?");
        assert_eq!(session.question(), "");
    }

    #[test]
    fn test_ask_is_single_flight() {
        let api = FakeApi::new();
        let id = api.insert("a.pdf", AnalysisStatus::Completed, Some("S"));
        let (mut session, _) = AnalysisSession::open(document(&api, &id));

        session.set_question("First?");
        let first = session.begin_ask().unwrap();
        assert!(first.is_some());
        assert!(session.is_asking());
        assert!(!session.can_ask());

        session.set_question("Second?");
        assert!(matches!(session.begin_ask(), Err(Error::Busy(_))));

        session.finish_ask(first.unwrap(), Ok("A".to_string())).unwrap();
        assert!(!session.is_asking());
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_ask_preserves_input() {
        let api = FakeApi::new();
        let id = api.insert("a.pdf", AnalysisStatus::Completed, Some("S"));
        api.with(|s| s.fail_ask = true);
        let (mut session, _) = AnalysisSession::open(document(&api, &id));

        let result = session.ask(&api, "Who pays rent?").await;
        assert!(result.is_err());
        assert_eq!(session.question(), "Who pays rent?");
        assert!(session.transcript().is_empty());
        assert!(!session.is_asking());
    }

    #[test]
    fn test_question_editing() {
        let api = FakeApi::new();
        let id = api.insert("a.pdf", AnalysisStatus::Completed, Some("S"));
        let (mut session, _) = AnalysisSession::open(document(&api, &id));

        for c in "Hi?".chars() {
            session.push_char(c);
        }
        session.pop_char();
        assert_eq!(session.question(), "Hi");
    }

    #[test]
    fn test_clause_and_risk_views_need_analysis() {
        let api = FakeApi::with_documents(&["a.pdf"]);
        let (session, _) = AnalysisSession::open(api.with(|s| s.documents[0].clone()));
        assert!(session.clauses_view().is_none());
        assert!(session.risk_text().is_none());
    }
}
