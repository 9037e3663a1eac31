//! TUI Application - main event loop and terminal management
//!
//! This module contains the core TUI application logic including:
//! - Terminal setup and restoration
//! - Event loop for keyboard, paste and request completions
//! - Dispatching user intents to the document-lifecycle components
//!
//! A single task owns all state. Network requests run on spawned tasks and
//! report back through an unbounded channel as [`Completion`] values, so the
//! UI keeps drawing while requests are in flight.

use std::future::Future;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    ExecutableCommand,
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tokio::sync::mpsc;

use super::notifications::NotificationManager;
use super::views::{AnalysisView, DashboardView, UploadView};
use crate::api::DocumentApi;
use crate::models::{AnalysisResult, ChatEntry, Document, UploadReceipt};
use crate::registry::{DeleteOutcome, DocumentRegistry, delete_document};
use crate::router::{Command, RouteContext, Router, RouterEvent, View};
use crate::selection::{BulkDeleteReport, ClickOutcome, SelectionController, delete_many};
use crate::session::{AnalysisSession, Tab};
use crate::upload::{UploadCoordinator, UploadEvent, UploadFile, UploadPhase, dropped_path};
use crate::{Error, Result};

/// Outcome of a spawned request, delivered back to the event loop.
#[derive(Debug)]
pub enum Completion {
    Reloaded(Result<Vec<Document>>),
    FileRead(Result<UploadFile>),
    Uploaded(Result<UploadReceipt>),
    /// The settle delay after a terminal upload phase elapsed
    UploadSettled,
    Analyzed {
        session: SessionTag,
        outcome: Result<AnalysisResult>,
    },
    ChatLoaded {
        session: SessionTag,
        outcome: Result<Vec<ChatEntry>>,
    },
    Answered {
        session: SessionTag,
        question: String,
        outcome: Result<String>,
    },
    Deleted {
        filename: String,
        outcome: Result<DeleteOutcome>,
    },
    BulkDeleted(BulkDeleteReport),
}

/// Identifies the session a request was issued for.
///
/// `epoch` changes every time a session is opened, so reopening the same
/// document does not accept answers meant for the earlier session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTag {
    pub document_id: String,
    pub epoch: u64,
}

/// A modal yes/no prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    DeleteOne { id: String, filename: String },
    DeleteSelected { count: usize },
}

impl Confirm {
    fn message(&self) -> String {
        match self {
            Confirm::DeleteOne { filename, .. } => {
                format!("Are you sure you want to delete {filename}?")
            }
            Confirm::DeleteSelected { count: 1 } => "Delete 1 selected document?".to_string(),
            Confirm::DeleteSelected { count } => format!("Delete {count} selected documents?"),
        }
    }
}

/// TUI Application state
pub struct App<A> {
    api: A,
    registry: DocumentRegistry,
    router: Router,
    selection: SelectionController,
    uploader: UploadCoordinator,
    /// Upload outcome held until the settle delay elapses
    settled_event: Option<UploadEvent>,
    upload_view: UploadView,
    dashboard: DashboardView,
    analysis_view: AnalysisView,
    notifications: NotificationManager,
    confirm: Option<Confirm>,
    /// Bumped each time a session is opened
    session_epoch: u64,
    tx: mpsc::UnboundedSender<Completion>,
    /// Spawned requests whose completion has not been applied yet
    in_flight: usize,
    should_quit: bool,
}

impl<A: DocumentApi + Clone + 'static> App<A> {
    /// Create the application and the receiving end of its completion channel.
    pub fn new(api: A, settle_delay: Duration) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Self {
            api,
            registry: DocumentRegistry::new(),
            router: Router::new(View::Upload),
            selection: SelectionController::new(),
            uploader: UploadCoordinator::new(settle_delay),
            settled_event: None,
            upload_view: UploadView::new(),
            dashboard: DashboardView::new(),
            analysis_view: AnalysisView::new(),
            notifications: NotificationManager::new(),
            confirm: None,
            session_epoch: 0,
            tx,
            in_flight: 0,
            should_quit: false,
        };
        (app, rx)
    }

    /// Load the document list and pick the starting view.
    pub async fn initialize(&mut self) {
        if let Err(e) = self.registry.reload(&self.api).await {
            self.notifications.failed("load documents", &e);
        }
        self.router.reset(self.registry.initial_view());
    }

    pub fn view(&self) -> &View {
        self.router.view()
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn uploader(&self) -> &UploadCoordinator {
        &self.uploader
    }

    pub fn notifications(&self) -> &NotificationManager {
        &self.notifications
    }

    pub fn confirm(&self) -> Option<&Confirm> {
        self.confirm.as_ref()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(task.await);
        });
    }

    fn route_context(&self) -> RouteContext {
        RouteContext {
            select_mode: self.selection.is_active(),
            has_documents: !self.registry.is_empty(),
            uploading: self.uploader.phase() != UploadPhase::Idle,
        }
    }

    fn dispatch(&mut self, event: RouterEvent) {
        let commands = self.router.dispatch(event, self.route_context());
        for command in commands {
            self.run_command(command);
        }
    }

    fn run_command(&mut self, command: Command) {
        match command {
            Command::ReloadRegistry => self.spawn_reload(),
            Command::StartSession { document_id, plan } => {
                self.analysis_view.reset();
                self.session_epoch += 1;
                if plan.analyze {
                    self.spawn_analyze(document_id.clone());
                }
                if plan.load_chat {
                    let api = self.api.clone();
                    let session = self.session_tag(document_id);
                    self.spawn(async move {
                        let outcome = api.chat_history(&session.document_id).await;
                        Completion::ChatLoaded { session, outcome }
                    });
                }
            }
        }
    }

    fn spawn_reload(&mut self) {
        let api = self.api.clone();
        self.spawn(async move { Completion::Reloaded(api.list_documents().await) });
    }

    fn session_tag(&self, document_id: String) -> SessionTag {
        SessionTag {
            document_id,
            epoch: self.session_epoch,
        }
    }

    fn spawn_analyze(&mut self, document_id: String) {
        let api = self.api.clone();
        let session = self.session_tag(document_id);
        self.spawn(async move {
            let outcome = api.analyze_document(&session.document_id).await;
            Completion::Analyzed { session, outcome }
        });
    }

    // ==================== input ====================

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.confirm.is_some() {
            self.handle_confirm_key(key.code);
            return;
        }

        match self.router.view() {
            View::Upload => self.handle_upload_key(key.code),
            View::Dashboard => self.handle_dashboard_key(key.code),
            View::Analysis(_) => self.handle_analysis_key(key.code),
        }
    }

    /// Handle a bracketed paste. Only the upload view accepts it, as a
    /// dropped file; other views swallow it.
    pub fn handle_paste(&mut self, text: &str) {
        if !matches!(self.router.view(), View::Upload) || self.confirm.is_some() {
            tracing::debug!("paste ignored outside the upload view");
            return;
        }
        match dropped_path(text) {
            Some(path) => self.submit_path(path),
            None => self.notifications.warning("Nothing to upload in the dropped text"),
        }
    }

    fn handle_confirm_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let Some(confirm) = self.confirm.take() else {
                    return;
                };
                match confirm {
                    Confirm::DeleteOne { id, filename } => {
                        let api = self.api.clone();
                        self.spawn(async move {
                            let outcome = delete_document(&api, &id).await;
                            Completion::Deleted { filename, outcome }
                        });
                    }
                    Confirm::DeleteSelected { .. } => {
                        if let Some(ids) = self.selection.take_confirmed() {
                            let api = self.api.clone();
                            self.spawn(async move {
                                Completion::BulkDeleted(delete_many(&api, &ids).await)
                            });
                        }
                    }
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                if matches!(self.confirm.take(), Some(Confirm::DeleteSelected { .. })) {
                    self.selection.cancel();
                }
            }
            _ => {}
        }
    }

    fn handle_upload_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                let ctx = self.route_context();
                if ctx.uploading {
                    self.notifications.warning("Wait for the upload to finish");
                } else if ctx.has_documents {
                    self.dispatch(RouterEvent::Cancel);
                }
            }
            KeyCode::Enter => {
                let input = self.upload_view.take_input();
                match dropped_path(&input) {
                    Some(path) => self.submit_path(path),
                    None => self
                        .notifications
                        .warning(Error::InvalidInput("No file selected".to_string()).to_string()),
                }
            }
            KeyCode::Backspace => self.upload_view.pop(),
            KeyCode::Char(c) => self.upload_view.push(c),
            _ => {}
        }
    }

    fn handle_dashboard_key(&mut self, code: KeyCode) {
        let len = self.dashboard.visible(&self.registry).len();

        if self.dashboard.searching {
            match code {
                KeyCode::Esc => self.dashboard.end_search(true),
                KeyCode::Enter => self.dashboard.end_search(false),
                KeyCode::Backspace => self.dashboard.pop_search(),
                KeyCode::Char(c) => self.dashboard.push_search(c),
                _ => {}
            }
            return;
        }

        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.dashboard.select_next(len),
            KeyCode::Char('k') | KeyCode::Up => self.dashboard.select_previous(),
            KeyCode::Home => self.dashboard.select_first(),
            KeyCode::End => self.dashboard.select_last(len),
            KeyCode::Char('/') => self.dashboard.start_search(),
            KeyCode::Char('r') => self.spawn_reload(),
            KeyCode::Char('u') => {
                if self.selection.is_active() {
                    self.selection.exit();
                }
                self.dispatch(RouterEvent::UploadNew);
            }
            KeyCode::Char('s') => self.selection.toggle_mode(),
            KeyCode::Esc if self.selection.is_active() => self.selection.exit(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let Some(document) = self.dashboard.selected_document(&self.registry).cloned()
                else {
                    return;
                };
                if let ClickOutcome::Open(document) = self.selection.click(&document) {
                    self.dispatch(RouterEvent::SelectDocument(document));
                }
            }
            KeyCode::Char('D') => {
                if let Some(prompt) = self.selection.request_delete() {
                    self.confirm = Some(Confirm::DeleteSelected {
                        count: prompt.count(),
                    });
                } else if self.selection.is_active() {
                    self.notifications.info("No documents selected");
                } else {
                    self.notifications.info("Press s to select documents first");
                }
            }
            KeyCode::Char('d') if !self.selection.is_active() => {
                if let Some(doc) = self.dashboard.selected_document(&self.registry) {
                    self.confirm = Some(Confirm::DeleteOne {
                        id: doc.id.clone(),
                        filename: doc.filename.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    fn handle_analysis_key(&mut self, code: KeyCode) {
        let editing = self.analysis_view.editing;
        let Some(session) = self.router.view_mut().session_mut() else {
            return;
        };

        if editing {
            match code {
                KeyCode::Esc => self.analysis_view.editing = false,
                KeyCode::Enter => self.submit_question(),
                KeyCode::Backspace => session.pop_char(),
                KeyCode::Char(c) => session.push_char(c),
                _ => {}
            }
            return;
        }

        match code {
            KeyCode::Esc | KeyCode::Char('b') => {
                self.analysis_view.reset();
                self.dispatch(RouterEvent::Back);
            }
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => {
                session.next_tab();
                self.analysis_view.scroll = 0;
            }
            KeyCode::BackTab => {
                session.previous_tab();
                self.analysis_view.scroll = 0;
            }
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                session.set_tab(Tab::ALL[idx]);
                self.analysis_view.scroll = 0;
            }
            KeyCode::Char('j') | KeyCode::Down => self.analysis_view.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.analysis_view.scroll_up(),
            KeyCode::Char('a') => match session.begin_analyze() {
                Ok(()) => {
                    let id = session.document_id().to_string();
                    self.spawn_analyze(id);
                }
                Err(e) => self.notifications.warning(e.to_string()),
            },
            KeyCode::Char('i') => {
                session.set_tab(Tab::Qa);
                self.analysis_view.editing = true;
            }
            KeyCode::Enter if session.tab() == Tab::Qa => self.submit_question(),
            _ => {}
        }
    }

    fn submit_question(&mut self) {
        let Some(session) = self.router.view_mut().session_mut() else {
            return;
        };
        match session.begin_ask() {
            Ok(Some(question)) => {
                let document_id = session.document_id().to_string();
                let api = self.api.clone();
                let session = self.session_tag(document_id);
                self.spawn(async move {
                    let outcome = api.ask(&session.document_id, &question).await;
                    Completion::Answered {
                        session,
                        question,
                        outcome,
                    }
                });
            }
            Ok(None) => {}
            Err(e) => self.notifications.warning(e.to_string()),
        }
    }

    fn submit_path(&mut self, path: PathBuf) {
        if self.uploader.phase() != UploadPhase::Idle {
            self.notifications
                .warning(Error::Busy("An upload").to_string());
            return;
        }
        self.upload_view.input = path.display().to_string();
        self.spawn(async move { Completion::FileRead(UploadFile::from_path(&path).await) });
    }

    // ==================== completions ====================

    /// Apply the outcome of a spawned request.
    pub fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match completion {
            // Leaving the analysis view reloads again, so a list that lands
            // while a session is open is dropped
            Completion::Reloaded(Ok(_)) if self.router.view().session().is_some() => {
                tracing::debug!("discarding document list while a session is open");
            }
            Completion::Reloaded(Ok(documents)) => {
                self.registry.replace(documents);
                let len = self.dashboard.visible(&self.registry).len();
                self.dashboard.clamp(len);
            }
            Completion::Reloaded(Err(e)) => {
                tracing::error!(error = %e, "failed to load documents");
                self.notifications.failed("load documents", &e);
            }
            Completion::FileRead(Ok(file)) => match self.uploader.begin(&file) {
                Ok(progress) => {
                    let api = self.api.clone();
                    self.spawn(async move {
                        Completion::Uploaded(api.upload_document(file, progress).await)
                    });
                }
                Err(e) => self.notifications.warning(e.to_string()),
            },
            Completion::FileRead(Err(e)) => {
                self.upload_view.input.clear();
                if e.is_validation() {
                    self.notifications.warning(e.to_string());
                } else {
                    self.notifications.failed("read file", &e);
                }
            }
            Completion::Uploaded(outcome) => {
                let event = self.uploader.finish(outcome);
                match &event {
                    UploadEvent::Uploaded { filename, .. } => {
                        self.notifications.success(format!("Uploaded {filename}"));
                    }
                    UploadEvent::Failed { reason, .. } => {
                        self.notifications.error(format!("Failed to upload file: {reason}"));
                    }
                }
                self.settled_event = Some(event);
                let delay = self.uploader.settle_delay();
                self.spawn(async move {
                    tokio::time::sleep(delay).await;
                    Completion::UploadSettled
                });
            }
            Completion::UploadSettled => {
                self.uploader.reset();
                self.upload_view.input.clear();
                if let Some(UploadEvent::Uploaded { document_id, .. }) = self.settled_event.take() {
                    self.dispatch(RouterEvent::UploadSucceeded { document_id });
                }
            }
            Completion::Analyzed { session, outcome } => {
                let Some(session) = self.open_session(&session) else {
                    return;
                };
                if let Err(e) = session.finish_analyze(outcome) {
                    self.notifications.failed("analyze document", &e);
                }
            }
            Completion::ChatLoaded { session, outcome } => {
                if let Some(session) = self.open_session(&session) {
                    session.finish_chat_history(outcome);
                }
            }
            Completion::Answered {
                session,
                question,
                outcome,
            } => {
                let Some(session) = self.open_session(&session) else {
                    return;
                };
                match session.finish_ask(question, outcome) {
                    Ok(()) => self.analysis_view.editing = false,
                    Err(e) => self.notifications.failed("get answer", &e),
                }
            }
            Completion::Deleted { filename, outcome } => match outcome {
                Ok(_) => {
                    self.notifications.success(format!("Deleted {filename}"));
                    self.spawn_reload();
                }
                Err(e) => self.notifications.failed("delete document", &e),
            },
            Completion::BulkDeleted(report) => {
                self.selection.finish(&report);
                if report.has_failures() {
                    self.notifications.warning(format!(
                        "{} of {} documents could not be deleted",
                        report.failed.len(),
                        report.failed.len() + report.deleted.len()
                    ));
                } else {
                    self.notifications
                        .success(format!("Deleted {} documents", report.deleted.len()));
                }
                self.spawn_reload();
            }
        }
    }

    /// The open session if it is the one `tag` was issued for. Completions
    /// for a session that was closed in the meantime are dropped.
    fn open_session(&mut self, tag: &SessionTag) -> Option<&mut AnalysisSession> {
        let current = self.session_epoch;
        match self.router.view_mut().session_mut() {
            Some(session) if tag.epoch == current && session.document_id() == tag.document_id => {
                Some(session)
            }
            _ => {
                tracing::debug!(
                    document_id = %tag.document_id,
                    epoch = tag.epoch,
                    "discarding completion for closed session"
                );
                None
            }
        }
    }

    // ==================== rendering ====================

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title bar
                Constraint::Min(5),    // Main content
                Constraint::Length(3), // Status bar
            ])
            .split(area);

        self.render_title_bar(frame, chunks[0]);

        let can_cancel = !self.registry.is_empty();
        match self.router.view() {
            View::Upload => self
                .upload_view
                .render(frame, chunks[1], &self.uploader, can_cancel),
            View::Dashboard => {
                self.dashboard
                    .render(frame, chunks[1], &self.registry, &self.selection)
            }
            View::Analysis(session) => self.analysis_view.render(frame, chunks[1], session),
        }

        self.render_status_bar(frame, chunks[2]);

        if let Some(ref confirm) = self.confirm {
            render_confirm(frame, area, confirm);
        }
        self.notifications.render(frame, area);
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let view_name = match self.router.view() {
            View::Upload => "Upload",
            View::Dashboard => "Documents",
            View::Analysis(_) => "Analysis",
        };
        let mut spans = vec![
            Span::styled(" Legal Document AI Assistant", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" | "),
            Span::styled(view_name, Style::default().fg(Color::Cyan)),
        ];
        if self.selection.is_active() {
            spans.push(Span::styled(
                "  [select mode]",
                Style::default().fg(Color::Yellow),
            ));
        }
        if self.in_flight > 0 {
            spans.push(Span::styled("  ⟳", Style::default().fg(Color::DarkGray)));
        }
        let title = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let hints = if self.confirm.is_some() {
            " y:Confirm  n/Esc:Cancel"
        } else {
            match self.router.view() {
                View::Upload if !self.registry.is_empty() => {
                    " Enter:Upload  Esc:Back  Ctrl-C:Quit"
                }
                View::Upload => " Enter:Upload  Ctrl-C:Quit",
                View::Dashboard if self.dashboard.searching => " Enter:Apply  Esc:Clear search",
                View::Dashboard if self.selection.is_active() => {
                    " Enter/Space:Toggle  D:Delete selected  s/Esc:Exit select  q:Quit"
                }
                View::Dashboard => {
                    " j/k:Navigate  Enter:Open  u:Upload  s:Select  d:Delete  /:Search  r:Refresh  q:Quit"
                }
                View::Analysis(_) if self.analysis_view.editing => " Enter:Ask  Esc:Stop typing",
                View::Analysis(_) => {
                    " 1-4/Tab:Tabs  j/k:Scroll  a:Analyze  i:Ask  b/Esc:Back  q:Quit"
                }
            }
        };
        let status = Paragraph::new(hints)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(status, area);
    }
}

fn render_confirm(frame: &mut Frame, area: Rect, confirm: &Confirm) {
    let width = 50.min(area.width);
    let height = 5.min(area.height);
    let rect = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );
    let dialog = Paragraph::new(vec![
        Line::from(confirm.message()),
        Line::from(Span::styled("[y] Yes   [n] No", Style::default().fg(Color::DarkGray))),
    ])
    .wrap(Wrap { trim: true })
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Confirm ")
            .border_style(Style::default().fg(Color::Red)),
    );
    frame.render_widget(Clear, rect);
    frame.render_widget(dialog, rect);
}

/// Setup the terminal for TUI mode
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

/// Restore the terminal to normal mode
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    stdout().execute(DisableBracketedPaste)?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Run the TUI application against `api`.
pub async fn run_tui<A: DocumentApi + Clone + 'static>(api: A, settle_delay: Duration) -> Result<()> {
    let (mut app, mut rx) = App::new(api, settle_delay);
    app.initialize().await;

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app, &mut rx).await;
    restore_terminal()?;
    result
}

async fn event_loop<A: DocumentApi + Clone + 'static>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<A>,
    rx: &mut mpsc::UnboundedReceiver<Completion>,
) -> Result<()> {
    loop {
        app.notifications.cleanup();
        terminal.draw(|f| app.render(f))?;

        tokio::select! {
            // Check for keyboard and paste events
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                while event::poll(Duration::from_millis(0))? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                        Event::Paste(text) => app.handle_paste(&text),
                        _ => {}
                    }
                }
            }
            // Apply finished requests
            Some(completion) = rx.recv() => app.apply(completion),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
