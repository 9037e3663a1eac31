//! Dashboard View - document list with search and multi-select
//!
//! Rows come from the document registry, filtered by the search query.
//! In select mode each row shows a checkbox.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::models::{AnalysisStatus, Document};
use crate::registry::DocumentRegistry;
use crate::selection::SelectionController;

/// Color for a status badge.
pub fn status_color(status: AnalysisStatus) -> Color {
    match status {
        AnalysisStatus::Completed => Color::Green,
        AnalysisStatus::Processing => Color::Yellow,
        AnalysisStatus::Failed => Color::Red,
        AnalysisStatus::Pending => Color::DarkGray,
    }
}

/// State for the dashboard view
pub struct DashboardView {
    /// Selected row within the filtered list
    pub selected: usize,
    /// List widget state
    pub list_state: ListState,
    /// Filename filter
    pub search: String,
    /// Whether keystrokes go to the search box
    pub searching: bool,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardView {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            selected: 0,
            list_state,
            search: String::new(),
            searching: false,
        }
    }

    /// Rows currently visible.
    pub fn visible<'a>(&self, registry: &'a DocumentRegistry) -> Vec<&'a Document> {
        registry.filter(&self.search)
    }

    /// The highlighted document, if any.
    pub fn selected_document<'a>(&self, registry: &'a DocumentRegistry) -> Option<&'a Document> {
        self.visible(registry).get(self.selected).copied()
    }

    /// Keep the selection inside a list of `len` rows.
    pub fn clamp(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
        self.list_state.select(Some(self.selected));
    }

    /// Move selection down
    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1).min(len - 1);
        self.list_state.select(Some(self.selected));
    }

    /// Move selection up
    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.list_state.select(Some(self.selected));
    }

    /// Jump to top
    pub fn select_first(&mut self) {
        self.selected = 0;
        self.list_state.select(Some(0));
    }

    /// Jump to bottom
    pub fn select_last(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = len - 1;
        self.list_state.select(Some(self.selected));
    }

    /// Start editing the search query.
    pub fn start_search(&mut self) {
        self.searching = true;
    }

    /// Stop editing; `clear` also drops the query.
    pub fn end_search(&mut self, clear: bool) {
        self.searching = false;
        if clear {
            self.search.clear();
        }
        self.select_first();
    }

    pub fn push_search(&mut self, c: char) {
        self.search.push(c);
        self.select_first();
    }

    pub fn pop_search(&mut self) {
        self.search.pop();
        self.select_first();
    }

    /// Render the view
    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        registry: &DocumentRegistry,
        selection: &SelectionController,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        self.render_search(frame, chunks[0]);

        let docs = self.visible(registry);
        let title = if selection.is_active() {
            format!(" Documents ({}) - {} selected ", docs.len(), selection.len())
        } else {
            format!(" Documents ({}) ", docs.len())
        };

        if docs.is_empty() {
            let text = if registry.is_empty() {
                "No documents yet. Press u to upload one."
            } else {
                "No documents match the search."
            };
            let empty = Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(empty, chunks[1]);
            return;
        }

        let name_width = chunks[1].width.saturating_sub(34) as usize;
        let list_items: Vec<ListItem> = docs
            .iter()
            .enumerate()
            .map(|(idx, doc)| {
                let marker = if idx == self.selected { ">" } else { " " };
                let checkbox = if !selection.is_active() {
                    ""
                } else if selection.is_selected(&doc.id) {
                    "[x] "
                } else {
                    "[ ] "
                };
                let name = truncate(&doc.filename, name_width.saturating_sub(checkbox.len()));

                let line = Line::from(vec![
                    Span::raw(format!(" {} ", marker)),
                    Span::styled(checkbox, Style::default().fg(Color::Cyan)),
                    Span::raw(format!(
                        "{:<width$}",
                        name,
                        width = name_width.saturating_sub(checkbox.len())
                    )),
                    Span::styled(
                        format!(" {:<11}", doc.analysis_status.as_str()),
                        Style::default().fg(status_color(doc.analysis_status)),
                    ),
                    Span::styled(
                        format!(" {}", doc.display_date()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]);

                let style = if idx == self.selected {
                    Style::default().bg(Color::DarkGray)
                } else {
                    Style::default()
                };
                ListItem::new(line).style(style)
            })
            .collect();

        let list = List::new(list_items).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_stateful_widget(list, chunks[1], &mut self.list_state);
    }

    fn render_search(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = if self.searching {
            (format!("{}_", self.search), Style::default().fg(Color::White))
        } else if self.search.is_empty() {
            (
                "Press / to search by filename".to_string(),
                Style::default().fg(Color::DarkGray),
            )
        } else {
            (self.search.clone(), Style::default().fg(Color::Gray))
        };
        let search = Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::ALL).title(" Search "));
        frame.render_widget(search, area);
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}
