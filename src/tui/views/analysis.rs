//! Analysis View - tabs for summary, clauses, risks and Q&A

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
};

use crate::session::clauses::CLAUSES_UNAVAILABLE;
use crate::session::{AnalysisSession, ClausesView, SessionState, Tab};

/// Shown when there is neither a result nor a request in flight.
pub const NO_ANALYSIS: &str = "No analysis available. Please try analyzing the document again.";

/// State for the analysis view
#[derive(Debug, Default)]
pub struct AnalysisView {
    /// Keystrokes go to the question input
    pub editing: bool,
    /// Vertical scroll of the tab body
    pub scroll: u16,
}

impl AnalysisView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    /// Reset per-document state when a session opens or a tab changes.
    pub fn reset(&mut self) {
        self.editing = false;
        self.scroll = 0;
    }

    /// Render the view
    pub fn render(&self, frame: &mut Frame, area: Rect, session: &AnalysisSession) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Document header
                Constraint::Length(3), // Tabs
                Constraint::Min(5),    // Body
            ])
            .split(area);

        let doc = session.document();
        let header = Paragraph::new(Line::from(vec![
            Span::styled(&doc.filename, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("[{}]", session.state()),
                Style::default().fg(state_color(session.state())),
            ),
            Span::styled(
                format!("  uploaded {}", doc.display_date()),
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let selected = Tab::ALL.iter().position(|t| *t == session.tab()).unwrap_or(0);
        let tabs = Tabs::new(
            Tab::ALL
                .iter()
                .enumerate()
                .map(|(i, t)| format!("{} {}", i + 1, t.title())),
        )
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(tabs, chunks[1]);

        if session.tab() == Tab::Qa {
            self.render_qa(frame, chunks[2], session);
        } else {
            let body = Paragraph::new(self.body_lines(session))
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!(" {} ", session.tab().title())),
                );
            frame.render_widget(body, chunks[2]);
        }
    }

    /// Text of a non-Q&A tab.
    fn body_lines<'a>(&self, session: &'a AnalysisSession) -> Vec<Line<'a>> {
        match session.state() {
            SessionState::Analyzing => {
                return vec![Line::from(Span::styled(
                    "Analyzing document...",
                    Style::default().fg(Color::Yellow),
                ))];
            }
            SessionState::Failed(reason) if session.analysis().is_none() => {
                return vec![
                    Line::from(Span::styled(
                        format!("Analysis failed: {reason}"),
                        Style::default().fg(Color::Red),
                    )),
                    Line::from("Press a to try again."),
                ];
            }
            _ => {}
        }

        let Some(analysis) = session.analysis() else {
            let notice = session.status_notice().unwrap_or(NO_ANALYSIS);
            return vec![
                Line::from(notice),
                Line::from(Span::styled(
                    "Press a to analyze.",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
        };

        match session.tab() {
            Tab::Summary => text_lines(&analysis.summary),
            Tab::Clauses => match session.clauses_view() {
                Some(ClausesView::Structured(clauses)) => {
                    let mut lines = Vec::new();
                    for (i, clause) in clauses.iter().enumerate() {
                        lines.push(Line::from(Span::styled(
                            format!("{}. {}", i + 1, clause.clause),
                            Style::default().add_modifier(Modifier::BOLD),
                        )));
                        lines.extend(text_lines(&clause.explanation));
                        lines.push(Line::from(""));
                    }
                    lines
                }
                Some(ClausesView::Degraded(text)) => text
                    .trim()
                    .lines()
                    .map(|l| Line::from(l.to_string()))
                    .collect(),
                Some(ClausesView::Unavailable) | None => vec![Line::from(CLAUSES_UNAVAILABLE)],
            },
            Tab::Risks => text_lines(session.risk_text().unwrap_or_default()),
            Tab::Qa => Vec::new(),
        }
    }

    fn render_qa(&self, frame: &mut Frame, area: Rect, session: &AnalysisSession) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(area);

        let mut lines = Vec::new();
        if session.transcript().is_empty() {
            lines.push(Line::from(Span::styled(
                "No questions yet. Press i to ask one.",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for entry in session.transcript() {
            lines.push(Line::from(vec![
                Span::styled("Q: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::raw(entry.question.as_str()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("A: ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::raw(entry.answer.as_str()),
            ]));
            lines.push(Line::from(Span::styled(
                entry.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                Style::default().fg(Color::DarkGray),
            )));
            lines.push(Line::from(""));
        }
        let transcript = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .block(Block::default().borders(Borders::ALL).title(" Conversation "));
        frame.render_widget(transcript, chunks[0]);

        let (text, style) = if session.is_asking() {
            (
                format!("{}  (waiting for answer...)", session.question()),
                Style::default().fg(Color::Yellow),
            )
        } else if self.editing {
            (format!("{}_", session.question()), Style::default())
        } else if session.question().is_empty() {
            (
                "Press i to type a question".to_string(),
                Style::default().fg(Color::DarkGray),
            )
        } else {
            (session.question().to_string(), Style::default().fg(Color::Gray))
        };
        let input = Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::ALL).title(" Question "));
        frame.render_widget(input, chunks[1]);
    }
}

fn state_color(state: &SessionState) -> Color {
    match state {
        SessionState::Ready => Color::Green,
        SessionState::Analyzing => Color::Yellow,
        SessionState::Failed(_) => Color::Red,
        SessionState::Idle => Color::DarkGray,
    }
}

fn text_lines(text: &str) -> Vec<Line<'_>> {
    text.lines().map(Line::from).collect()
}
