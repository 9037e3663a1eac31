//! Upload View - path entry, drop target and progress bar

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

use crate::upload::{UploadCoordinator, UploadPhase};

/// State for the upload view
#[derive(Debug, Default)]
pub struct UploadView {
    /// Typed file path
    pub input: String,
}

impl UploadView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop(&mut self) {
        self.input.pop();
    }

    /// Take the typed path, leaving the input empty.
    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    /// Render the view
    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        uploader: &UploadCoordinator,
        can_cancel: bool,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // Instructions
                Constraint::Length(3), // Path input
                Constraint::Length(3), // Progress
                Constraint::Min(0),
            ])
            .split(area);

        let mut help = vec![
            Line::from(Span::styled(
                "Upload a legal document",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from("Type a file path and press Enter, or drag a file onto this window."),
            Line::from(Span::styled(
                "Accepted: .pdf .doc .docx .txt",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        if can_cancel {
            help.push(Line::from(Span::styled(
                "Esc returns to the document list.",
                Style::default().fg(Color::DarkGray),
            )));
        }
        let instructions = Paragraph::new(help)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Upload "));
        frame.render_widget(instructions, chunks[0]);

        let editable = uploader.phase() == UploadPhase::Idle;
        let input_text = if editable {
            format!("{}_", self.input)
        } else {
            self.input.clone()
        };
        let input = Paragraph::new(input_text)
            .block(Block::default().borders(Borders::ALL).title(" File path "));
        frame.render_widget(input, chunks[1]);

        let (label, color) = match uploader.task() {
            None => ("Waiting for a file".to_string(), Color::DarkGray),
            Some(task) => match task.phase {
                UploadPhase::Uploading => (
                    format!("Uploading {} ({}%)", task.filename, uploader.progress()),
                    Color::Blue,
                ),
                UploadPhase::Done => (format!("Uploaded {}", task.filename), Color::Green),
                UploadPhase::Error => (format!("Upload of {} failed", task.filename), Color::Red),
                UploadPhase::Idle => (String::new(), Color::DarkGray),
            },
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" Progress "))
            .gauge_style(Style::default().fg(color))
            .percent(u16::from(uploader.progress()))
            .label(label);
        frame.render_widget(gauge, chunks[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_editing() {
        let mut view = UploadView::new();
        for c in "/tmp/a.pdfx".chars() {
            view.push(c);
        }
        view.pop();
        assert_eq!(view.take_input(), "/tmp/a.pdf");
        assert!(view.input.is_empty());
    }
}
