//! Toast messages drawn over the current view.
//!
//! Request failures are reported here as "Failed to <action>: <error>".
//! Errors stay on screen longer than confirmations so they can be read.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Toasts drawn at once; the rest are summarized as "+N more".
const MAX_VISIBLE: usize = 3;

const TOAST_WIDTH: u16 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    pub fn color(&self) -> Color {
        match self {
            NotificationLevel::Info => Color::Blue,
            NotificationLevel::Success => Color::Green,
            NotificationLevel::Warning => Color::Yellow,
            NotificationLevel::Error => Color::Red,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "ℹ",
            NotificationLevel::Success => "✓",
            NotificationLevel::Warning => "⚠",
            NotificationLevel::Error => "✗",
        }
    }

    /// How long a toast of this level stays up.
    pub fn lifetime(&self) -> Duration {
        match self {
            NotificationLevel::Info | NotificationLevel::Success => Duration::from_secs(4),
            NotificationLevel::Warning => Duration::from_secs(6),
            NotificationLevel::Error => Duration::from_secs(8),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub level: NotificationLevel,
    pub message: String,
    pub expires_at: Instant,
}

impl Toast {
    fn new(level: NotificationLevel, message: String, now: Instant) -> Self {
        Self {
            level,
            message,
            expires_at: now + level.lifetime(),
        }
    }

    fn height(&self, width: u16) -> u16 {
        let inner = width.saturating_sub(4).max(1) as usize;
        let text_len = self.message.chars().count() + 2;
        let lines = text_len.div_ceil(inner).max(1) as u16;
        (lines + 2).min(6)
    }
}

/// Queue of active toasts, newest first.
#[derive(Debug, Default)]
pub struct NotificationManager {
    toasts: VecDeque<Toast>,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.toasts
            .push_front(Toast::new(level, message.into(), Instant::now()));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, message);
    }

    /// Report a failed request, naming the action.
    pub fn failed(&mut self, action: &str, error: &crate::Error) {
        self.error(format!("Failed to {action}: {error}"));
    }

    /// Drop expired toasts. Called once per frame.
    pub fn cleanup(&mut self) {
        self.cleanup_at(Instant::now());
    }

    fn cleanup_at(&mut self, now: Instant) {
        self.toasts.retain(|t| t.expires_at > now);
    }

    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter().take(MAX_VISIBLE)
    }

    /// Toasts queued behind the visible ones.
    pub fn hidden_count(&self) -> usize {
        self.toasts.len().saturating_sub(MAX_VISIBLE)
    }

    pub fn has_toasts(&self) -> bool {
        !self.toasts.is_empty()
    }

    /// Draw visible toasts stacked in the top-right corner of `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = TOAST_WIDTH.min(area.width);
        let x = area.x + area.width.saturating_sub(width + 1);
        let bottom = area.y + area.height;
        let mut y = area.y + 1;

        for toast in self.visible() {
            let height = toast.height(width);
            if y + height > bottom {
                break;
            }
            let color = toast.level.color();
            let rect = Rect::new(x, y, width, height);
            let body = Paragraph::new(format!("{} {}", toast.level.icon(), toast.message))
                .wrap(Wrap { trim: true })
                .style(Style::default().fg(color))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color)),
                );
            frame.render_widget(Clear, rect);
            frame.render_widget(body, rect);
            y += height;
        }

        let hidden = self.hidden_count();
        if hidden > 0 && y < bottom {
            let more = Paragraph::new(format!("+{hidden} more"))
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Right);
            frame.render_widget(more, Rect::new(x, y, width, 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_outlive_confirmations() {
        let mut manager = NotificationManager::new();
        manager.success("Uploaded lease.pdf");
        manager.error("Failed to analyze document: timeout");

        let later = Instant::now() + Duration::from_secs(5);
        manager.cleanup_at(later);
        let left: Vec<_> = manager.visible().map(|t| t.level).collect();
        assert_eq!(left, [NotificationLevel::Error]);

        manager.cleanup_at(later + Duration::from_secs(5));
        assert!(!manager.has_toasts());
    }

    #[test]
    fn test_overflow_is_counted() {
        let mut manager = NotificationManager::new();
        assert_eq!(manager.hidden_count(), 0);

        for i in 0..5 {
            manager.info(format!("Deleted doc-{i}"));
        }
        assert_eq!(manager.visible().count(), MAX_VISIBLE);
        assert_eq!(manager.hidden_count(), 2);
        // Newest first
        assert_eq!(manager.visible().next().unwrap().message, "Deleted doc-4");
    }

    #[test]
    fn test_toast_height_grows_with_message() {
        let now = Instant::now();
        let short = Toast::new(NotificationLevel::Info, "ok".to_string(), now);
        assert_eq!(short.height(48), 3);
        let long = Toast::new(NotificationLevel::Info, "x".repeat(200), now);
        assert_eq!(long.height(48), 6);
    }

    #[test]
    fn test_failed_names_the_action() {
        let mut manager = NotificationManager::new();
        manager.failed("delete document", &crate::Error::NotFound("gone".to_string()));
        let toast = manager.visible().next().unwrap();
        assert_eq!(toast.level, NotificationLevel::Error);
        assert_eq!(toast.message, "Failed to delete document: Not found: gone");
    }
}
