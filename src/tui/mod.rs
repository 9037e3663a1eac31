//! Terminal User Interface module for brief
//!
//! This module provides a keyboard-driven TUI for the document workflow:
//! uploading a file, browsing the document list, and reading an analysis
//! with its question-and-answer transcript. It talks to the backend through
//! [`crate::api::DocumentApi`].

mod app;
mod notifications;
mod views;

pub use app::{App, Completion, Confirm, SessionTag, run_tui};
pub use notifications::{NotificationLevel, NotificationManager, Toast};
