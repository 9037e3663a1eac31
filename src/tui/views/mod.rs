//! TUI Views module
//!
//! One view per screen of the document workflow.

mod analysis;
mod dashboard;
mod upload;

pub use analysis::AnalysisView;
pub use dashboard::DashboardView;
pub use upload::UploadView;
