//! View Router - the three-state navigator.
//!
//! Navigation is a pure function of the current [`View`] and a
//! [`RouterEvent`]. Side effects are returned as [`Command`]s for the
//! application loop to interpret; the router itself never touches the
//! network or the registry.
//!
//! | From      | Event                    | To                         |
//! |-----------|--------------------------|----------------------------|
//! | upload    | upload succeeded         | dashboard + reload         |
//! | upload    | cancel (documents exist) | dashboard                  |
//! | dashboard | select (not select mode) | analysis + start session   |
//! | dashboard | upload new               | upload                     |
//! | analysis  | back                     | dashboard + reload         |
//!
//! Anything else leaves the view unchanged.

use std::fmt;

use crate::models::Document;
use crate::session::{AnalysisSession, EntryPlan};

/// The active view. The analysis variant owns its session.
#[derive(Debug)]
pub enum View {
    Upload,
    Dashboard,
    Analysis(Box<AnalysisSession>),
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Upload => "upload",
            View::Dashboard => "dashboard",
            View::Analysis(_) => "analysis",
        }
    }

    /// The open session, if this is the analysis view.
    pub fn session(&self) -> Option<&AnalysisSession> {
        match self {
            View::Analysis(session) => Some(session),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut AnalysisSession> {
        match self {
            View::Analysis(session) => Some(session),
            _ => None,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Navigation input.
#[derive(Debug, Clone)]
pub enum RouterEvent {
    /// The upload coordinator reported success
    UploadSucceeded { document_id: String },
    /// A dashboard row was activated
    SelectDocument(Document),
    /// "Upload new document" from the dashboard
    UploadNew,
    /// Leave the analysis view
    Back,
    /// Leave the upload view without uploading
    Cancel,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ReloadRegistry,
    /// Issue the entry requests of the newly opened session
    StartSession { document_id: String, plan: EntryPlan },
}

/// Facts from outside the router that gate some transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteContext {
    /// Selection mode is on; row activation toggles instead of opening
    pub select_mode: bool,
    /// The registry holds at least one document
    pub has_documents: bool,
    /// An upload is in flight; the upload view may not be left
    pub uploading: bool,
}

/// Compute the next view and the commands it requires.
pub fn transition(view: View, event: RouterEvent, ctx: RouteContext) -> (View, Vec<Command>) {
    match (view, event) {
        (View::Upload, RouterEvent::UploadSucceeded { document_id }) => {
            tracing::debug!(document_id = %document_id, "upload succeeded, showing dashboard");
            (View::Dashboard, vec![Command::ReloadRegistry])
        }
        (View::Upload, RouterEvent::Cancel) if ctx.has_documents && !ctx.uploading => {
            (View::Dashboard, Vec::new())
        }
        (View::Dashboard, RouterEvent::SelectDocument(document)) if !ctx.select_mode => {
            let document_id = document.id.clone();
            let (session, plan) = AnalysisSession::open(document);
            (
                View::Analysis(Box::new(session)),
                vec![Command::StartSession { document_id, plan }],
            )
        }
        (View::Dashboard, RouterEvent::UploadNew) => (View::Upload, Vec::new()),
        (View::Analysis(_), RouterEvent::Back) => (View::Dashboard, vec![Command::ReloadRegistry]),
        (view, event) => {
            tracing::trace!(view = %view, ?event, "event ignored");
            (view, Vec::new())
        }
    }
}

/// Owner of the current view.
#[derive(Debug)]
pub struct Router {
    view: View,
}

impl Router {
    pub fn new(initial: View) -> Self {
        Self { view: initial }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    /// Replace the view without going through the transition table.
    /// Used once, after the initial registry load decides the start view.
    pub fn reset(&mut self, view: View) {
        self.view = view;
    }

    /// Apply `event` and return the resulting commands.
    pub fn dispatch(&mut self, event: RouterEvent, ctx: RouteContext) -> Vec<Command> {
        let current = std::mem::replace(&mut self.view, View::Dashboard);
        let (next, commands) = transition(current, event, ctx);
        self.view = next;
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisStatus;
    use crate::test_utils::FakeApi;

    fn doc(status: AnalysisStatus, summary: Option<&str>) -> Document {
        let api = FakeApi::new();
        api.insert("lease.pdf", status, summary);
        api.with(|s| s.documents[0].clone())
    }

    fn ctx() -> RouteContext {
        RouteContext {
            has_documents: true,
            ..RouteContext::default()
        }
    }

    #[test]
    fn test_upload_success_goes_to_dashboard_and_reloads() {
        let (view, commands) = transition(
            View::Upload,
            RouterEvent::UploadSucceeded {
                document_id: "doc-1".to_string(),
            },
            RouteContext::default(),
        );
        assert!(matches!(view, View::Dashboard));
        assert_eq!(commands, vec![Command::ReloadRegistry]);
    }

    #[test]
    fn test_select_document_opens_analysis() {
        let document = doc(AnalysisStatus::Pending, None);
        let (view, commands) =
            transition(View::Dashboard, RouterEvent::SelectDocument(document), ctx());

        let session = view.session().unwrap();
        assert_eq!(session.document().filename, "lease.pdf");
        assert!(session.is_analyzing());
        assert!(matches!(
            &commands[..],
            [Command::StartSession { plan, .. }] if plan.analyze && plan.load_chat
        ));
    }

    #[test]
    fn test_select_cached_document_skips_analyze() {
        let document = doc(AnalysisStatus::Completed, Some("Summary"));
        let (_, commands) =
            transition(View::Dashboard, RouterEvent::SelectDocument(document), ctx());
        assert!(matches!(
            &commands[..],
            [Command::StartSession { plan, .. }] if !plan.analyze
        ));
    }

    #[test]
    fn test_select_in_select_mode_stays_on_dashboard() {
        let document = doc(AnalysisStatus::Pending, None);
        let ctx = RouteContext {
            select_mode: true,
            ..ctx()
        };
        let (view, commands) =
            transition(View::Dashboard, RouterEvent::SelectDocument(document), ctx);
        assert!(matches!(view, View::Dashboard));
        assert!(commands.is_empty());
    }

    #[test]
    fn test_upload_new_from_dashboard() {
        let (view, commands) = transition(View::Dashboard, RouterEvent::UploadNew, ctx());
        assert!(matches!(view, View::Upload));
        assert!(commands.is_empty());
    }

    #[test]
    fn test_back_from_analysis_reloads() {
        let (session, _) = AnalysisSession::open(doc(AnalysisStatus::Pending, None));
        let (view, commands) =
            transition(View::Analysis(Box::new(session)), RouterEvent::Back, ctx());
        assert!(matches!(view, View::Dashboard));
        assert_eq!(commands, vec![Command::ReloadRegistry]);
    }

    #[test]
    fn test_cancel_upload_only_with_documents_and_idle() {
        let (view, _) = transition(View::Upload, RouterEvent::Cancel, ctx());
        assert!(matches!(view, View::Dashboard));

        let (view, _) = transition(View::Upload, RouterEvent::Cancel, RouteContext::default());
        assert!(matches!(view, View::Upload));

        let busy = RouteContext {
            uploading: true,
            ..ctx()
        };
        let (view, _) = transition(View::Upload, RouterEvent::Cancel, busy);
        assert!(matches!(view, View::Upload));
    }

    #[test]
    fn test_events_outside_table_are_ignored() {
        let (view, commands) = transition(View::Dashboard, RouterEvent::Back, ctx());
        assert!(matches!(view, View::Dashboard));
        assert!(commands.is_empty());

        let (view, _) = transition(
            View::Dashboard,
            RouterEvent::UploadSucceeded {
                document_id: "x".to_string(),
            },
            ctx(),
        );
        assert!(matches!(view, View::Dashboard));

        let (session, _) = AnalysisSession::open(doc(AnalysisStatus::Pending, None));
        let (view, _) = transition(View::Analysis(Box::new(session)), RouterEvent::UploadNew, ctx());
        assert_eq!(view.name(), "analysis");
    }

    #[test]
    fn test_router_dispatch_keeps_view() {
        let mut router = Router::new(View::Dashboard);
        router.dispatch(RouterEvent::SelectDocument(doc(AnalysisStatus::Pending, None)), ctx());
        assert_eq!(router.view().name(), "analysis");
        assert!(router.view_mut().session_mut().is_some());

        let commands = router.dispatch(RouterEvent::Back, ctx());
        assert_eq!(router.view().name(), "dashboard");
        assert_eq!(commands, vec![Command::ReloadRegistry]);
    }
}
