//! Named workflow tabs.

use crate::context::HistoryWindow;
use crate::prompt::Intent;
use crate::{Error, WorkflowSession};

/// A set of named workflow tabs, one of them active.
///
/// Every tab owns its own [`WorkflowSession`]. Nothing is shared between
/// tabs, and switching tabs leaves all of them untouched.
#[derive(Clone, Debug)]
pub struct Workbench {
    tabs: Vec<WorkflowSession>,
    active: usize,
    window: HistoryWindow,
}

impl Workbench {
    /// Creates a workbench with a single tab.
    pub fn new(label: impl Into<String>, intent: Intent) -> Self {
        Self::with_history_window(label, intent, HistoryWindow::default())
    }

    /// Like [`Workbench::new`], with the history window every tab uses.
    pub fn with_history_window(
        label: impl Into<String>,
        intent: Intent,
        window: HistoryWindow,
    ) -> Self {
        let first = WorkflowSession::new(label, intent).with_history_window(window);
        Self {
            tabs: vec![first],
            active: 0,
            window,
        }
    }

    /// Activates the tab named `label`, creating it with `intent` first if
    /// it doesn't exist. An existing tab keeps its own intent.
    pub fn open(&mut self, label: &str, intent: Intent) -> &mut WorkflowSession {
        match self.position(label) {
            Some(idx) => self.active = idx,
            None => {
                debug!("opening tab `{label}`");
                self.tabs.push(
                    WorkflowSession::new(label, intent)
                        .with_history_window(self.window),
                );
                self.active = self.tabs.len() - 1;
            }
        }
        &mut self.tabs[self.active]
    }

    /// Activates an existing tab.
    pub fn switch(&mut self, label: &str) -> Result<(), Error> {
        let idx = self
            .position(label)
            .ok_or_else(|| Error::UnknownTab(label.to_owned()))?;
        self.active = idx;
        Ok(())
    }

    /// The tab commands apply to.
    #[inline]
    pub fn active(&self) -> &WorkflowSession {
        &self.tabs[self.active]
    }

    /// Mutable access to the active tab.
    #[inline]
    pub fn active_mut(&mut self) -> &mut WorkflowSession {
        &mut self.tabs[self.active]
    }

    /// All tabs in the order they were opened.
    #[inline]
    pub fn tabs(&self) -> &[WorkflowSession] {
        &self.tabs
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.label() == label)
    }
}

#[cfg(test)]
mod tests {
    use docchat_test_model::{PresetResponse, TestModelProvider};

    use super::*;
    use crate::Gateway;
    use crate::artifact::Artifact;

    #[tokio::test]
    async fn test_tabs_are_isolated() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text("Statics notes"));
        let gateway = Gateway::new(provider);

        let mut workbench = Workbench::new("Statics", Intent::StudyNotes);
        let statics = workbench.active_mut();
        statics.set_param("course", "Statics");
        statics.upload(
            Artifact::new("week1.pdf", "application/pdf", &b"%PDF"[..]).unwrap(),
        );
        statics.generate_report(&gateway).await.unwrap();

        let dynamics = workbench.open("Dynamics", Intent::StudyNotes);
        assert!(dynamics.artifact().is_none());
        assert!(dynamics.conversation().is_empty());
        assert!(dynamics.params().is_empty());

        workbench.switch("Statics").unwrap();
        let statics = workbench.active();
        assert_eq!(statics.conversation().len(), 1);
        assert_eq!(statics.artifact().unwrap().name(), "week1.pdf");
        assert_eq!(workbench.tabs().len(), 2);
    }

    #[test]
    fn test_open_existing_tab_keeps_intent() {
        let mut workbench = Workbench::new("Drawing", Intent::GeneralCheck);
        workbench.open("Materials", Intent::MaterialComparison);

        let drawing = workbench.open("Drawing", Intent::Machinist);
        assert_eq!(drawing.intent(), Intent::GeneralCheck);
        assert_eq!(workbench.tabs().len(), 2);
    }

    #[test]
    fn test_switch_to_unknown_tab() {
        let mut workbench = Workbench::new("Drawing", Intent::GeneralCheck);
        assert_eq!(
            workbench.switch("Nope"),
            Err(Error::UnknownTab("Nope".to_owned()))
        );
        assert_eq!(workbench.active().label(), "Drawing");
    }

    #[test]
    fn test_window_applies_to_new_tabs() {
        let mut workbench = Workbench::with_history_window(
            "A",
            Intent::GeneralCheck,
            HistoryWindow::LastTurns(4),
        );
        let tab = workbench.open("B", Intent::GeneralCheck);
        assert_eq!(tab.history_window(), HistoryWindow::LastTurns(4));
    }
}
