//! Per-workflow state and its lifecycle.

use std::fmt;

use chrono::NaiveDate;
use docchat_model::Part;

use crate::artifact::{Artifact, ArtifactStore, Replacement};
use crate::context::{self, HistoryWindow, RequestPayload};
use crate::conversation::{Conversation, Turn};
use crate::export::{self, ExportFormat};
use crate::prompt::{self, Intent, Params};
use crate::{Error, Gateway};

/// Where a workflow is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Nothing uploaded or generated yet.
    #[default]
    Empty,
    /// An artifact is held, no report yet.
    ArtifactLoaded,
    /// The report exists, no follow-up yet.
    ReportGenerated,
    /// At least one follow-up was answered.
    Conversing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Empty => "empty",
            Stage::ArtifactLoaded => "artifact loaded",
            Stage::ReportGenerated => "report generated",
            Stage::Conversing => "conversing",
        };
        f.write_str(name)
    }
}

/// The state of one workflow: its artifact, conversation, intent and
/// parameters.
///
/// Every operation that talks to the model borrows the session mutably
/// for the whole call, so one session never has two requests in flight.
/// A failed call leaves the session exactly as it was.
#[derive(Clone, Debug)]
pub struct WorkflowSession {
    label: String,
    intent: Intent,
    params: Params,
    artifacts: ArtifactStore,
    conversation: Conversation,
    stage: Stage,
    window: HistoryWindow,
    // Fixed when the report is generated and reused for every follow-up.
    instructions: Option<String>,
}

impl WorkflowSession {
    /// Creates an empty workflow labeled `label`.
    pub fn new(label: impl Into<String>, intent: Intent) -> Self {
        Self {
            label: label.into(),
            intent,
            params: Params::new(),
            artifacts: ArtifactStore::default(),
            conversation: Conversation::default(),
            stage: Stage::Empty,
            window: HistoryWindow::default(),
            instructions: None,
        }
    }

    /// Sets how much history follow-up requests carry.
    #[inline]
    pub fn with_history_window(mut self, window: HistoryWindow) -> Self {
        self.window = window;
        self
    }

    /// The workflow label, also used to name exports.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The selected intent.
    #[inline]
    pub fn intent(&self) -> Intent {
        self.intent
    }

    /// Parameters set so far.
    #[inline]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The held artifact, if any.
    #[inline]
    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifacts.get()
    }

    /// The turns so far.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// The current stage.
    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The history bound of follow-up requests.
    #[inline]
    pub fn history_window(&self) -> HistoryWindow {
        self.window
    }

    /// The generated report, if any.
    #[inline]
    pub fn report(&self) -> Option<&Turn> {
        self.conversation.report()
    }

    /// Changes the intent. Only allowed while the conversation is empty.
    pub fn set_intent(&mut self, intent: Intent) -> Result<(), Error> {
        if !self.conversation.is_empty() {
            return Err(Error::ReportExists);
        }
        if intent != self.intent {
            debug!(label = %self.label, "intent changed to {intent}");
            self.intent = intent;
        }
        Ok(())
    }

    /// Sets a prompt parameter. Values apply to the next report.
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    /// Holds `artifact` as the workflow's document.
    ///
    /// Unless the artifact has the same name as the held one, the existing
    /// conversation is stale, so it is cleared and the workflow starts over
    /// from [`Stage::ArtifactLoaded`].
    pub fn upload(&mut self, artifact: Artifact) -> Replacement {
        let name = artifact.name().to_owned();
        let replacement = self.artifacts.set(artifact);
        match replacement {
            Replacement::SameName => {
                debug!(label = %self.label, "artifact `{name}` reloaded");
            }
            // A report made without any artifact is as stale as one made
            // from a different artifact.
            Replacement::First | Replacement::Renamed => {
                let dropped = self.conversation.len();
                self.conversation.clear();
                self.instructions = None;
                self.stage = Stage::ArtifactLoaded;
                info!(
                    label = %self.label,
                    "artifact `{name}` loaded, dropped {dropped} turn(s)"
                );
            }
        }
        replacement
    }

    /// Resets the workflow to [`Stage::Empty`]. The intent and parameters
    /// are kept.
    pub fn clear(&mut self) {
        self.artifacts.take();
        self.conversation.clear();
        self.instructions = None;
        self.stage = Stage::Empty;
        info!(label = %self.label, "workflow cleared");
    }

    /// Whether a report can be requested right now.
    pub fn can_generate(&self) -> bool {
        self.conversation.is_empty()
            && (self.artifact().is_some() || !self.intent.needs_artifact())
    }

    /// Builds the request that [`generate_report`](Self::generate_report)
    /// would send.
    pub fn report_request(&self) -> Result<RequestPayload, Error> {
        if !self.conversation.is_empty() {
            return Err(Error::ReportExists);
        }
        if self.intent.needs_artifact() && self.artifact().is_none() {
            return Err(Error::NoArtifact);
        }
        let instructions = prompt::build(self.intent, &self.params)?;
        Ok(context::assemble(
            &instructions,
            self.artifact(),
            &self.conversation,
            None,
            self.window,
        ))
    }

    /// Builds the request that [`ask`](Self::ask) would send for
    /// `question`.
    pub fn follow_up_request(
        &self,
        question: &str,
    ) -> Result<RequestPayload, Error> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }
        let Some(instructions) = self.pending_instructions()? else {
            return Err(Error::NoReport);
        };
        Ok(context::assemble(
            &instructions,
            self.artifact(),
            &self.conversation,
            Some(question),
            self.window,
        ))
    }

    /// Generates the report and appends it as the first turn.
    pub async fn generate_report(
        &mut self,
        gateway: &Gateway,
    ) -> Result<&Turn, Error> {
        let request = self.report_request()?;
        info!(label = %self.label, intent = %self.intent, "generating report");
        let text = gateway.generate(&request).await?;

        // The first part is always the instruction text.
        self.instructions = request
            .parts
            .first()
            .and_then(Part::as_text)
            .map(str::to_owned);
        self.stage = Stage::ReportGenerated;
        Ok(self.conversation.append(Turn::assistant(text)))
    }

    /// Asks a follow-up question about the report.
    ///
    /// On success the question and the answer are appended, in that order.
    /// On failure nothing is appended.
    pub async fn ask(
        &mut self,
        gateway: &Gateway,
        question: &str,
    ) -> Result<&Turn, Error> {
        let request = self.follow_up_request(question)?;
        debug!(label = %self.label, "asking a follow-up question");
        let text = gateway.generate(&request).await?;

        self.conversation.append(Turn::user(question.trim()));
        if self.stage == Stage::ReportGenerated {
            info!(label = %self.label, "conversation started");
            self.stage = Stage::Conversing;
        }
        Ok(self.conversation.append(Turn::assistant(text)))
    }

    /// Renders the report as a document.
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>, Error> {
        let report = self.report().ok_or(Error::NoReport)?;
        Ok(export::export(report.content(), format))
    }

    /// The file name for an export made on `date`.
    #[inline]
    pub fn export_file_name(&self, date: NaiveDate, format: ExportFormat) -> String {
        export::file_name(&self.label, date, format)
    }

    fn pending_instructions(&self) -> Result<Option<String>, Error> {
        if !matches!(self.stage, Stage::ReportGenerated | Stage::Conversing) {
            return Ok(None);
        }
        match &self.instructions {
            Some(instructions) => Ok(Some(instructions.clone())),
            None => prompt::build(self.intent, &self.params).map(Some),
        }
    }
}
