use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use docchat_core::artifact::Replacement;
use docchat_core::prompt::Intent;
use docchat_core::{Gateway, Workbench};

use crate::command::{Command, HELP};
use crate::config::Settings;
use crate::{Error, upload, view};

/// What a command produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Informational text.
    Message(String),
    /// The model's answer, already appended to the conversation.
    Reply(String),
    /// The report was written to this file.
    Exported(PathBuf),
    /// The user wants to leave.
    Quit,
}

/// The front-end state: every tab plus the gateway they share.
///
/// Commands run one at a time. [`App::execute`] borrows the app mutably
/// until the model call of a command has finished.
pub struct App {
    workbench: Workbench,
    gateway: Gateway,
    export_dir: PathBuf,
    today: fn() -> NaiveDate,
}

impl App {
    /// Creates an app showing `workbench`.
    pub fn new(workbench: Workbench, gateway: Gateway) -> Self {
        Self {
            workbench,
            gateway,
            export_dir: PathBuf::from("."),
            today: || Local::now().date_naive(),
        }
    }

    /// Creates an app with the first tab described by `settings`.
    pub fn from_settings(settings: &Settings, gateway: Gateway) -> Self {
        let mut workbench = Workbench::with_history_window(
            settings.tab.clone(),
            settings.intent,
            settings.history,
        );
        let session = workbench.active_mut();
        for (name, value) in &settings.params {
            session.set_param(name.clone(), value.clone());
        }
        Self::new(workbench, gateway).with_export_dir(settings.export_dir.clone())
    }

    /// Sets the directory exports are written to.
    #[inline]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Sets the date used to name exports.
    #[inline]
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// All open tabs.
    #[inline]
    pub fn workbench(&self) -> &Workbench {
        &self.workbench
    }

    /// The gateway every tab talks to.
    #[inline]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Runs `command` against the active tab.
    pub async fn execute(&mut self, command: Command) -> Result<Outcome, Error> {
        trace!("executing {command:?}");
        let outcome = match command {
            Command::Upload(path) => {
                let artifact = upload::load(&path).await?;
                let preview = view::preview(&artifact);
                let message = match self.workbench.active_mut().upload(artifact)
                {
                    Replacement::First => format!("Loaded {preview}."),
                    Replacement::SameName => format!("Reloaded {preview}."),
                    Replacement::Renamed => format!(
                        "Loaded {preview}. The previous conversation was cleared."
                    ),
                };
                Outcome::Message(message)
            }
            Command::Intent(intent) => {
                self.workbench.active_mut().set_intent(intent)?;
                Outcome::Message(format!("Intent: {}.", intent.label()))
            }
            Command::Intents => Outcome::Message(view::intents()),
            Command::Set { name, value } => {
                let message = format!("{name} = {value}");
                self.workbench.active_mut().set_param(name, value);
                Outcome::Message(message)
            }
            Command::Generate => {
                let session = self.workbench.active_mut();
                let report = session.generate_report(&self.gateway).await?;
                Outcome::Reply(report.content().to_owned())
            }
            Command::Export(format) => {
                let session = self.workbench.active();
                let document = session.export(format)?;
                let path = self
                    .export_dir
                    .join(session.export_file_name((self.today)(), format));
                tokio::fs::write(&path, document).await.map_err(|source| {
                    Error::Io {
                        path: path.clone(),
                        source,
                    }
                })?;
                info!("report exported to {}", path.display());
                Outcome::Exported(path)
            }
            Command::Clear => {
                let session = self.workbench.active_mut();
                session.clear();
                Outcome::Message(format!("Cleared {}.", session.label()))
            }
            Command::Tab { label, intent } => {
                let existed =
                    self.workbench.tabs().iter().any(|tab| tab.label() == label);
                let session = self
                    .workbench
                    .open(&label, intent.unwrap_or(Intent::GeneralCheck));
                match intent {
                    // An existing tab keeps its intent, `/intent` changes it.
                    Some(intent) if existed && intent != session.intent() => {
                        Outcome::Message(format!(
                            "Tab `{label}` already exists and keeps its intent \
                             `{}`, use /intent {intent} to change it.\n{}",
                            session.intent(),
                            view::render(session)
                        ))
                    }
                    _ => Outcome::Message(view::render(session)),
                }
            }
            Command::Tabs => Outcome::Message(view::tabs(&self.workbench)),
            Command::Show => {
                Outcome::Message(view::render(self.workbench.active()))
            }
            Command::Help => Outcome::Message(HELP.to_owned()),
            Command::Quit => Outcome::Quit,
            Command::Ask(question) => {
                let session = self.workbench.active_mut();
                let answer = session.ask(&self.gateway, &question).await?;
                Outcome::Reply(answer.content().to_owned())
            }
        };
        Ok(outcome)
    }
}
