//! Command-line arguments and environment settings.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use docchat_core::context::HistoryWindow;
use docchat_core::prompt::{Intent, Params};
use docchat_gemini_model::{GeminiConfig, GeminiConfigBuilder};

use crate::Error;
use crate::command::parse_param;

/// Timeout applied to every model call unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
/// Label of the tab that is open on start.
pub const DEFAULT_TAB: &str = "Analysis Report";

/// Command-line arguments. Flags take precedence over the environment.
#[derive(Clone, Debug, Default, Parser)]
#[command(name = "docchat", version)]
#[command(about = "Chat with a multimodal model about a technical document")]
pub struct Args {
    /// Upload this file on start.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Analysis intent of the first tab.
    #[arg(long)]
    pub intent: Option<String>,
    /// Prompt parameter as key=value, can be repeated.
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,
    /// Label of the first tab.
    #[arg(long)]
    pub tab: Option<String>,
    /// Gemini model name [env: GEMINI_MODEL].
    #[arg(long)]
    pub model: Option<String>,
    /// Timeout of a model call in seconds [env: DOCCHAT_TIMEOUT_SECS].
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Forward at most this many prior turns [env: DOCCHAT_HISTORY_TURNS].
    #[arg(long)]
    pub history_turns: Option<usize>,
    /// Directory exported reports are written to.
    #[arg(long)]
    pub export_dir: Option<PathBuf>,
}

/// Resolved settings of one run.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// The Gemini API key, if one was found.
    pub api_key: Option<String>,
    /// Model override.
    pub model: Option<String>,
    /// Endpoint override.
    pub base_url: Option<String>,
    /// Bound of every model call.
    pub timeout: Duration,
    /// How much history goes into follow-up requests.
    pub history: HistoryWindow,
    /// File to upload on start.
    pub file: Option<PathBuf>,
    /// Intent of the first tab.
    pub intent: Intent,
    /// Parameters of the first tab.
    pub params: Params,
    /// Label of the first tab.
    pub tab: String,
    /// Where exports are written.
    pub export_dir: PathBuf,
}

impl Settings {
    /// Merges `args` with the environment as seen through `lookup`.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let timeout = match args.timeout {
            Some(secs) => secs,
            None => match env("DOCCHAT_TIMEOUT_SECS") {
                Some(value) => parse_number("timeout", &value)?,
                None => DEFAULT_TIMEOUT.as_secs(),
            },
        };
        if timeout == 0 {
            return Err(Error::InvalidValue {
                name: "timeout",
                value: "0".to_owned(),
            });
        }

        let history_turns = match args.history_turns {
            Some(turns) => Some(turns),
            None => env("DOCCHAT_HISTORY_TURNS")
                .map(|value| parse_number("history turns", &value))
                .transpose()?,
        };

        let intent = match args.intent.as_deref() {
            Some(name) => Intent::from_name(name)?,
            None => Intent::GeneralCheck,
        };
        let params = args
            .params
            .iter()
            .map(|pair| parse_param(pair))
            .collect::<Result<Params, _>>()?;

        Ok(Self {
            api_key: env("GEMINI_API_KEY").map(|key| key.trim().to_owned()),
            model: args.model.or_else(|| env("GEMINI_MODEL")),
            base_url: env("GEMINI_BASE_URL"),
            timeout: Duration::from_secs(timeout),
            history: history_turns
                .map_or(HistoryWindow::Unbounded, HistoryWindow::LastTurns),
            file: args.file,
            intent,
            params,
            tab: args.tab.unwrap_or_else(|| DEFAULT_TAB.to_owned()),
            export_dir: args.export_dir.unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    /// The provider configuration, if an API key is known.
    pub fn gemini_config(&self) -> Option<GeminiConfig> {
        let api_key = self.api_key.as_ref()?;
        let mut builder = GeminiConfigBuilder::with_api_key(api_key.clone())
            .with_timeout(self.timeout);
        if let Some(model) = &self.model {
            builder = builder.with_model(model.clone());
        }
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url.clone());
        }
        Some(builder.build())
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("history", &self.history)
            .field("file", &self.file)
            .field("intent", &self.intent)
            .field("params", &self.params)
            .field("tab", &self.tab)
            .field("export_dir", &self.export_dir)
            .finish()
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    value: &str,
) -> Result<T, Error> {
    value.trim().parse().map_err(|_| Error::InvalidValue {
        name,
        value: value.to_owned(),
    })
}
