//! Parsing of input lines.

use std::path::PathBuf;

use docchat_core::export::ExportFormat;
use docchat_core::prompt::Intent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _};

use crate::Error;

/// One user action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Load a file as the active tab's artifact.
    Upload(PathBuf),
    /// Select the analysis intent.
    Intent(Intent),
    /// List the available intents.
    Intents,
    /// Set a prompt parameter.
    Set {
        /// Parameter name.
        name: String,
        /// Parameter value, may contain spaces.
        value: String,
    },
    /// Generate the report.
    Generate,
    /// Save the report to a file.
    Export(ExportFormat),
    /// Reset the active tab.
    Clear,
    /// Open or switch to a tab.
    Tab {
        /// The tab label.
        label: String,
        /// Intent for a newly created tab.
        intent: Option<Intent>,
    },
    /// List the open tabs.
    Tabs,
    /// Print the active tab.
    Show,
    /// Print the command reference.
    Help,
    /// Leave the program.
    Quit,
    /// A follow-up question about the report.
    Ask(String),
}

impl Command {
    /// Whether running the command calls the model.
    #[inline]
    pub fn calls_model(&self) -> bool {
        matches!(self, Command::Generate | Command::Ask(_))
    }
}

/// The command reference printed by `/help`.
pub const HELP: &str = "\
/upload <path>        load a drawing, photo or PDF
/intent <name>        choose the analysis intent
/intents              list the intents
/set <key>=<value>    set a prompt parameter
/generate             generate the report
/export [txt|pdf]     save the report (pdf by default)
/clear                clear the tab and start over
/tab <name> [intent]  open or switch to a tab
/tabs                 list the tabs
/show                 print the active tab
/help                 print this help
/quit                 leave
Any other line is a follow-up question about the report.";

/// Parses one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(line) = line.strip_prefix('/') else {
        return Ok(Some(Command::Ask(line.to_owned())));
    };

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    let command = match name.to_ascii_lowercase().as_str() {
        "upload" => {
            if rest.is_empty() {
                return Err(Error::Usage("/upload <path>"));
            }
            Command::Upload(PathBuf::from(unquote(rest)))
        }
        "intent" => {
            if rest.is_empty() {
                return Err(Error::Usage("/intent <name>"));
            }
            Command::Intent(Intent::from_name(rest)?)
        }
        "intents" => Command::Intents,
        "set" => {
            let Some((name, value)) = rest.split_once('=') else {
                return Err(Error::Usage("/set <key>=<value>"));
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::Usage("/set <key>=<value>"));
            }
            Command::Set {
                name: name.to_owned(),
                value: value.trim().to_owned(),
            }
        }
        "generate" => Command::Generate,
        "export" => {
            let format = if rest.is_empty() {
                ExportFormat::default()
            } else {
                ExportFormat::from_name(rest).ok_or_else(|| {
                    Error::InvalidValue {
                        name: "export format",
                        value: rest.to_owned(),
                    }
                })?
            };
            Command::Export(format)
        }
        "clear" => Command::Clear,
        "tab" => {
            if rest.is_empty() {
                return Err(Error::Usage("/tab <name> [intent]"));
            }
            // Labels may contain spaces; a trailing intent name is optional.
            let (label, intent) = match rest.rsplit_once(char::is_whitespace)
            {
                Some((label, last)) => match Intent::from_name(last) {
                    Ok(intent) => (label.trim(), Some(intent)),
                    Err(_) => (rest, None),
                },
                None => (rest, None),
            };
            Command::Tab {
                label: unquote(label).to_owned(),
                intent,
            }
        }
        "tabs" => Command::Tabs,
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => return Err(Error::UnknownCommand(name.to_owned())),
    };
    Ok(Some(command))
}

/// Parses a `key=value` pair as given to `--param`.
pub fn parse_param(pair: &str) -> Result<(String, String), Error> {
    match pair.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_owned(), value.trim().to_owned()))
        }
        _ => Err(Error::InvalidValue {
            name: "parameter",
            value: pair.to_owned(),
        }),
    }
}

/// Reads the next input line, `None` at the end of input.
///
/// The same reader must be used for every line, otherwise input it has
/// already buffered is lost.
pub async fn read_line<R>(input: &mut R) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    match input.read_line(&mut line).await {
        Ok(0) => None,
        Ok(_) => Some(line),
        Err(err) => {
            error!("error reading input: {err}");
            None
        }
    }
}

fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}
