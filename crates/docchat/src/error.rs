use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors of the terminal front-end.
///
/// Workflow failures are wrapped in [`Error::Workflow`]; they are shown to
/// the user and the session carries on.
#[derive(Debug, Error)]
pub enum Error {
    /// The line starts with `/` but names no known command.
    #[error("unknown command `{0}`, type /help for the list of commands")]
    UnknownCommand(String),
    /// A command was given the wrong arguments.
    #[error("usage: {0}")]
    Usage(&'static str),
    /// A setting or argument has a value that can't be used.
    #[error("invalid {name} `{value}`")]
    InvalidValue {
        /// What the value was for.
        name: &'static str,
        /// The rejected input.
        value: String,
    },
    /// Reading an upload or writing an export failed.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },
    /// A workflow action failed.
    #[error(transparent)]
    Workflow(#[from] docchat_core::Error),
}
