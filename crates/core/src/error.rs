use thiserror::Error;

use crate::gateway::GatewayError;
use crate::prompt::Intent;

/// Errors of a single workflow action. None of them is fatal to the
/// session, the action can be retried once the cause is fixed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The declared media type is not an accepted image or PDF.
    #[error(
        "unsupported media type `{0}`, upload a JPEG, PNG or WebP image or a PDF"
    )]
    UnsupportedMediaType(String),
    /// The uploaded file has no content.
    #[error("`{0}` is empty")]
    EmptyArtifact(String),
    /// No intent has this name.
    #[error("unknown intent `{0}`")]
    InvalidIntent(String),
    /// A required prompt parameter is missing or blank.
    #[error("`{intent}` needs the `{name}` parameter")]
    MissingParameter {
        /// The intent being built.
        intent: Intent,
        /// The missing parameter.
        name: &'static str,
    },
    /// The intent needs an artifact and none is held.
    #[error("upload a file first")]
    NoArtifact,
    /// A follow-up or export was requested before the report exists.
    #[error("there is no report yet, generate one first")]
    NoReport,
    /// The conversation has started, so the report is fixed.
    #[error("a report already exists, clear the workflow to start over")]
    ReportExists,
    /// The follow-up question is blank.
    #[error("the question is empty")]
    EmptyQuestion,
    /// No tab has this label.
    #[error("no tab named `{0}`")]
    UnknownTab(String),
    /// The model call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
