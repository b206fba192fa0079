//! Grounded chat over an uploaded artifact: artifact handling, prompt
//! templates, request assembly, the model gateway, per-workflow sessions
//! and report export.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod artifact;
pub mod context;
pub mod conversation;
mod error;
pub mod export;
mod gateway;
pub mod prompt;
mod session;
mod workbench;

pub use error::Error;
pub use gateway::{Gateway, GatewayError};
pub use session::{Stage, WorkflowSession};
pub use workbench::Workbench;
