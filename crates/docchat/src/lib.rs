//! A terminal front-end for grounded chat over an uploaded document.
//!
//! The binary reads one line at a time, parses it with [`command::parse`]
//! and runs it against the active workflow tab through [`App`]. Everything
//! except the terminal I/O lives in this library so it can be tested.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod app;
pub mod command;
pub mod config;
mod error;
pub mod upload;
pub mod view;

pub use app::{App, Outcome};
pub use error::Error;

/// Re-exports of [`docchat_core`] crate.
pub mod core {
    pub use docchat_core::*;
}
