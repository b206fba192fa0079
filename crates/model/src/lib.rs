//! An abstraction layer for multimodal generation models.
//!
//! This crate establishes an unified protocol for the assistant to talk
//! to a remote model: an ordered list of text and binary parts goes in,
//! a stream of text deltas comes out. Swapping one provider for another
//! doesn't touch the conversation logic.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
