//! Core types, configuration, and error handling for scribe.
//!
//! This crate provides the shared foundation used by the other scribe crates:
//! - [`ScribeError`] — unified error type using `thiserror` and `miette`
//! - [`ScribeConfig`] — configuration from `.scribe.toml` and `SCRIBE_*` variables
//! - Shared types: [`ChangeKind`], [`ChangeRecord`], [`DigestBudget`]

mod config;
mod error;
mod types;

pub use config::{CommitConfig, LlmConfig, ScribeConfig, CONFIG_FILE_NAME};
pub use error::ScribeError;
pub use types::{ChangeKind, ChangeRecord, DigestBudget, CHARS_PER_TOKEN};

/// A convenience `Result` type for scribe operations.
pub type Result<T> = std::result::Result<T, ScribeError>;
