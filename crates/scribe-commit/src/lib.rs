//! Commit message generation around the digest engine.
//!
//! - [`git`] reads staged changes and performs the commit
//! - [`prompt`] renders the built-in templates and sizes the prompt
//! - [`llm`] talks to an OpenRouter-compatible chat completions endpoint
//! - [`pipeline`] ties them together into prepare / generate steps

pub mod git;
pub mod llm;
pub mod pipeline;
pub mod prompt;
