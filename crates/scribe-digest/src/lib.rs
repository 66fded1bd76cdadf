//! Budgeted digests of large unified diffs.
//!
//! Turns a raw `git diff` plus its `--name-status` listing into one
//! bounded-size text that lists every changed file, keeps the shape of the
//! change set, and carries representative diff content per file:
//!
//! - [`parser`] splits the diff into per-file [`ChangeRecord`]s
//! - [`budget`] divides the token budget evenly across files
//! - [`select`] picks each file's content, favouring declaration lines
//! - [`compose`] assembles the final text and a [`compose::DigestReport`]
//!
//! Everything here is pure and synchronous; nothing in this crate fails.
//!
//! [`ChangeRecord`]: scribe_core::ChangeRecord

pub mod budget;
pub mod compose;
pub mod parser;
pub mod select;

pub use compose::{Digest, DigestReport};

/// Parse `raw_diff` and `status_listing` and compose their digest.
///
/// # Examples
///
/// ```
/// let diff = "diff --git a/foo/a.go b/foo/a.go\n@@ -1 +1 @@\n-x\n+y\n";
/// let digest = scribe_digest::build_digest(diff, "M\tfoo/a.go\n", 1000);
/// assert!(digest.text.contains("Commit includes 1 files:"));
/// assert!(digest.text.contains(diff));
/// ```
pub fn build_digest(raw_diff: &str, status_listing: &str, total_budget: usize) -> Digest {
    let records = parser::parse_change_records(raw_diff, status_listing);
    compose::compose(&records, total_budget)
}
