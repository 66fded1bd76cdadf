use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Approximate number of characters per token used for size estimates.
pub const CHARS_PER_TOKEN: usize = 4;

/// Classification of a changed file, derived from a git status code.
///
/// # Examples
///
/// ```
/// use scribe_core::ChangeKind;
///
/// assert_eq!(ChangeKind::from_status_code("A"), ChangeKind::Added);
/// assert_eq!(ChangeKind::from_status_code("R100"), ChangeKind::Renamed);
/// assert_eq!(format!("{}", ChangeKind::Deleted), "Deleted");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// File added to the index.
    Added,
    /// File contents changed in place.
    Modified,
    /// File removed.
    Deleted,
    /// File moved to a new path, possibly with edits.
    Renamed,
}

impl ChangeKind {
    /// Map a `--name-status` code such as `M`, `A`, `D` or `R100`.
    ///
    /// Only the first letter is significant. Anything unrecognised,
    /// including copies (`C`) and type changes (`T`), is `Modified`.
    pub fn from_status_code(code: &str) -> Self {
        match code.chars().next() {
            Some('A') => ChangeKind::Added,
            Some('D') => ChangeKind::Deleted,
            Some('R') => ChangeKind::Renamed,
            _ => ChangeKind::Modified,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "Added"),
            ChangeKind::Modified => write!(f, "Modified"),
            ChangeKind::Deleted => write!(f, "Deleted"),
            ChangeKind::Renamed => write!(f, "Renamed"),
        }
    }
}

impl FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "added" => Ok(ChangeKind::Added),
            "modified" => Ok(ChangeKind::Modified),
            "deleted" => Ok(ChangeKind::Deleted),
            "renamed" => Ok(ChangeKind::Renamed),
            other => Err(format!("unknown change kind: {other}")),
        }
    }
}

/// One changed file: its classification plus the slice of the raw diff
/// that belongs to it.
///
/// # Examples
///
/// ```
/// use scribe_core::{ChangeKind, ChangeRecord};
///
/// let record = ChangeRecord {
///     path: "src/lib.rs".into(),
///     kind: ChangeKind::Modified,
///     is_binary: false,
///     diff_text: String::new(),
/// };
/// assert!(!record.has_diff());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    /// Repository-relative path (the new path for renames).
    pub path: String,
    /// How the file changed.
    pub kind: ChangeKind,
    /// Whether the diff segment carries a binary-file marker.
    pub is_binary: bool,
    /// The file's segment of the raw diff, starting at its `diff --git`
    /// header. Empty when no segment was found.
    pub diff_text: String,
}

impl ChangeRecord {
    /// Returns `true` if a diff segment was located for this file.
    pub fn has_diff(&self) -> bool {
        !self.diff_text.is_empty()
    }

    /// Estimated token cost of the diff segment.
    pub fn estimated_tokens(&self) -> usize {
        self.diff_text.len() / CHARS_PER_TOKEN
    }

    /// First path segment, or `"root"` for files at the repository root.
    ///
    /// # Examples
    ///
    /// ```
    /// use scribe_core::{ChangeKind, ChangeRecord};
    ///
    /// let mut record = ChangeRecord {
    ///     path: "src/parser/mod.rs".into(),
    ///     kind: ChangeKind::Added,
    ///     is_binary: false,
    ///     diff_text: String::new(),
    /// };
    /// assert_eq!(record.top_level_dir(), "src");
    /// record.path = "README.md".into();
    /// assert_eq!(record.top_level_dir(), "root");
    /// ```
    pub fn top_level_dir(&self) -> &str {
        match self.path.split_once('/') {
            Some((first, _)) => first,
            None => "root",
        }
    }
}

/// Token budget for one digest run.
///
/// `per_file` is what each file section may spend on diff content;
/// see `scribe_digest::budget::allocate` for how it is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestBudget {
    /// Budget supplied by the caller.
    pub total: usize,
    /// Number of files sharing the content budget.
    pub file_count: usize,
    /// Per-file content budget in tokens.
    pub per_file: usize,
}

impl DigestBudget {
    /// Per-file budget expressed in characters.
    ///
    /// # Examples
    ///
    /// ```
    /// use scribe_core::DigestBudget;
    ///
    /// let budget = DigestBudget { total: 40, file_count: 10, per_file: 3 };
    /// assert_eq!(budget.char_budget(), 12);
    /// ```
    pub fn char_budget(&self) -> usize {
        self.per_file.saturating_mul(CHARS_PER_TOKEN)
    }
}
