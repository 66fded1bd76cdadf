use std::ops::Range;

use scribe_core::{ChangeKind, ChangeRecord, DigestBudget};
use serde::Serialize;

/// Lines of a truncated diff that are always kept verbatim.
pub const HEAD_LINES: usize = 5;
/// Maximum number of important chunks emitted per file.
pub const MAX_CHUNKS: usize = 3;
/// Non-important lines tolerated between two important lines of a chunk.
pub const MAX_GAP: usize = 4;

pub const TRUNCATION_MARKER: &str = "... (diff truncated) ...";
pub const CHUNK_SEPARATOR: &str = "---";

/// Declaration forms across common languages.
pub const DECLARATION_KEYWORDS: &[&str] = &[
    "func", "def", "fn", "function", "class", "struct", "enum", "trait", "impl", "interface",
    "export", "void", "pub",
];

/// Import and include forms across common languages.
pub const IMPORT_KEYWORDS: &[&str] = &["import", "from", "require", "use", "using", "#include"];

/// How a file's fragment was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Selection {
    /// Binary file; content never read.
    Binary,
    /// Deleted file; content never read.
    Deleted,
    /// No diff segment was found for the file.
    Missing,
    /// The whole diff was included.
    Verbatim,
    /// Head lines plus up to [`MAX_CHUNKS`] important chunks.
    Truncated {
        /// Multi-line important chunks found after the head.
        found: usize,
        /// Chunks actually emitted.
        kept: usize,
    },
}

/// Digest text for one file, excluding its section header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub selection: Selection,
}

/// Decide what part of a file's diff goes into the digest.
///
/// Binary and deleted files get a one-line marker without their content
/// being inspected. Diffs within `budget.char_budget()` are copied
/// verbatim. Larger diffs keep their first [`HEAD_LINES`] lines, a
/// truncation marker, and the first [`MAX_CHUNKS`] important chunks found
/// in the remaining lines. The result may still exceed the budget; this is
/// a size reduction heuristic, not a hard cap.
///
/// # Examples
///
/// ```
/// use scribe_core::{ChangeKind, ChangeRecord, DigestBudget};
/// use scribe_digest::select::{select_fragment, Selection};
///
/// let record = ChangeRecord {
///     path: "a.go".into(),
///     kind: ChangeKind::Modified,
///     is_binary: false,
///     diff_text: "diff --git a/a.go b/a.go\n+x\n".into(),
/// };
/// let budget = DigestBudget { total: 1000, file_count: 1, per_file: 800 };
/// let fragment = select_fragment(&record, &budget);
/// assert_eq!(fragment.selection, Selection::Verbatim);
/// assert_eq!(fragment.text, record.diff_text);
/// ```
pub fn select_fragment(record: &ChangeRecord, budget: &DigestBudget) -> Fragment {
    if record.is_binary {
        return Fragment {
            text: format!("Binary file {} ({}); content omitted.\n", record.path, record.kind),
            selection: Selection::Binary,
        };
    }
    if record.kind == ChangeKind::Deleted {
        return Fragment {
            text: "File was deleted.\n".to_string(),
            selection: Selection::Deleted,
        };
    }
    if !record.has_diff() {
        return Fragment {
            text: "(No diff content available)\n".to_string(),
            selection: Selection::Missing,
        };
    }

    let diff = record.diff_text.as_str();
    if diff.len() <= budget.char_budget() {
        return verbatim(diff);
    }

    let lines: Vec<&str> = diff.lines().collect();
    if lines.len() <= HEAD_LINES {
        return verbatim(diff);
    }

    let mut text = lines[..HEAD_LINES].join("\n");
    text.push('\n');
    text.push_str(TRUNCATION_MARKER);
    text.push('\n');

    let rest = &lines[HEAD_LINES..];
    let chunks = find_important_chunks(rest);
    let kept = chunks.len().min(MAX_CHUNKS);

    if kept > 0 {
        text.push_str("\nImportant changes:\n");
        for range in chunks.iter().take(MAX_CHUNKS) {
            text.push_str(&rest[range.clone()].join("\n"));
            text.push('\n');
            text.push_str(CHUNK_SEPARATOR);
            text.push('\n');
        }
    }

    Fragment {
        text,
        selection: Selection::Truncated {
            found: chunks.len(),
            kept,
        },
    }
}

fn verbatim(diff: &str) -> Fragment {
    let mut text = diff.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Fragment {
        text,
        selection: Selection::Verbatim,
    }
}

/// Returns `true` for an added or removed line that opens with a
/// declaration or import keyword.
///
/// The keyword must follow the `+`/`-` marker directly and end on a word
/// boundary, so `+import x` matches but `+  import x` and `+imported` do not.
///
/// # Examples
///
/// ```
/// use scribe_digest::select::is_important_line;
///
/// assert!(is_important_line("+func main() {"));
/// assert!(is_important_line("-import os"));
/// assert!(!is_important_line(" def context_line():"));
/// assert!(!is_important_line("+++ b/main.go"));
/// ```
pub fn is_important_line(line: &str) -> bool {
    let Some(body) = line.strip_prefix('+').or_else(|| line.strip_prefix('-')) else {
        return false;
    };
    DECLARATION_KEYWORDS
        .iter()
        .chain(IMPORT_KEYWORDS)
        .any(|keyword| starts_with_word(body, keyword))
}

fn starts_with_word(text: &str, word: &str) -> bool {
    text.strip_prefix(word)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
}

/// Group important lines into chunks, in diff order.
///
/// A chunk runs from its first to its last important line. It stays open
/// while the gap to the next important line is at most [`MAX_GAP`] lines.
/// Chunks covering a single line are dropped.
///
/// # Examples
///
/// ```
/// use scribe_digest::select::find_important_chunks;
///
/// let lines = ["+import os", "+import sys", " x", "+y"];
/// assert_eq!(find_important_chunks(&lines), vec![0..2]);
/// ```
pub fn find_important_chunks(lines: &[&str]) -> Vec<Range<usize>> {
    let mut chunks = Vec::new();
    let mut open: Option<(usize, usize)> = None;

    for (i, line) in lines.iter().enumerate() {
        if !is_important_line(line) {
            continue;
        }
        open = match open {
            Some((start, last)) if i - last - 1 <= MAX_GAP => Some((start, i)),
            Some((start, last)) => {
                if last > start {
                    chunks.push(start..last + 1);
                }
                Some((i, i))
            }
            None => Some((i, i)),
        };
    }

    if let Some((start, last)) = open {
        if last > start {
            chunks.push(start..last + 1);
        }
    }

    chunks
}
