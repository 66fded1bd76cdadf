use std::collections::BTreeMap;
use std::fmt::{self, Write};

use scribe_core::{ChangeKind, ChangeRecord, DigestBudget};
use serde::Serialize;

use crate::budget;
use crate::select::{self, Selection};

/// A composed digest together with what went into it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Digest {
    /// The digest text, ready to embed in a prompt.
    pub text: String,
    /// Statistics about the run.
    pub report: DigestReport,
}

/// Statistics about one digest run.
///
/// Returned instead of logged so callers decide what to show.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestReport {
    /// Budget split; `None` when there were no files to allocate for.
    pub budget: Option<DigestBudget>,
    /// Files per change kind.
    pub counts: KindCounts,
    /// Per-file outcome, in record order.
    pub files: Vec<FileReport>,
    /// Length of the digest text in bytes.
    pub output_chars: usize,
}

impl DigestReport {
    /// Number of files whose diff was cut down.
    pub fn truncated_files(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.selection, Selection::Truncated { .. }))
            .count()
    }

    /// Number of files for which no diff segment was found.
    pub fn missing_diffs(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.selection == Selection::Missing)
            .count()
    }
}

/// Outcome for a single file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: String,
    pub kind: ChangeKind,
    /// Estimated tokens of the full diff segment.
    pub estimated_tokens: usize,
    #[serde(flatten)]
    pub selection: Selection,
    /// Length of the emitted fragment in bytes.
    pub fragment_chars: usize,
}

/// Files per change kind, plus binary files across kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
    pub renamed: usize,
    pub binary: usize,
}

impl KindCounts {
    /// Tally `records`.
    ///
    /// # Examples
    ///
    /// ```
    /// use scribe_core::{ChangeKind, ChangeRecord};
    /// use scribe_digest::compose::KindCounts;
    ///
    /// let records = vec![ChangeRecord {
    ///     path: "logo.png".into(),
    ///     kind: ChangeKind::Added,
    ///     is_binary: true,
    ///     diff_text: String::new(),
    /// }];
    /// let counts = KindCounts::tally(&records);
    /// assert_eq!(counts.added, 1);
    /// assert_eq!(counts.binary, 1);
    /// ```
    pub fn tally(records: &[ChangeRecord]) -> Self {
        let mut counts = Self::default();
        for record in records {
            match record.kind {
                ChangeKind::Added => counts.added += 1,
                ChangeKind::Modified => counts.modified += 1,
                ChangeKind::Deleted => counts.deleted += 1,
                ChangeKind::Renamed => counts.renamed += 1,
            }
            if record.is_binary {
                counts.binary += 1;
            }
        }
        counts
    }
}

/// Count files per top-level directory, ordered by directory name.
pub fn group_by_directory(records: &[ChangeRecord]) -> BTreeMap<&str, usize> {
    let mut groups = BTreeMap::new();
    for record in records {
        *groups.entry(record.top_level_dir()).or_insert(0) += 1;
    }
    groups
}

/// Assemble the digest for `records` within `total_budget` tokens.
///
/// The text contains, in order: the file count, per-kind counts, a
/// directory breakdown (only when files span more than one top-level
/// directory), a flat `Kind: path` listing, and one section per record
/// holding the fragment chosen by [`select::select_fragment`]. Output is
/// deterministic for identical input.
///
/// # Examples
///
/// ```
/// use scribe_core::{ChangeKind, ChangeRecord};
/// use scribe_digest::compose::compose;
///
/// let records = vec![ChangeRecord {
///     path: "foo/a.go".into(),
///     kind: ChangeKind::Modified,
///     is_binary: false,
///     diff_text: "diff --git a/foo/a.go b/foo/a.go\n-a\n+b\n".into(),
/// }];
/// let digest = compose(&records, 1000);
/// assert!(digest.text.starts_with("Commit includes 1 files:\n"));
/// assert!(digest.text.contains("### Modified: foo/a.go\n"));
/// assert_eq!(digest.report.budget.unwrap().per_file, 800);
/// ```
pub fn compose(records: &[ChangeRecord], total_budget: usize) -> Digest {
    let mut text = String::new();
    let counts = KindCounts::tally(records);

    let _ = writeln!(text, "Commit includes {} files:", records.len());
    let _ = writeln!(text, "- Added: {}", counts.added);
    let _ = writeln!(text, "- Modified: {}", counts.modified);
    let _ = writeln!(text, "- Deleted: {}", counts.deleted);
    if counts.renamed > 0 {
        let _ = writeln!(text, "- Renamed: {}", counts.renamed);
    }
    if counts.binary > 0 {
        let _ = writeln!(text, "- Binary files: {}", counts.binary);
    }

    if records.is_empty() {
        return Digest {
            report: DigestReport {
                budget: None,
                counts,
                files: Vec::new(),
                output_chars: text.len(),
            },
            text,
        };
    }

    let groups = group_by_directory(records);
    if groups.len() > 1 {
        text.push_str("\nChanges by directory:\n");
        for (dir, count) in &groups {
            let _ = writeln!(text, "- {dir}: {count} files");
        }
    }

    text.push_str("\nChanged files:\n");
    for record in records {
        let _ = writeln!(text, "- {}: {}", record.kind, record.path);
    }

    let budget = budget::allocate(total_budget, records.len());
    let mut files = Vec::with_capacity(records.len());

    text.push_str("\nSelected diff content:\n");
    for record in records {
        let fragment = select::select_fragment(record, &budget);
        let _ = writeln!(text, "\n### {}: {}", record.kind, record.path);
        text.push_str(&fragment.text);

        files.push(FileReport {
            path: record.path.clone(),
            kind: record.kind,
            estimated_tokens: record.estimated_tokens(),
            selection: fragment.selection,
            fragment_chars: fragment.text.len(),
        });
    }

    Digest {
        report: DigestReport {
            budget: Some(budget),
            counts,
            files,
            output_chars: text.len(),
        },
        text,
    }
}

impl fmt::Display for DigestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.budget {
            Some(budget) => writeln!(
                f,
                "Digest: total tokens={}, files={}, tokens per file={}",
                budget.total, budget.file_count, budget.per_file
            )?,
            None => writeln!(f, "Digest: no files")?,
        }
        for (i, file) in self.files.iter().enumerate() {
            let outcome = match file.selection {
                Selection::Binary => "binary".to_string(),
                Selection::Deleted => "deleted".to_string(),
                Selection::Missing => "no diff".to_string(),
                Selection::Verbatim => "full".to_string(),
                Selection::Truncated { found, kept } => {
                    format!("truncated, {kept}/{found} chunks")
                }
            };
            writeln!(
                f,
                "  {}. {} - est. tokens: {} ({outcome})",
                i + 1,
                file.path,
                file.estimated_tokens
            )?;
        }
        write!(
            f,
            "Generated summary of {} characters ({} truncated, {} without diff)",
            self.output_chars,
            self.truncated_files(),
            self.missing_diffs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, kind: ChangeKind, diff: &str) -> ChangeRecord {
        ChangeRecord {
            path: path.into(),
            kind,
            is_binary: false,
            diff_text: diff.into(),
        }
    }

    fn listing_lines(text: &str) -> Vec<&str> {
        let start = text.find("\nChanged files:\n").unwrap() + "\nChanged files:\n".len();
        let end = text.find("\nSelected diff content:\n").unwrap();
        text[start..end].lines().collect()
    }

    fn section_headers(text: &str) -> Vec<&str> {
        text.lines().filter(|l| l.starts_with("### ")).collect()
    }

    #[test]
    fn header_counts_always_show_core_kinds() {
        let records = vec![record("a.rs", ChangeKind::Modified, "")];
        let digest = compose(&records, 1000);
        assert!(digest.text.contains("- Added: 0\n"));
        assert!(digest.text.contains("- Modified: 1\n"));
        assert!(digest.text.contains("- Deleted: 0\n"));
        assert!(!digest.text.contains("Renamed:"));
        assert!(!digest.text.contains("Binary files:"));
    }

    #[test]
    fn renamed_and_binary_counts_when_present() {
        let mut bin = record("img/a.png", ChangeKind::Added, "");
        bin.is_binary = true;
        let records = vec![bin, record("src/b.rs", ChangeKind::Renamed, "")];
        let digest = compose(&records, 1000);
        assert!(digest.text.contains("- Renamed: 1\n"));
        assert!(digest.text.contains("- Binary files: 1\n"));
    }

    #[test]
    fn directory_grouping_only_with_multiple_groups() {
        let single = vec![
            record("src/a.rs", ChangeKind::Modified, ""),
            record("src/b.rs", ChangeKind::Modified, ""),
        ];
        assert!(!compose(&single, 100).text.contains("Changes by directory:"));

        let multi = vec![
            record("src/a.rs", ChangeKind::Modified, ""),
            record("README.md", ChangeKind::Modified, ""),
            record("docs/x.md", ChangeKind::Added, ""),
            record("src/b.rs", ChangeKind::Modified, ""),
        ];
        let text = compose(&multi, 100).text;
        assert!(text.contains("\nChanges by directory:\n- docs: 1 files\n- root: 1 files\n- src: 2 files\n"));
    }

    #[test]
    fn one_listing_line_and_section_per_record_in_order() {
        let records = vec![
            record("z/last.rs", ChangeKind::Added, "diff --git a/z/last.rs b/z/last.rs\n+x\n"),
            record("a/first.rs", ChangeKind::Deleted, "diff --git a/a/first.rs b/a/first.rs\n-x\n"),
            record("m.rs", ChangeKind::Renamed, ""),
        ];
        let text = compose(&records, 500).text;
        assert_eq!(
            listing_lines(&text),
            vec!["- Added: z/last.rs", "- Deleted: a/first.rs", "- Renamed: m.rs"]
        );
        assert_eq!(
            section_headers(&text),
            vec!["### Added: z/last.rs", "### Deleted: a/first.rs", "### Renamed: m.rs"]
        );
    }

    #[test]
    fn small_diff_reproduced_verbatim() {
        let diff = "diff --git a/foo/a.go b/foo/a.go\n@@ -1,3 +1,3 @@\n-a\n-b\n-c\n+a2\n+b2\n+c2\n";
        let records = vec![record("foo/a.go", ChangeKind::Modified, diff)];
        let text = compose(&records, 1000).text;
        assert!(text.contains(&format!("### Modified: foo/a.go\n{diff}")));
    }

    #[test]
    fn deleted_and_binary_sections_have_no_content() {
        let mut bin = record("a.png", ChangeKind::Modified, "diff --git a/a.png b/a.png\nBinary files a/a.png and b/a.png differ\n");
        bin.is_binary = true;
        let del = record("old.py", ChangeKind::Deleted, "diff --git a/old.py b/old.py\n-def secret():\n");
        let text = compose(&[bin, del], 100_000).text;
        assert!(!text.contains("Binary files a/a.png"));
        assert!(!text.contains("def secret"));
        assert!(text.contains("File was deleted.\n"));
    }

    #[test]
    fn empty_records_give_zero_header_and_no_sections() {
        let digest = compose(&[], 1000);
        assert!(digest.text.starts_with("Commit includes 0 files:\n"));
        assert!(section_headers(&digest.text).is_empty());
        assert!(!digest.text.contains("Changed files:"));
        assert!(digest.report.budget.is_none());
        assert!(digest.report.files.is_empty());
    }

    #[test]
    fn compose_is_deterministic() {
        let records: Vec<ChangeRecord> = (0..20)
            .map(|i| {
                record(
                    &format!("dir{}/f{i}.rs", i % 7),
                    ChangeKind::Modified,
                    &format!("diff --git a/f b/f\n+line {i}\n"),
                )
            })
            .collect();
        let first = compose(&records, 300);
        let second = compose(&records, 300);
        assert_eq!(first.text, second.text);
    }

    #[test]
    fn report_tracks_outcomes() {
        let big = format!(
            "diff --git a/big.rs b/big.rs\n{}",
            "+let x = 1;\n".repeat(50)
        );
        let records = vec![
            record("big.rs", ChangeKind::Modified, &big),
            record("none.rs", ChangeKind::Modified, ""),
        ];
        let digest = compose(&records, 10);
        assert_eq!(digest.report.truncated_files(), 1);
        assert_eq!(digest.report.missing_diffs(), 1);
        assert_eq!(digest.report.output_chars, digest.text.len());
        assert_eq!(digest.report.files[0].estimated_tokens, big.len() / 4);

        let shown = digest.report.to_string();
        assert!(shown.contains("tokens per file=4"));
        assert!(shown.contains("1. big.rs"));
    }

    #[test]
    fn report_serializes_camel_case() {
        let records = vec![record("a.rs", ChangeKind::Added, "diff --git a/a.rs b/a.rs\n+x\n")];
        let json = serde_json::to_value(compose(&records, 100).report).unwrap();
        assert_eq!(json["files"][0]["outcome"], "verbatim");
        assert_eq!(json["files"][0]["estimatedTokens"], 7);
        assert_eq!(json["budget"]["perFile"], 80);
    }
}
