use std::collections::{HashMap, HashSet};

use scribe_core::{ChangeKind, ChangeRecord};

const HEADER_PREFIX: &str = "diff --git ";

/// One file's slice of a raw unified diff.
///
/// `text` starts at the `diff --git` header and runs up to the next header
/// or the end of input, line terminators included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffSegment<'a> {
    /// Path on the `b/` side of the header, when it could be parsed.
    pub new_path: Option<&'a str>,
    /// Exact text of the segment.
    pub text: &'a str,
}

impl DiffSegment<'_> {
    /// Returns `true` if the segment carries a binary-file marker line.
    pub fn is_binary(&self) -> bool {
        self.text
            .lines()
            .any(|line| line.starts_with("Binary files ") || line == "GIT binary patch")
    }
}

/// Split a raw diff into per-file segments in a single pass.
///
/// Every line starting with `diff --git ` opens a segment, even when its
/// paths cannot be parsed. Text before the first header is not part of any
/// segment.
///
/// # Examples
///
/// ```
/// use scribe_digest::parser::split_segments;
///
/// let diff = "diff --git a/a.rs b/a.rs\n+x\ndiff --git a/b.rs b/b.rs\n+y\n";
/// let segments = split_segments(diff);
/// assert_eq!(segments.len(), 2);
/// assert_eq!(segments[1].new_path, Some("b.rs"));
/// assert_eq!(segments[1].text, "diff --git a/b.rs b/b.rs\n+y\n");
/// ```
pub fn split_segments(raw_diff: &str) -> Vec<DiffSegment<'_>> {
    let mut headers: Vec<(usize, Option<&str>)> = Vec::new();
    let mut offset = 0;

    for line in raw_diff.split_inclusive('\n') {
        let content = line.strip_suffix('\n').unwrap_or(line);
        let content = content.strip_suffix('\r').unwrap_or(content);
        if content.starts_with(HEADER_PREFIX) {
            headers.push((offset, header_new_path(content)));
        }
        offset += line.len();
    }

    headers
        .iter()
        .enumerate()
        .map(|(i, &(start, new_path))| {
            let end = headers
                .get(i + 1)
                .map_or(raw_diff.len(), |&(next, _)| next);
            DiffSegment {
                new_path,
                text: &raw_diff[start..end],
            }
        })
        .collect()
}

/// Extract the `b/` path from a `diff --git a/<old> b/<new>` header.
///
/// The last ` b/` on the line separates the two paths, like a greedy
/// match would. Quotes git adds around either path are removed.
fn header_new_path(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(HEADER_PREFIX)?;

    let quoted = rest.strip_suffix('"').and_then(|quoted| {
        let idx = quoted.rfind(" \"b/")?;
        let path = &quoted[idx + 4..];
        (idx > 0 && !path.is_empty()).then_some(path)
    });
    if quoted.is_some() {
        return quoted;
    }

    // Only the old path quoted: `"a/<old>" b/<new>`.
    if rest.starts_with("\"a/") {
        let idx = rest.rfind("\" b/")?;
        let path = &rest[idx + 4..];
        return (idx > 0 && !path.is_empty()).then_some(path);
    }

    let rest = rest.strip_prefix("a/")?;
    let idx = rest.rfind(" b/")?;
    let path = &rest[idx + 3..];
    (idx > 0 && !path.is_empty()).then_some(path)
}

/// Segments indexed by path for constant-time lookup.
///
/// Exact path matches win over suffix matches, and among candidates of the
/// same kind the earliest segment in the diff wins.
#[derive(Debug)]
pub struct SegmentIndex<'a> {
    segments: Vec<DiffSegment<'a>>,
    exact: HashMap<&'a str, usize>,
    suffix: HashMap<&'a str, usize>,
}

impl<'a> SegmentIndex<'a> {
    /// Index every segment of `raw_diff`.
    pub fn build(raw_diff: &'a str) -> Self {
        let segments = split_segments(raw_diff);
        let mut exact = HashMap::new();
        let mut suffix = HashMap::new();

        for (idx, segment) in segments.iter().enumerate() {
            let Some(new_path) = segment.new_path else {
                continue;
            };
            exact.entry(new_path).or_insert(idx);
            for (pos, _) in new_path.match_indices('/') {
                let tail = &new_path[pos + 1..];
                if !tail.is_empty() {
                    suffix.entry(tail).or_insert(idx);
                }
            }
        }

        Self {
            segments,
            exact,
            suffix,
        }
    }

    /// Find the segment for a status-listing path.
    ///
    /// Matches the header path exactly, or else a header path ending in
    /// `/<path>` to tolerate prefix differences between the two listings.
    ///
    /// # Examples
    ///
    /// ```
    /// use scribe_digest::parser::SegmentIndex;
    ///
    /// let diff = "diff --git a/pkg/a.go b/pkg/a.go\n+x\n";
    /// let index = SegmentIndex::build(diff);
    /// assert!(index.lookup("pkg/a.go").is_some());
    /// assert!(index.lookup("a.go").is_some());
    /// assert!(index.lookup("g/a.go").is_none());
    /// ```
    pub fn lookup(&self, path: &str) -> Option<&DiffSegment<'a>> {
        self.exact
            .get(path)
            .or_else(|| self.suffix.get(path))
            .map(|&idx| &self.segments[idx])
    }

    /// Number of segments found in the diff.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the diff had no file headers.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// A well-formed `--name-status` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEntry<'a> {
    /// Status code such as `M` or `R100`.
    pub code: &'a str,
    /// Path the change is recorded under (the new path for renames).
    pub path: &'a str,
}

/// Parse one status line of the form `<code>\t<path>` or
/// `<code>\t<old>\t<new>`.
///
/// Returns `None` for blank lines, lines with any other field count, and
/// lines with an empty code or path.
///
/// # Examples
///
/// ```
/// use scribe_digest::parser::parse_status_line;
///
/// let entry = parse_status_line("R100\told/x.py\tnew/x.py").unwrap();
/// assert_eq!(entry.code, "R100");
/// assert_eq!(entry.path, "new/x.py");
/// assert!(parse_status_line("M no-tab-here").is_none());
/// ```
pub fn parse_status_line(line: &str) -> Option<StatusEntry<'_>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let fields: Vec<&str> = line.split('\t').collect();
    let (code, path) = match fields.as_slice() {
        [code, path] => (*code, *path),
        [code, _old, new] => (*code, *new),
        _ => return None,
    };

    let code = code.trim();
    if code.is_empty() || path.is_empty() {
        return None;
    }
    Some(StatusEntry { code, path })
}

/// Build one [`ChangeRecord`] per status-listing entry.
///
/// Records keep status-listing order. Each record's diff text is located
/// through a [`SegmentIndex`] built once for the whole diff. Entries without
/// a matching segment keep an empty diff, malformed status lines are
/// skipped, and a path listed twice yields only the first record.
///
/// # Examples
///
/// ```
/// use scribe_core::ChangeKind;
/// use scribe_digest::parser::parse_change_records;
///
/// let diff = "diff --git a/foo/a.go b/foo/a.go\n@@ -1 +1 @@\n-a\n+b\n";
/// let records = parse_change_records(diff, "M\tfoo/a.go\n");
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].kind, ChangeKind::Modified);
/// assert_eq!(records[0].diff_text, diff);
/// ```
pub fn parse_change_records(raw_diff: &str, status_listing: &str) -> Vec<ChangeRecord> {
    let index = SegmentIndex::build(raw_diff);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut records = Vec::new();

    for line in status_listing.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(entry) = parse_status_line(line) else {
            continue;
        };
        if !seen.insert(entry.path) {
            continue;
        }

        let segment = index.lookup(entry.path);
        records.push(ChangeRecord {
            path: entry.path.to_string(),
            kind: ChangeKind::from_status_code(entry.code),
            is_binary: segment.is_some_and(|s| s.is_binary()),
            diff_text: segment.map(|s| s.text.to_string()).unwrap_or_default(),
        });
    }

    records
}
