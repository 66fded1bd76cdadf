use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use scribe_core::ScribeError;

/// Flags for the staged patch fed to the model and to the digest parser.
const DIFF_ARGS: &[&str] = &[
    "diff",
    "--staged",
    "--patch",
    "--unified=0",
    "--no-color",
    "--no-ext-diff",
    "--ignore-space-change",
    "--ignore-all-space",
    "--ignore-blank-lines",
];

const STATUS_ARGS: &[&str] = &["diff", "--staged", "--name-status"];

/// Find the working tree root of the repository containing `dir`.
///
/// # Errors
///
/// Returns [`ScribeError::Git`] if `dir` is not inside a git repository or
/// the repository has no working tree.
pub fn find_repo_root(dir: &Path) -> Result<PathBuf, ScribeError> {
    let repo = git2::Repository::discover(dir)
        .map_err(|e| ScribeError::Git(format!("not inside a git repository: {}", e.message())))?;
    repo.workdir()
        .map(Path::to_path_buf)
        .ok_or_else(|| ScribeError::Git("bare repositories have no staged changes".into()))
}

/// Staged diff and name-status listing, captured together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedChanges {
    /// Patch text from `git diff --staged --patch --unified=0 ...`.
    pub diff: String,
    /// Output of `git diff --staged --name-status`.
    pub status: String,
}

impl StagedChanges {
    /// Number of non-blank lines in the status listing.
    ///
    /// # Examples
    ///
    /// ```
    /// use scribe_commit::git::StagedChanges;
    ///
    /// let changes = StagedChanges {
    ///     diff: String::new(),
    ///     status: "M\tsrc/a.rs\nA\tsrc/b.rs\n\n".into(),
    /// };
    /// assert_eq!(changes.file_count(), 2);
    /// ```
    pub fn file_count(&self) -> usize {
        self.status.lines().filter(|l| !l.trim().is_empty()).count()
    }

    /// `true` when nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }
}

/// Thin wrapper over the `git` executable, scoped to one repository.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    /// Staged patch with zero context lines and whitespace changes ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::Git`] if git fails.
    pub fn staged_diff(&self) -> Result<String, ScribeError> {
        self.run(DIFF_ARGS)
    }

    /// Staged `--name-status` listing.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::Git`] if git fails.
    pub fn staged_status(&self) -> Result<String, ScribeError> {
        self.run(STATUS_ARGS)
    }

    /// Both the staged listing and, when anything is staged, the patch.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::Git`] if either git call fails.
    pub fn staged_changes(&self) -> Result<StagedChanges, ScribeError> {
        let status = self.staged_status()?;
        if status.trim().is_empty() {
            return Ok(StagedChanges::default());
        }
        let diff = self.staged_diff()?;
        Ok(StagedChanges { diff, status })
    }

    /// Commit the index with `message`, passed to `git commit -F -` on stdin.
    ///
    /// Returns git's stdout on success.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::Git`] carrying git's stderr if the commit fails.
    pub fn commit(&self, message: &str) -> Result<String, ScribeError> {
        let mut child = self
            .command(&["commit", "-F", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ScribeError::Git(format!("failed to run git commit: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(message.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(ScribeError::Git(format!(
                "git commit failed: {}",
                detail.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo_root).args(args);
        cmd
    }

    fn run(&self, args: &[&str]) -> Result<String, ScribeError> {
        let output = self
            .command(args)
            .output()
            .map_err(|e| ScribeError::Git(format!("failed to run git {}: {e}", args[0])))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScribeError::Git(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
