/// Errors that can occur across scribe.
///
/// The digest engine itself never fails; these cover configuration and the
/// collaborators around it (git, templates, the LLM endpoint). The binary
/// renders them through `miette`.
///
/// # Examples
///
/// ```
/// use scribe_core::ScribeError;
///
/// let err = ScribeError::Config("missing API key".into());
/// assert!(err.to_string().contains("missing API key"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ScribeError {
    /// Filesystem or process I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(help("check .scribe.toml and the SCRIBE_* environment variables"))]
    Config(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    Git(String),

    /// Prompt template lookup or rendering failure.
    #[error("template error: {0}")]
    Template(String),

    /// LLM API or response error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// The LLM request exceeded the configured timeout.
    #[error("LLM request timed out after {0}s")]
    #[diagnostic(help("raise SCRIBE_TIMEOUT_SECONDS or [llm] timeout_seconds"))]
    Timeout(u64),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
