use std::fmt;
use std::time::Duration;

use scribe_core::{ScribeConfig, ScribeError};
use scribe_digest::DigestReport;
use serde::Serialize;

use crate::git::StagedChanges;
use crate::llm::{ChatMessage, LlmClient};
use crate::prompt;

/// Statistics about one message generation run.
///
/// # Examples
///
/// ```
/// use scribe_commit::pipeline::CommitStats;
///
/// let stats = CommitStats {
///     files: 2,
///     digest: None,
///     diff_chars: 120,
///     template: "simple".into(),
///     prompt_tokens: 40,
///     prompt_truncated: false,
///     model_used: "openai/gpt-4o-mini".into(),
/// };
/// assert!(!stats.digest_used());
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitStats {
    /// Files in the staged listing.
    pub files: usize,
    /// Digest report when the change set was summarized.
    pub digest: Option<DigestReport>,
    /// Length in bytes of the change content handed to the template.
    pub diff_chars: usize,
    /// Template used to build the prompt.
    pub template: String,
    /// Estimated prompt tokens after truncation.
    pub prompt_tokens: usize,
    /// Whether the prompt was cut to fit the input limit.
    pub prompt_truncated: bool,
    /// Model identifier the prompt is sent to.
    pub model_used: String,
}

impl CommitStats {
    pub fn digest_used(&self) -> bool {
        self.digest.is_some()
    }
}

impl fmt::Display for CommitStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(report) = &self.digest {
            writeln!(f, "Large commit detected ({} files), using digest", self.files)?;
            writeln!(f, "{report}")?;
        } else {
            writeln!(f, "Staged files: {}", self.files)?;
        }
        writeln!(f, "Change content: {} characters", self.diff_chars)?;
        writeln!(f, "Template: {}", self.template)?;
        write!(f, "Prompt: ~{} tokens", self.prompt_tokens)?;
        if self.prompt_truncated {
            write!(f, " (truncated to fit input limit)")?;
        }
        write!(f, "\nModel: {}", self.model_used)
    }
}

/// A rendered prompt ready to send.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedPrompt {
    pub prompt: String,
    pub stats: CommitStats,
}

/// The cleaned commit message and how it was produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedMessage {
    pub message: String,
    pub stats: CommitStats,
}

/// Drives staged changes through digesting, templating and the LLM call.
pub struct CommitPipeline {
    llm: LlmClient,
    config: ScribeConfig,
}

impl CommitPipeline {
    /// Create a pipeline for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: ScribeConfig) -> Result<Self, ScribeError> {
        let llm = LlmClient::new(&config.llm)?;
        Ok(Self { llm, config })
    }

    /// Build the prompt for `changes`.
    ///
    /// Change sets with more files than
    /// [`CommitConfig::large_commit_threshold`] are replaced by a digest
    /// budgeted at [`LlmConfig::max_input_tokens`]; smaller ones go in as the
    /// raw staged diff. The rendered prompt is then cut to the input limit.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::Template`] if the configured template is unknown.
    ///
    /// [`CommitConfig::large_commit_threshold`]: scribe_core::CommitConfig::large_commit_threshold
    /// [`LlmConfig::max_input_tokens`]: scribe_core::LlmConfig::max_input_tokens
    pub fn prepare(&self, changes: &StagedChanges) -> Result<PreparedPrompt, ScribeError> {
        let files = changes.file_count();
        let max_input = self.config.llm.max_input_tokens;

        let (content, digest) = if files > self.config.commit.large_commit_threshold {
            let digest = scribe_digest::build_digest(&changes.diff, &changes.status, max_input);
            (digest.text, Some(digest.report))
        } else {
            (changes.diff.clone(), None)
        };

        let template = &self.config.commit.template;
        let rendered = prompt::render_prompt(template, &content)?;
        let (prompt, prompt_truncated) = prompt::truncate_input(&rendered, max_input);

        Ok(PreparedPrompt {
            stats: CommitStats {
                files,
                digest,
                diff_chars: content.len(),
                template: template.clone(),
                prompt_tokens: prompt::estimate_tokens(&prompt),
                prompt_truncated,
                model_used: self.llm.model().to_string(),
            },
            prompt,
        })
    }

    /// Send `prepared` to the model once and clean the reply.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::Timeout`] if no reply arrives within
    /// [`LlmConfig::timeout_seconds`], or [`ScribeError::Llm`] if the call
    /// fails or yields an empty message.
    ///
    /// [`LlmConfig::timeout_seconds`]: scribe_core::LlmConfig::timeout_seconds
    pub async fn generate(&self, prepared: PreparedPrompt) -> Result<GeneratedMessage, ScribeError> {
        let seconds = self.config.llm.timeout_seconds;
        let messages = vec![ChatMessage::user(prepared.prompt)];

        let reply = tokio::time::timeout(Duration::from_secs(seconds), self.llm.chat(messages))
            .await
            .map_err(|_| ScribeError::Timeout(seconds))??;

        let message = prompt::clean_message(&reply);
        if message.is_empty() {
            return Err(ScribeError::Llm("LLM returned empty response".into()));
        }

        Ok(GeneratedMessage {
            message,
            stats: prepared.stats,
        })
    }
}
