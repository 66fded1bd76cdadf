use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScribeError;

/// Name of the optional, read-only project configuration file.
pub const CONFIG_FILE_NAME: &str = ".scribe.toml";

const ENV_PREFIX: &str = "SCRIBE_";

/// Top-level configuration.
///
/// Resolution order: defaults < `.scribe.toml` at the repository root <
/// `SCRIBE_*` environment variables.
///
/// # Examples
///
/// ```
/// use scribe_core::ScribeConfig;
///
/// let config = ScribeConfig::default();
/// assert_eq!(config.llm.max_input_tokens, 4000);
/// assert_eq!(config.commit.template, "conventional");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScribeConfig {
    /// LLM endpoint settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Commit workflow settings.
    #[serde(default)]
    pub commit: CommitConfig,
}

impl ScribeConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::Io`] if the file cannot be read, or
    /// [`ScribeError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, ScribeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use scribe_core::ScribeConfig;
    ///
    /// let toml = r#"
    /// [llm]
    /// max_input_tokens = 8000
    /// "#;
    /// let config = ScribeConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.llm.max_input_tokens, 8000);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, ScribeError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve the full configuration for a repository.
    ///
    /// Reads `<repo_root>/.scribe.toml` when present, applies process
    /// environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::Toml`] for a malformed file and
    /// [`ScribeError::Config`] for bad overrides or out-of-range values.
    pub fn load(repo_root: &Path) -> Result<Self, ScribeError> {
        let path = repo_root.join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SCRIBE_*` overrides looked up through `lookup`.
    ///
    /// `OPENROUTER_API_KEY` is accepted as a fallback for the API key.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::Config`] when a numeric or boolean variable
    /// cannot be parsed.
    ///
    /// # Examples
    ///
    /// ```
    /// use scribe_core::ScribeConfig;
    ///
    /// let mut config = ScribeConfig::default();
    /// config
    ///     .apply_env_overrides(|key| match key {
    ///         "SCRIBE_LLM_MODEL" => Some("openai/gpt-4o".to_string()),
    ///         "SCRIBE_NO_INTERACTIVE" => Some("1".to_string()),
    ///         _ => None,
    ///     })
    ///     .unwrap();
    /// assert_eq!(config.llm.model, "openai/gpt-4o");
    /// assert!(!config.commit.interactive);
    /// ```
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ScribeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}")).filter(|value| !value.trim().is_empty())
        };

        if let Some(key) = var("OPENROUTER_API_KEY").or_else(|| lookup("OPENROUTER_API_KEY")) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = var("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = var("BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(raw) = var("MAX_INPUT_TOKENS") {
            self.llm.max_input_tokens = parse_number("MAX_INPUT_TOKENS", &raw)?;
        }
        if let Some(raw) = var("MAX_OUTPUT_TOKENS") {
            self.llm.max_output_tokens = parse_number("MAX_OUTPUT_TOKENS", &raw)?;
        }
        if let Some(raw) = var("TEMPERATURE") {
            self.llm.temperature = parse_number("TEMPERATURE", &raw)?;
        }
        if let Some(raw) = var("TIMEOUT_SECONDS") {
            self.llm.timeout_seconds = parse_number("TIMEOUT_SECONDS", &raw)?;
        }
        if let Some(name) = var("TEMPLATE_NAME") {
            self.commit.template = name;
        }
        if let Some(raw) = var("VERBOSE") {
            self.commit.verbose = parse_flag("VERBOSE", &raw)?;
        }
        if let Some(raw) = var("NO_INTERACTIVE") {
            self.commit.interactive = !parse_flag("NO_INTERACTIVE", &raw)?;
        }
        if let Some(raw) = var("LARGE_COMMIT_THRESHOLD") {
            self.commit.large_commit_threshold = parse_number("LARGE_COMMIT_THRESHOLD", &raw)?;
        }
        Ok(())
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::Config`] if a token limit or the timeout is zero,
    /// or the temperature is outside `0.0..=2.0`.
    pub fn validate(&self) -> Result<(), ScribeError> {
        if self.llm.max_input_tokens == 0 || self.llm.max_output_tokens == 0 {
            return Err(ScribeError::Config("token limits must be positive".into()));
        }
        if self.llm.timeout_seconds == 0 {
            return Err(ScribeError::Config("timeout must be positive".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ScribeError::Config(format!(
                "temperature {} is outside 0.0..=2.0",
                self.llm.temperature
            )));
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(name: &str, raw: &str) -> Result<T, ScribeError> {
    raw.trim()
        .parse()
        .map_err(|_| ScribeError::Config(format!("{ENV_PREFIX}{name} is not a number: {raw}")))
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, ScribeError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ScribeError::Config(format!(
            "{ENV_PREFIX}{name} is not a boolean: {raw}"
        ))),
    }
}

/// Chat-completions endpoint configuration.
///
/// # Examples
///
/// ```
/// use scribe_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "openai/gpt-4o-mini");
/// assert_eq!(config.max_output_tokens, 200);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key sent as a bearer token.
    pub api_key: Option<String>,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL; `/v1/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Token budget for the prompt, and for the digest of large change sets.
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,
    /// Completion token limit.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: usize,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}

fn default_base_url() -> String {
    "https://openrouter.ai/api".into()
}

fn default_max_input_tokens() -> usize {
    4000
}

fn default_max_output_tokens() -> usize {
    200
}

fn default_temperature() -> f64 {
    0.7
}

fn default_timeout_seconds() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            max_input_tokens: default_max_input_tokens(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Commit workflow configuration.
///
/// # Examples
///
/// ```
/// use scribe_core::CommitConfig;
///
/// let config = CommitConfig::default();
/// assert!(config.interactive);
/// assert_eq!(config.large_commit_threshold, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitConfig {
    /// Built-in prompt template name (`conventional` or `simple`).
    #[serde(default = "default_template")]
    pub template: String,
    /// Ask for confirmation before committing (default: true).
    #[serde(default = "default_interactive")]
    pub interactive: bool,
    /// Print progress and digest statistics to stderr.
    #[serde(default)]
    pub verbose: bool,
    /// Change sets with more files than this are digested instead of sent raw.
    #[serde(default = "default_large_commit_threshold")]
    pub large_commit_threshold: usize,
}

fn default_template() -> String {
    "conventional".into()
}

fn default_interactive() -> bool {
    true
}

fn default_large_commit_threshold() -> usize {
    5
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            interactive: default_interactive(),
            verbose: false,
            large_commit_threshold: default_large_commit_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = ScribeConfig::default();
        assert_eq!(config.llm.model, "openai/gpt-4o-mini");
        assert_eq!(config.llm.base_url, "https://openrouter.ai/api");
        assert_eq!(config.llm.max_input_tokens, 4000);
        assert_eq!(config.llm.max_output_tokens, 200);
        assert_eq!(config.llm.temperature, 0.7);
        assert_eq!(config.llm.timeout_seconds, 60);
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.commit.template, "conventional");
        assert!(config.commit.interactive);
        assert!(!config.commit.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[llm]
api_key = "sk-test"
model = "anthropic/claude-3.5-haiku"
max_input_tokens = 12000
temperature = 0.2

[commit]
template = "simple"
interactive = false
large_commit_threshold = 10
"#;
        let config = ScribeConfig::from_toml(toml).unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.model, "anthropic/claude-3.5-haiku");
        assert_eq!(config.llm.max_input_tokens, 12000);
        assert_eq!(config.llm.max_output_tokens, 200);
        assert_eq!(config.commit.template, "simple");
        assert!(!config.commit.interactive);
        assert_eq!(config.commit.large_commit_threshold, 10);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ScribeConfig::from_toml("").unwrap();
        assert_eq!(config.llm.max_input_tokens, 4000);
        assert_eq!(config.commit.template, "conventional");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = ScribeConfig::from_toml("{{invalid}}");
        assert!(matches!(result, Err(ScribeError::Toml(_))));
    }

    #[test]
    fn env_overrides_take_precedence() {
        let mut config = ScribeConfig::from_toml("[llm]\nmodel = \"from-file\"\n").unwrap();
        config
            .apply_env_overrides(env(&[
                ("SCRIBE_LLM_MODEL", "from-env"),
                ("SCRIBE_MAX_INPUT_TOKENS", "9000"),
                ("SCRIBE_TIMEOUT_SECONDS", "5"),
                ("SCRIBE_TEMPERATURE", "0.1"),
                ("SCRIBE_TEMPLATE_NAME", "simple"),
                ("SCRIBE_VERBOSE", "true"),
            ]))
            .unwrap();
        assert_eq!(config.llm.model, "from-env");
        assert_eq!(config.llm.max_input_tokens, 9000);
        assert_eq!(config.llm.timeout_seconds, 5);
        assert_eq!(config.llm.temperature, 0.1);
        assert_eq!(config.commit.template, "simple");
        assert!(config.commit.verbose);
    }

    #[test]
    fn api_key_falls_back_to_unprefixed_variable() {
        let mut config = ScribeConfig::default();
        config
            .apply_env_overrides(env(&[("OPENROUTER_API_KEY", "plain")]))
            .unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("plain"));

        config
            .apply_env_overrides(env(&[
                ("OPENROUTER_API_KEY", "plain"),
                ("SCRIBE_OPENROUTER_API_KEY", "prefixed"),
            ]))
            .unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("prefixed"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = ScribeConfig::default();
        config
            .apply_env_overrides(env(&[("SCRIBE_LLM_MODEL", "  ")]))
            .unwrap();
        assert_eq!(config.llm.model, "openai/gpt-4o-mini");
    }

    #[test]
    fn bad_numeric_override_is_config_error() {
        let mut config = ScribeConfig::default();
        let err = config
            .apply_env_overrides(env(&[("SCRIBE_MAX_INPUT_TOKENS", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("SCRIBE_MAX_INPUT_TOKENS"));
    }

    #[test]
    fn bad_flag_override_is_config_error() {
        let mut config = ScribeConfig::default();
        let result = config.apply_env_overrides(env(&[("SCRIBE_NO_INTERACTIVE", "maybe")]));
        assert!(matches!(result, Err(ScribeError::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let mut config = ScribeConfig::default();
        config.llm.max_output_tokens = 0;
        assert!(config.validate().is_err());

        let mut config = ScribeConfig::default();
        config.llm.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = ScribeConfig::default();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_repo_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[commit]\nlarge_commit_threshold = 2\n",
        )
        .unwrap();

        let config = ScribeConfig::load(dir.path()).unwrap();
        assert_eq!(config.commit.large_commit_threshold, 2);
    }
}
