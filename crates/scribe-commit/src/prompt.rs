use minijinja::{context, Environment};
use scribe_core::ScribeError;

/// Names of the built-in prompt templates.
pub const TEMPLATE_NAMES: &[&str] = &["conventional", "simple"];

const CONVENTIONAL: &str = include_str!("../templates/conventional.j2");
const SIMPLE: &str = include_str!("../templates/simple.j2");

/// Placeholder inserted where [`truncate_input`] removed words.
pub const TRUNCATED_MARKER: &str = "[...truncated...]";

fn environment() -> Result<Environment<'static>, ScribeError> {
    let mut env = Environment::new();
    for (name, source) in [("conventional", CONVENTIONAL), ("simple", SIMPLE)] {
        env.add_template(name, source)
            .map_err(|e| ScribeError::Template(format!("failed to parse template '{name}': {e}")))?;
    }
    Ok(env)
}

/// Render the built-in template `name` with `diff` as its change content.
///
/// # Errors
///
/// Returns [`ScribeError::Template`] for an unknown template name or a
/// rendering failure.
///
/// # Examples
///
/// ```
/// use scribe_commit::prompt::render_prompt;
///
/// let prompt = render_prompt("simple", "+fn main() {}").unwrap();
/// assert!(prompt.contains("+fn main() {}"));
/// assert!(render_prompt("haiku", "x").is_err());
/// ```
pub fn render_prompt(name: &str, diff: &str) -> Result<String, ScribeError> {
    let env = environment()?;
    let template = env.get_template(name).map_err(|_| {
        ScribeError::Template(format!(
            "unknown template '{name}' (available: {})",
            TEMPLATE_NAMES.join(", ")
        ))
    })?;
    template
        .render(context! { diff => diff })
        .map_err(|e| ScribeError::Template(format!("failed to render template '{name}': {e}")))
}

/// Rough token estimate: the number of whitespace-separated words.
///
/// # Examples
///
/// ```
/// use scribe_commit::prompt::estimate_tokens;
///
/// assert_eq!(estimate_tokens("fix the  parser\nbug"), 4);
/// assert_eq!(estimate_tokens(""), 0);
/// ```
pub fn estimate_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Fit `prompt` into `max_tokens` words.
///
/// Prompts within the limit are returned unchanged. Longer ones keep their
/// first and last `max_tokens / 2` words around [`TRUNCATED_MARKER`],
/// joined by single spaces. The flag reports whether anything was cut.
///
/// # Examples
///
/// ```
/// use scribe_commit::prompt::truncate_input;
///
/// let (text, cut) = truncate_input("a b c d e f", 4);
/// assert!(cut);
/// assert_eq!(text, "a b [...truncated...] e f");
///
/// let (text, cut) = truncate_input("short prompt", 4);
/// assert!(!cut);
/// assert_eq!(text, "short prompt");
/// ```
pub fn truncate_input(prompt: &str, max_tokens: usize) -> (String, bool) {
    let words: Vec<&str> = prompt.split_whitespace().collect();
    if words.len() <= max_tokens {
        return (prompt.to_string(), false);
    }

    let keep = max_tokens / 2;
    let mut kept: Vec<&str> = Vec::with_capacity(keep * 2 + 1);
    kept.extend_from_slice(&words[..keep]);
    kept.push(TRUNCATED_MARKER);
    kept.extend_from_slice(&words[words.len() - keep..]);
    (kept.join(" "), true)
}

/// Tidy a raw model reply into a commit message.
///
/// Trims surrounding whitespace and unwraps a single markdown code fence.
///
/// # Examples
///
/// ```
/// use scribe_commit::prompt::clean_message;
///
/// assert_eq!(clean_message("```text\nfix: typo\n```\n"), "fix: typo");
/// assert_eq!(clean_message("  feat: add digest \n"), "feat: add digest");
/// ```
pub fn clean_message(response: &str) -> String {
    let trimmed = response.trim();
    let Some(fenced) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the info string on the opening fence line.
    let body = match fenced.split_once('\n') {
        Some((_, rest)) => rest,
        None => fenced,
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim().to_string()
}
