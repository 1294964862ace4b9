//! Syntactic key checks, run before any network call.

use std::sync::OnceLock;

use regex::Regex;

/// Required prefix of an Anthropic API key
pub const ANTHROPIC_KEY_PREFIX: &str = "sk-ant-";

/// Minimum number of characters after the prefix
pub const ANTHROPIC_KEY_MIN_BODY_LEN: usize = 32;

static ANTHROPIC_KEY_RE: OnceLock<Regex> = OnceLock::new();

/// True iff `key` looks like an Anthropic API key: the `sk-ant-` prefix
/// followed by at least 32 characters from `[a-zA-Z0-9_-]`.
pub fn is_valid_key_format(key: &str) -> bool {
    let re = ANTHROPIC_KEY_RE.get_or_init(|| {
        Regex::new(&format!(
            "^{}[a-zA-Z0-9_-]{{{},}}$",
            regex::escape(ANTHROPIC_KEY_PREFIX),
            ANTHROPIC_KEY_MIN_BODY_LEN
        ))
        .expect("valid regex")
    });
    re.is_match(key)
}
