//! Policy configuration: caller overrides, defaults, and the pure merge that
//! turns one into an immutable [`PolicyConfig`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::GuardError;

/// Token budget applied when the caller does not supply one.
pub const DEFAULT_MAX_TOKENS: usize = 4096;

// ---------------------------------------------------------------------------
// Caller-facing options
// ---------------------------------------------------------------------------

/// Partial policy supplied by the caller.  Every field is optional; unset
/// fields fall back to the defaults in [`PolicyConfig::default`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyOptions {
    /// Upper bound on the estimated token count.
    pub max_tokens: Option<usize>,
    /// Phrases that must not (fuzzily) appear in a prompt.
    pub deny_list: Option<Vec<String>>,
    /// When `true` only `deny_list` applies; the baseline list is skipped.
    pub ignore_default_deny_list: Option<bool>,
    /// When `true` a passing prompt is returned as a token-id sequence.
    pub encode_output: Option<bool>,
    /// Fuzzy matching tuning.
    pub matching: Option<MatchOptions>,
    /// What to do when the tokenizer or matcher fails.
    pub on_dependency_failure: Option<DependencyFailureMode>,
}

impl PolicyOptions {
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn deny_list<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deny_list = Some(phrases.into_iter().map(Into::into).collect());
        self
    }

    pub fn ignore_default_deny_list(mut self, ignore: bool) -> Self {
        self.ignore_default_deny_list = Some(ignore);
        self
    }

    pub fn encode_output(mut self, encode: bool) -> Self {
        self.encode_output = Some(encode);
        self
    }

    pub fn matching(mut self, matching: MatchOptions) -> Self {
        self.matching = Some(matching);
        self
    }

    pub fn on_dependency_failure(mut self, mode: DependencyFailureMode) -> Self {
        self.on_dependency_failure = Some(mode);
        self
    }
}

/// Behaviour when an injected tokenizer or matcher returns an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyFailureMode {
    /// Return the failure to the caller as a
    /// [`GuardError::Dependency`](crate::GuardError::Dependency).
    #[default]
    Propagate,
    /// Fail closed: reject the prompt with the failing stage's reason.
    Reject,
}

/// Tuning knobs for the edit-distance deny-list matcher.
///
/// A phrase of `n` normalized characters tolerates
/// `min(n - 1, max(min_edits, floor(n * max_edit_ratio)))` edits, or none
/// at all when `n < min_fuzzy_len`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchOptions {
    #[serde(default = "default_max_edit_ratio")]
    pub max_edit_ratio: f64,
    #[serde(default = "default_min_edits")]
    pub min_edits: usize,
    #[serde(default = "default_min_fuzzy_len")]
    pub min_fuzzy_len: usize,
    /// Apply NFKC compatibility folding before comparison.
    #[serde(default = "default_true")]
    pub unicode_nfkc: bool,
    /// Drop zero-width and byte-order-mark characters before comparison.
    #[serde(default = "default_true")]
    pub strip_zero_width: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            max_edit_ratio: default_max_edit_ratio(),
            min_edits: default_min_edits(),
            min_fuzzy_len: default_min_fuzzy_len(),
            unicode_nfkc: default_true(),
            strip_zero_width: default_true(),
        }
    }
}

impl MatchOptions {
    /// Number of edits tolerated for a phrase of `phrase_len` normalized chars.
    pub fn allowed_edits(&self, phrase_len: usize) -> usize {
        if phrase_len == 0 || phrase_len < self.min_fuzzy_len {
            return 0;
        }
        let scaled = (phrase_len as f64 * self.max_edit_ratio).floor() as usize;
        scaled.max(self.min_edits).min(phrase_len - 1)
    }

    fn validate(&self) -> Result<(), GuardError> {
        if !self.max_edit_ratio.is_finite() || !(0.0..1.0).contains(&self.max_edit_ratio) {
            return Err(GuardError::invalid(format!(
                "matching.max_edit_ratio must be in [0.0, 1.0), got {}",
                self.max_edit_ratio
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Default-value functions used by serde
// ---------------------------------------------------------------------------

fn default_max_edit_ratio() -> f64 {
    0.2
}

fn default_min_edits() -> usize {
    1
}

fn default_min_fuzzy_len() -> usize {
    4
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully-resolved policy.  Built once per engine and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyConfig {
    pub max_tokens: usize,
    /// Caller-supplied phrases, trimmed, non-empty and de-duplicated.
    pub deny_list: Vec<String>,
    pub ignore_default_deny_list: bool,
    pub encode_output: bool,
    pub matching: MatchOptions,
    pub on_dependency_failure: DependencyFailureMode,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            deny_list: Vec::new(),
            ignore_default_deny_list: false,
            encode_output: false,
            matching: MatchOptions::default(),
            on_dependency_failure: DependencyFailureMode::default(),
        }
    }
}

/// Merge `options` over the defaults and validate the result.
///
/// Each field present in `options` replaces the default verbatim, except
/// that deny-list entries are trimmed, blank entries are dropped and
/// duplicates removed.
pub fn resolve(options: PolicyOptions) -> Result<PolicyConfig, GuardError> {
    let defaults = PolicyConfig::default();

    let config = PolicyConfig {
        max_tokens: options.max_tokens.unwrap_or(defaults.max_tokens),
        deny_list: clean_deny_list(options.deny_list.unwrap_or(defaults.deny_list))?,
        ignore_default_deny_list: options
            .ignore_default_deny_list
            .unwrap_or(defaults.ignore_default_deny_list),
        encode_output: options.encode_output.unwrap_or(defaults.encode_output),
        matching: options.matching.unwrap_or(defaults.matching),
        on_dependency_failure: options
            .on_dependency_failure
            .unwrap_or(defaults.on_dependency_failure),
    };

    if config.max_tokens == 0 {
        return Err(GuardError::invalid("max_tokens must be greater than zero"));
    }
    config.matching.validate()?;

    Ok(config)
}

fn clean_deny_list(entries: Vec<String>) -> Result<Vec<String>, GuardError> {
    let mut seen = HashSet::new();
    let mut cleaned = Vec::with_capacity(entries.len());

    for entry in entries {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.chars().any(|c| c.is_control() && !c.is_whitespace()) {
            return Err(GuardError::invalid(format!(
                "deny_list entry {trimmed:?} contains control characters"
            )));
        }
        if seen.insert(trimmed.to_string()) {
            cleaned.push(trimmed.to_string());
        }
    }

    Ok(cleaned)
}
