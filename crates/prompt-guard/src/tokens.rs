//! Token accounting and output encoding.
//!
//! Both are seams: the exact byte-pair encoder lives outside this crate and
//! is plugged in through [`TokenEstimator`] and [`Encoder`].  The defaults
//! here are cheap, deterministic approximations.

use anyhow::{bail, Result};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Estimates how many model tokens a text would consume.
///
/// Implementations must be deterministic and non-decreasing in input
/// length.  The empty string is zero tokens.
pub trait TokenEstimator: Send + Sync {
    fn count_tokens(&self, text: &str) -> Result<usize>;
}

/// Converts text into a token-id sequence.
pub trait Encoder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>>;
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Roughly four characters of English text per token.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// `ceil(chars / chars_per_token)`, counting Unicode scalar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRatioEstimator {
    chars_per_token: usize,
}

impl CharRatioEstimator {
    pub fn new(chars_per_token: usize) -> Result<Self> {
        if chars_per_token == 0 {
            bail!("chars_per_token must be greater than zero");
        }
        Ok(Self { chars_per_token })
    }

    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }
}

impl Default for CharRatioEstimator {
    fn default() -> Self {
        Self {
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }
}

impl TokenEstimator for CharRatioEstimator {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(text.chars().count().div_ceil(self.chars_per_token))
    }
}

/// Byte-level encoder: each UTF-8 byte is its own token id.
///
/// This is the base vocabulary every byte-pair encoder starts from, so the
/// output is valid input for any BPE merge table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteEncoder;

impl Encoder for ByteEncoder {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        Ok(text.bytes().map(u32::from).collect())
    }
}

/// Render token ids as a compact JSON array, e.g. `[104,105]`.
pub fn render_token_ids(ids: &[u32]) -> Result<String> {
    Ok(serde_json::to_string(ids)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_zero_tokens() {
        let est = CharRatioEstimator::default();
        assert_eq!(est.count_tokens("").unwrap(), 0);
    }

    #[test]
    fn rounds_up_partial_tokens() {
        let est = CharRatioEstimator::default();
        assert_eq!(est.count_tokens("a").unwrap(), 1);
        assert_eq!(est.count_tokens("abcd").unwrap(), 1);
        assert_eq!(est.count_tokens("abcde").unwrap(), 2);
        assert_eq!(est.count_tokens("one two three four five six").unwrap(), 7);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let est = CharRatioEstimator::default();
        // Four scalar values, twelve bytes.
        assert_eq!(est.count_tokens("日本語だ").unwrap(), 1);
    }

    #[test]
    fn estimate_is_monotonic_in_length() {
        let est = CharRatioEstimator::default();
        let text = "The quick brown fox jumps over the lazy dog.";
        let mut last = 0;
        for end in 0..=text.len() {
            let n = est.count_tokens(&text[..end]).unwrap();
            assert!(n >= last, "count dropped at prefix length {end}");
            last = n;
        }
    }

    #[test]
    fn zero_ratio_is_rejected() {
        assert!(CharRatioEstimator::new(0).is_err());
        assert_eq!(CharRatioEstimator::new(3).unwrap().chars_per_token(), 3);
    }

    #[test]
    fn byte_encoder_emits_utf8_bytes() {
        let ids = ByteEncoder.encode("hi").unwrap();
        assert_eq!(ids, vec![104, 105]);
        assert_eq!(ByteEncoder.encode("é").unwrap(), vec![0xC3, 0xA9]);
        assert!(ByteEncoder.encode("").unwrap().is_empty());
    }

    #[test]
    fn token_ids_render_as_json_array() {
        assert_eq!(render_token_ids(&[104, 105]).unwrap(), "[104,105]");
        assert_eq!(render_token_ids(&[]).unwrap(), "[]");
    }
}
