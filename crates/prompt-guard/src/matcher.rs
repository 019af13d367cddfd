//! Approximate phrase matching.
//!
//! [`FuzzyMatcher`] is the primitive the deny list is built on: "does this
//! phrase occur in this text, give or take a few typos".  The default
//! implementation, [`EditDistanceMatcher`], looks for the contiguous window
//! of the text with the smallest edit distance to the phrase.

use async_trait::async_trait;
use unicode_normalization::UnicodeNormalization;

use crate::config::MatchOptions;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Decides whether `phrase` approximately occurs somewhere in `text`.
///
/// Async so that a network-backed matching service can sit behind it.
/// Implementations must be deterministic for identical input.
#[async_trait]
pub trait FuzzyMatcher: Send + Sync {
    async fn fuzzy_contains(&self, text: &str, phrase: &str) -> anyhow::Result<bool>;
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn is_zero_width(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}'
    )
}

/// Canonical form used on both sides of a comparison: optional NFKC fold,
/// lower-case, optional zero-width removal, whitespace collapsed to single
/// spaces and trimmed.
pub fn normalize(text: &str, options: &MatchOptions) -> String {
    let folded: String = if options.unicode_nfkc {
        text.nfkc().collect()
    } else {
        text.to_string()
    };

    let lowered: String = folded
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| !(options.strip_zero_width && is_zero_width(*c)))
        .collect();

    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Edit distance
// ---------------------------------------------------------------------------

/// Smallest edit distance between `pattern` and any contiguous window of
/// `text`.  Insertions, deletions, substitutions and adjacent transpositions
/// each cost one edit.  The empty window is allowed, so the result never
/// exceeds the pattern length.
pub fn window_distance(pattern: &str, text: &str) -> usize {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    scan(&p, &t, 0)
}

/// Column-wise dynamic program with a free starting point in `t`
/// (row zero is always 0).  Returns as soon as a window within `stop_at`
/// edits is found, so the result is exact only when it is `> stop_at` or
/// when `stop_at` is 0.
fn scan(p: &[char], t: &[char], stop_at: usize) -> usize {
    let m = p.len();
    let mut prev2: Vec<usize> = (0..=m).collect();
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut cur: Vec<usize> = vec![0; m + 1];

    let mut best = m;
    if best <= stop_at {
        return best;
    }

    for j in 1..=t.len() {
        cur[0] = 0;
        for i in 1..=m {
            let cost = usize::from(p[i - 1] != t[j - 1]);
            let mut v = (prev[i - 1] + cost).min(prev[i] + 1).min(cur[i - 1] + 1);
            if i > 1 && j > 1 && p[i - 1] == t[j - 2] && p[i - 2] == t[j - 1] {
                v = v.min(prev2[i - 2] + 1);
            }
            cur[i] = v;
        }

        best = best.min(cur[m]);
        if best <= stop_at {
            return best;
        }

        std::mem::swap(&mut prev2, &mut prev);
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}

// ---------------------------------------------------------------------------
// EditDistanceMatcher
// ---------------------------------------------------------------------------

/// Local, in-process [`FuzzyMatcher`].
///
/// A phrase matches when some window of the normalized text is within
/// [`MatchOptions::allowed_edits`] of the normalized phrase.  Phrases that
/// allow zero edits fall back to an exact substring test.
#[derive(Debug, Clone, Default)]
pub struct EditDistanceMatcher {
    options: MatchOptions,
}

impl EditDistanceMatcher {
    pub fn new(options: MatchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Synchronous form of [`FuzzyMatcher::fuzzy_contains`].
    pub fn is_match(&self, text: &str, phrase: &str) -> bool {
        let phrase = normalize(phrase, &self.options);
        if phrase.is_empty() {
            return false;
        }
        let text = normalize(text, &self.options);

        let p: Vec<char> = phrase.chars().collect();
        let allowed = self.options.allowed_edits(p.len());
        if allowed == 0 {
            return text.contains(&phrase);
        }

        let t: Vec<char> = text.chars().collect();
        scan(&p, &t, allowed) <= allowed
    }
}

#[async_trait]
impl FuzzyMatcher for EditDistanceMatcher {
    async fn fuzzy_contains(&self, text: &str, phrase: &str) -> anyhow::Result<bool> {
        Ok(self.is_match(text, phrase))
    }
}
