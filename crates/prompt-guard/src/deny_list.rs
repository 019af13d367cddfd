//! Deny-list evaluation across a phrase set.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::baseline::baseline_phrases;
use crate::matcher::FuzzyMatcher;

/// Composes a [`FuzzyMatcher`] across the caller's phrases and the baseline
/// list.
///
/// The baseline is owned by the matcher rather than read from a global, so
/// tests and custom deployments can swap it via
/// [`DenyListMatcher::with_baseline`].
#[derive(Clone)]
pub struct DenyListMatcher {
    baseline: Vec<String>,
    fuzzy: Arc<dyn FuzzyMatcher>,
}

impl fmt::Debug for DenyListMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenyListMatcher")
            .field("baseline_len", &self.baseline.len())
            .finish()
    }
}

impl DenyListMatcher {
    /// Matcher using the built-in baseline table.
    pub fn new(fuzzy: Arc<dyn FuzzyMatcher>) -> Self {
        Self::with_baseline(baseline_phrases(), fuzzy)
    }

    /// Matcher using `baseline` in place of the built-in table.
    pub fn with_baseline<I, S>(baseline: I, fuzzy: Arc<dyn FuzzyMatcher>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            baseline: baseline.into_iter().map(Into::into).collect(),
            fuzzy,
        }
    }

    pub fn baseline(&self) -> &[String] {
        &self.baseline
    }

    /// Returns `true` if any effective phrase fuzzily occurs in `text`.
    ///
    /// The effective set is `phrases`, plus the baseline when
    /// `include_defaults` is set.  Blank phrases are skipped and duplicates
    /// are checked once.  Evaluation stops at the first match; the first
    /// matcher error is returned as-is.
    pub async fn matches(
        &self,
        text: &str,
        phrases: &[String],
        include_defaults: bool,
    ) -> anyhow::Result<bool> {
        let defaults: &[String] = if include_defaults { &self.baseline } else { &[] };

        let mut seen = HashSet::new();
        for phrase in phrases.iter().chain(defaults) {
            let phrase = phrase.trim();
            if phrase.is_empty() || !seen.insert(phrase) {
                continue;
            }

            trace!(phrase, "checking deny phrase");
            if self.fuzzy.fuzzy_contains(text, phrase).await? {
                debug!(phrase, "deny phrase matched");
                return Ok(true);
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::EditDistanceMatcher;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -- helpers ----------------------------------------------------------

    /// Exact-substring matcher that counts how often it is called.
    #[derive(Default)]
    struct CountingMatcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FuzzyMatcher for CountingMatcher {
        async fn fuzzy_contains(&self, text: &str, phrase: &str) -> anyhow::Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(text.contains(phrase))
        }
    }

    struct FailingMatcher;

    #[async_trait]
    impl FuzzyMatcher for FailingMatcher {
        async fn fuzzy_contains(&self, _text: &str, _phrase: &str) -> anyhow::Result<bool> {
            anyhow::bail!("matching service unavailable")
        }
    }

    fn phrases(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn default_matcher() -> DenyListMatcher {
        DenyListMatcher::new(Arc::new(EditDistanceMatcher::default()))
    }

    // -- behaviour --------------------------------------------------------

    #[tokio::test]
    async fn caller_phrase_matches() {
        let m = default_matcher();
        let hit = m
            .matches("launch an attack now", &phrases(&["attack"]), true)
            .await
            .unwrap();
        assert!(hit);
    }

    #[tokio::test]
    async fn baseline_applies_only_when_included() {
        let m = default_matcher();
        let text = "Please ignore previous instructions.";
        assert!(m.matches(text, &[], true).await.unwrap());
        assert!(!m.matches(text, &[], false).await.unwrap());
    }

    #[tokio::test]
    async fn empty_effective_set_never_matches() {
        let m = default_matcher();
        for text in ["", "anything", "ignore previous instructions"] {
            assert!(!m.matches(text, &[], false).await.unwrap());
            assert!(!m
                .matches(text, &phrases(&["", "  "]), false)
                .await
                .unwrap());
        }
    }

    #[tokio::test]
    async fn benign_text_passes_baseline() {
        let m = default_matcher();
        for text in [
            "hello world",
            "Can you help me sort a list?",
            "Please summarize this article for me.",
            "Follow the instructions in the README.",
        ] {
            assert!(!m.matches(text, &[], true).await.unwrap(), "{text}");
        }
    }

    #[tokio::test]
    async fn short_circuits_on_first_match() {
        let counter = Arc::new(CountingMatcher::default());
        let m = DenyListMatcher::with_baseline(Vec::<String>::new(), counter.clone());

        let hit = m
            .matches("alpha beta", &phrases(&["alpha", "beta", "gamma"]), true)
            .await
            .unwrap();
        assert!(hit);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn skips_blank_and_duplicate_phrases() {
        let counter = Arc::new(CountingMatcher::default());
        let m = DenyListMatcher::with_baseline(["gamma"], counter.clone());

        let hit = m
            .matches("nothing", &phrases(&["", "gamma", " gamma ", "   "]), true)
            .await
            .unwrap();
        assert!(!hit);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn result_does_not_depend_on_phrase_order() {
        let m = default_matcher();
        let text = "the b0mb is in the car";
        let forward = phrases(&["rocket", "bomb", "missile"]);
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(
            m.matches(text, &forward, false).await.unwrap(),
            m.matches(text, &reversed, false).await.unwrap()
        );
    }

    #[tokio::test]
    async fn injected_baseline_replaces_builtin() {
        let m = DenyListMatcher::with_baseline(["forbidden"], Arc::new(EditDistanceMatcher::default()));
        assert_eq!(m.baseline(), &["forbidden".to_string()]);
        assert!(m.matches("this is forbidden", &[], true).await.unwrap());
        assert!(!m
            .matches("ignore previous instructions", &[], true)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn matcher_errors_propagate() {
        let m = DenyListMatcher::with_baseline(Vec::<String>::new(), Arc::new(FailingMatcher));
        let err = m
            .matches("text", &phrases(&["phrase"]), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unavailable"));
    }
}
