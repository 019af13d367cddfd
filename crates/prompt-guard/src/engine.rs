use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::config::{resolve, DependencyFailureMode, PolicyConfig, PolicyOptions};
use crate::deny_list::DenyListMatcher;
use crate::error::GuardError;
use crate::matcher::{EditDistanceMatcher, FuzzyMatcher};
use crate::tokens::{render_token_ids, ByteEncoder, CharRatioEstimator, Encoder, TokenEstimator};
use crate::verdict::{FailureReason, PromptVerdict};

// ---------------------------------------------------------------------------
// Pipeline stages and states
// ---------------------------------------------------------------------------

/// A step of the [`PolicyEngine::process`] pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Normalize,
    TokenCheck,
    DenyListCheck,
    Encode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normalize => write!(f, "normalize"),
            Self::TokenCheck => write!(f, "token-check"),
            Self::DenyListCheck => write!(f, "deny-list-check"),
            Self::Encode => write!(f, "encode"),
        }
    }
}

/// Where a single `process` call currently stands.  Transitions only move
/// forward; `Passed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    TokenChecked,
    DenyChecked,
    Passed,
    Failed,
}

fn transition(from: PipelineState, to: PipelineState) -> PipelineState {
    trace!(?from, ?to, "pipeline transition");
    to
}

// ---------------------------------------------------------------------------
// PolicyEngine
// ---------------------------------------------------------------------------

/// Runs the prompt policy: normalize, token check, deny-list check, and
/// optional encoding, stopping at the first failing check.
///
/// The engine holds no per-call state, so one instance can be shared
/// behind an [`Arc`] and called concurrently.
///
/// # Example
///
/// ```rust,no_run
/// use prompt_guard::{PolicyEngine, PolicyOptions};
///
/// # async fn example() -> Result<(), prompt_guard::GuardError> {
/// let engine = PolicyEngine::new(PolicyOptions::default().deny_list(["attack"]))?;
/// let verdict = engine.process("launch an attack now").await?;
/// assert!(!verdict.pass);
/// assert_eq!(verdict.output, "Failed deny list validation");
/// # Ok(())
/// # }
/// ```
pub struct PolicyEngine {
    config: PolicyConfig,
    estimator: Arc<dyn TokenEstimator>,
    deny_list: DenyListMatcher,
    encoder: Arc<dyn Encoder>,
}

impl fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("max_tokens", &self.config.max_tokens)
            .field("deny_list_len", &self.config.deny_list.len())
            .field("ignore_default_deny_list", &self.config.ignore_default_deny_list)
            .field("encode_output", &self.config.encode_output)
            .finish()
    }
}

impl Default for PolicyEngine {
    /// Engine with the default policy and built-in collaborators.
    fn default() -> Self {
        let config = PolicyConfig::default();
        let fuzzy = Arc::new(EditDistanceMatcher::new(config.matching.clone()));
        Self {
            config,
            estimator: Arc::new(CharRatioEstimator::default()),
            deny_list: DenyListMatcher::new(fuzzy),
            encoder: Arc::new(ByteEncoder),
        }
    }
}

impl PolicyEngine {
    /// Resolve `options` over the defaults and build an engine with the
    /// built-in tokenizer, matcher and encoder.
    pub fn new(options: PolicyOptions) -> Result<Self, GuardError> {
        Self::builder(options).build()
    }

    /// Start building an engine with injected collaborators.
    pub fn builder(options: PolicyOptions) -> PolicyEngineBuilder {
        PolicyEngineBuilder {
            options,
            estimator: None,
            fuzzy: None,
            encoder: None,
            baseline: None,
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Run the policy pipeline over `prompt`.
    ///
    /// Policy rejections come back as `Ok` with `pass == false`.  `Err` is
    /// reserved for collaborator failures under
    /// [`DependencyFailureMode::Propagate`].
    ///
    /// When `encode_output` is set, a passing verdict's `output` is the
    /// JSON-rendered token-id sequence (e.g. `[104,105]`) instead of the
    /// prompt text.
    pub async fn process(&self, prompt: &str) -> Result<PromptVerdict, GuardError> {
        debug!(prompt_chars = prompt.chars().count(), "processing prompt");
        let mut state = PipelineState::Start;

        // Normalize: reserved for quoting/escaping; the prompt is carried
        // forward unchanged.
        trace!(stage = %Stage::Normalize, "stage entered");

        trace!(stage = %Stage::TokenCheck, "stage entered");
        let tokens = match self.estimator.count_tokens(prompt) {
            Ok(n) => n,
            Err(e) => {
                return self.dependency_failure(
                    state,
                    Stage::TokenCheck,
                    FailureReason::MaxTokenThreshold,
                    e,
                )
            }
        };
        if tokens > self.config.max_tokens {
            debug!(tokens, max_tokens = self.config.max_tokens, "token budget exceeded");
            return Ok(self.reject(state, Stage::TokenCheck, FailureReason::MaxTokenThreshold));
        }
        state = transition(state, PipelineState::TokenChecked);

        trace!(stage = %Stage::DenyListCheck, "stage entered");
        let denied = match self
            .deny_list
            .matches(
                prompt,
                &self.config.deny_list,
                !self.config.ignore_default_deny_list,
            )
            .await
        {
            Ok(hit) => hit,
            Err(e) => {
                return self.dependency_failure(
                    state,
                    Stage::DenyListCheck,
                    FailureReason::DenyList,
                    e,
                )
            }
        };
        if denied {
            return Ok(self.reject(state, Stage::DenyListCheck, FailureReason::DenyList));
        }
        state = transition(state, PipelineState::DenyChecked);

        let output = if self.config.encode_output {
            trace!(stage = %Stage::Encode, "stage entered");
            self.encode(prompt)?
        } else {
            prompt.to_string()
        };

        transition(state, PipelineState::Passed);
        debug!(tokens, "prompt passed policy");
        Ok(PromptVerdict::passed(output))
    }

    // -- Helpers --------------------------------------------------------------

    fn encode(&self, prompt: &str) -> Result<String, GuardError> {
        let ids = self
            .encoder
            .encode(prompt)
            .map_err(|e| GuardError::dependency(Stage::Encode, e))?;
        render_token_ids(&ids).map_err(|e| GuardError::dependency(Stage::Encode, e))
    }

    fn reject(&self, state: PipelineState, stage: Stage, reason: FailureReason) -> PromptVerdict {
        transition(state, PipelineState::Failed);
        warn!(%stage, reason = reason.code(), "prompt rejected");
        PromptVerdict::failed(reason)
    }

    fn dependency_failure(
        &self,
        state: PipelineState,
        stage: Stage,
        reason: FailureReason,
        source: anyhow::Error,
    ) -> Result<PromptVerdict, GuardError> {
        warn!(%stage, error = %source, "policy dependency failed");
        match self.config.on_dependency_failure {
            DependencyFailureMode::Reject => Ok(self.reject(state, stage, reason)),
            DependencyFailureMode::Propagate => {
                transition(state, PipelineState::Failed);
                Err(GuardError::dependency(stage, source))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder returned by [`PolicyEngine::builder`].  Collaborators that are
/// not supplied fall back to [`CharRatioEstimator`],
/// [`EditDistanceMatcher`] (configured from `matching`), [`ByteEncoder`]
/// and the built-in baseline deny list.
pub struct PolicyEngineBuilder {
    options: PolicyOptions,
    estimator: Option<Arc<dyn TokenEstimator>>,
    fuzzy: Option<Arc<dyn FuzzyMatcher>>,
    encoder: Option<Arc<dyn Encoder>>,
    baseline: Option<Vec<String>>,
}

impl PolicyEngineBuilder {
    pub fn token_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn fuzzy_matcher(mut self, fuzzy: Arc<dyn FuzzyMatcher>) -> Self {
        self.fuzzy = Some(fuzzy);
        self
    }

    pub fn encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Replace the built-in baseline deny list.
    pub fn baseline<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.baseline = Some(phrases.into_iter().map(Into::into).collect());
        self
    }

    /// Resolve the options and assemble the engine.
    pub fn build(self) -> Result<PolicyEngine, GuardError> {
        let config = resolve(self.options)?;

        let fuzzy = self
            .fuzzy
            .unwrap_or_else(|| Arc::new(EditDistanceMatcher::new(config.matching.clone())));
        let deny_list = match self.baseline {
            Some(baseline) => DenyListMatcher::with_baseline(baseline, fuzzy),
            None => DenyListMatcher::new(fuzzy),
        };

        debug!(
            max_tokens = config.max_tokens,
            deny_list_len = config.deny_list.len(),
            ignore_default_deny_list = config.ignore_default_deny_list,
            encode_output = config.encode_output,
            "policy engine configured"
        );

        Ok(PolicyEngine {
            config,
            estimator: self
                .estimator
                .unwrap_or_else(|| Arc::new(CharRatioEstimator::default())),
            deny_list,
            encoder: self.encoder.unwrap_or_else(|| Arc::new(ByteEncoder)),
        })
    }
}
