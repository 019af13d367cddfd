//! # prompt-guard
//!
//! Validates and sanitizes a text prompt before it is forwarded to a
//! language-model call.  It never generates text; it accepts, rejects, or
//! re-encodes the input.
//!
//! The crate is organised around four layers:
//!
//! 1. **[`config`]** -- caller overrides merged onto defaults into an
//!    immutable [`PolicyConfig`]; [`loader`] reads the same options from YAML.
//! 2. **[`tokens`]** -- the [`TokenEstimator`] and [`Encoder`] seams with
//!    cheap built-in implementations.
//! 3. **[`matcher`]** / **[`deny_list`]** -- edit-distance phrase matching
//!    composed over the caller's phrases and the [`baseline`] list.
//! 4. **[`engine`]** -- the [`PolicyEngine`] pipeline producing a
//!    [`PromptVerdict`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use prompt_guard::{PolicyEngine, PolicyOptions};
//!
//! # async fn example() -> Result<(), prompt_guard::GuardError> {
//! let engine = PolicyEngine::new(PolicyOptions::default().max_tokens(5))?;
//! let verdict = engine.process("one two three four five six").await?;
//! assert_eq!(verdict.output, "Failed max token threshold");
//! # Ok(())
//! # }
//! ```

pub mod baseline;
pub mod config;
pub mod deny_list;
pub mod engine;
mod error;
pub mod loader;
pub mod matcher;
pub mod tokens;
mod verdict;

// Re-export the most commonly used types at the crate root.
pub use baseline::{BaselinePhrase, PhraseCategory, BASELINE_DENY_LIST, BASELINE_VERSION};
pub use config::{resolve, DependencyFailureMode, MatchOptions, PolicyConfig, PolicyOptions};
pub use deny_list::DenyListMatcher;
pub use engine::{PipelineState, PolicyEngine, PolicyEngineBuilder, Stage};
pub use error::GuardError;
pub use matcher::{EditDistanceMatcher, FuzzyMatcher};
pub use tokens::{ByteEncoder, CharRatioEstimator, Encoder, TokenEstimator};
pub use verdict::{FailureReason, PromptVerdict};
