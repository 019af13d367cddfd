//! Error type shared by every component of the guard.
//!
//! Policy failures (too many tokens, deny-list hit) are *not* errors; they
//! are reported through [`PromptVerdict`](crate::verdict::PromptVerdict).
//! A [`GuardError`] means the guard itself could not do its job.

use crate::engine::Stage;

/// Errors returned while building or running a
/// [`PolicyEngine`](crate::engine::PolicyEngine).
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// The resolved configuration cannot produce a useful policy.
    #[error("invalid policy configuration: {0}")]
    InvalidConfig(String),

    /// An injected collaborator (tokenizer, matcher, encoder) failed.
    #[error("{stage} stage failed: {source}")]
    Dependency {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

impl GuardError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub(crate) fn dependency(stage: Stage, source: anyhow::Error) -> Self {
        Self::Dependency { stage, source }
    }

    /// The pipeline stage that failed, for dependency errors.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Dependency { stage, .. } => Some(*stage),
            Self::InvalidConfig(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_message() {
        let err = GuardError::invalid("max_tokens must be greater than zero");
        assert_eq!(
            err.to_string(),
            "invalid policy configuration: max_tokens must be greater than zero"
        );
        assert!(err.stage().is_none());
    }

    #[test]
    fn dependency_error_carries_stage_and_source() {
        let err = GuardError::dependency(Stage::TokenCheck, anyhow::anyhow!("tokenizer offline"));
        assert_eq!(err.stage(), Some(Stage::TokenCheck));
        assert_eq!(err.to_string(), "token-check stage failed: tokenizer offline");

        let source = std::error::Error::source(&err).expect("source must be attached");
        assert_eq!(source.to_string(), "tokenizer offline");
    }
}
