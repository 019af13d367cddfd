use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Why a prompt was rejected.
///
/// The set is closed; callers may match on [`FailureReason::as_str`] values
/// found in [`PromptVerdict::output`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// The estimated token count exceeded `max_tokens`.
    MaxTokenThreshold,
    /// A deny-list phrase (fuzzily) occurs in the prompt.
    DenyList,
}

impl FailureReason {
    /// The stable, human-readable message placed in a failing verdict.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxTokenThreshold => "Failed max token threshold",
            Self::DenyList => "Failed deny list validation",
        }
    }

    /// The enumeration identifier, e.g. `MAX_TOKEN_THRESHOLD`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MaxTokenThreshold => "MAX_TOKEN_THRESHOLD",
            Self::DenyList => "DENY_LIST",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureReason {
    type Err = String;

    /// Accepts either the message or the code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::MaxTokenThreshold, Self::DenyList]
            .into_iter()
            .find(|r| r.as_str() == s || r.code() == s)
            .ok_or_else(|| format!("unknown failure reason: '{s}'"))
    }
}

/// The outcome of one [`PolicyEngine::process`](crate::PolicyEngine::process) call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptVerdict {
    /// `false` when any policy check rejected the prompt.
    pub pass: bool,
    /// The processed prompt on success, the failure message otherwise.
    pub output: String,
}

impl PromptVerdict {
    /// A passing verdict carrying the (possibly encoded) prompt.
    pub fn passed(output: impl Into<String>) -> Self {
        Self {
            pass: true,
            output: output.into(),
        }
    }

    /// A failing verdict carrying the reason message.
    pub fn failed(reason: FailureReason) -> Self {
        Self {
            pass: false,
            output: reason.as_str().to_string(),
        }
    }

    /// The rejection reason, or `None` for passing verdicts.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        if self.pass {
            return None;
        }
        self.output.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_messages_are_stable() {
        assert_eq!(
            FailureReason::MaxTokenThreshold.as_str(),
            "Failed max token threshold"
        );
        assert_eq!(FailureReason::DenyList.as_str(), "Failed deny list validation");
        assert_eq!(FailureReason::DenyList.to_string(), "Failed deny list validation");
    }

    #[test]
    fn parse_accepts_message_and_code() {
        assert_eq!(
            "Failed deny list validation".parse::<FailureReason>().unwrap(),
            FailureReason::DenyList
        );
        assert_eq!(
            "MAX_TOKEN_THRESHOLD".parse::<FailureReason>().unwrap(),
            FailureReason::MaxTokenThreshold
        );
        assert!("nope".parse::<FailureReason>().is_err());
    }

    #[test]
    fn passed_verdict_has_no_reason() {
        // A passing prompt whose text happens to equal a failure message is
        // still a pass.
        let v = PromptVerdict::passed("Failed deny list validation");
        assert!(v.pass);
        assert!(v.failure_reason().is_none());
    }

    #[test]
    fn failed_verdict_round_trips_reason() {
        let v = PromptVerdict::failed(FailureReason::MaxTokenThreshold);
        assert!(!v.pass);
        assert_eq!(v.output, "Failed max token threshold");
        assert_eq!(v.failure_reason(), Some(FailureReason::MaxTokenThreshold));
    }

    #[test]
    fn reason_serializes_as_code() {
        let json = serde_json::to_string(&FailureReason::DenyList).unwrap();
        assert_eq!(json, "\"DENY_LIST\"");
    }

    #[test]
    fn verdict_serializes_to_pass_output_shape() {
        let v = PromptVerdict::failed(FailureReason::DenyList);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"pass": false, "output": "Failed deny list validation"})
        );
    }
}
