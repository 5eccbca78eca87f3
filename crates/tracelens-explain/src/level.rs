//! Explanation verbosity levels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Controls verbosity, technical density, and which knowledge
/// sentences are preferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationLevel {
    Beginner,
    #[default]
    Medium,
    InterviewReady,
}

impl ExplanationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplanationLevel::Beginner => "beginner",
            ExplanationLevel::Medium => "medium",
            ExplanationLevel::InterviewReady => "interview_ready",
        }
    }
}

impl fmt::Display for ExplanationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExplanationLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(ExplanationLevel::Beginner),
            "medium" => Ok(ExplanationLevel::Medium),
            "interview_ready" => Ok(ExplanationLevel::InterviewReady),
            other => anyhow::bail!(
                "level must be one of beginner, medium, interview_ready, got '{}'",
                other
            ),
        }
    }
}
