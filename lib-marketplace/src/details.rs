//! Verification verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationResult {
    Valid,
    Invalid,
    ProblemNotFound,
    Malformed,
    TypeMismatch,
    Timeout,
    Error,
}

impl VerificationResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationResult::Valid => "valid",
            VerificationResult::Invalid => "invalid",
            VerificationResult::ProblemNotFound => "problem_not_found",
            VerificationResult::Malformed => "malformed",
            VerificationResult::TypeMismatch => "type_mismatch",
            VerificationResult::Timeout => "timeout",
            VerificationResult::Error => "error",
        }
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum score a verifier can award.
pub const MAX_SCORE: u32 = 1_000_000;

/// Structured verdict: the overall result, a score in `0..=MAX_SCORE`,
/// and the ordered list of named checks that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationDetails {
    pub result: VerificationResult,
    pub score: u32,
    pub meets_requirements: bool,
    pub verification_time_ms: u64,
    pub error_message: Option<String>,
    pub checks: Vec<(String, bool)>,
}

impl Default for VerificationDetails {
    fn default() -> Self {
        VerificationDetails {
            result: VerificationResult::Invalid,
            score: 0,
            meets_requirements: false,
            verification_time_ms: 0,
            error_message: None,
            checks: Vec::new(),
        }
    }
}

impl VerificationDetails {
    pub fn add_check(&mut self, name: &str, passed: bool) {
        self.checks.push((name.to_string(), passed));
    }

    pub fn all_checks_passed(&self) -> bool {
        self.checks.iter().all(|(_, passed)| *passed)
    }

    /// First failing check, if any.
    pub fn first_failure(&self) -> Option<&str> {
        self.checks
            .iter()
            .find(|(_, passed)| !passed)
            .map(|(name, _)| name.as_str())
    }
}

impl fmt::Display for VerificationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VerificationDetails{{result={}, score={}, time={}ms",
            self.result, self.score, self.verification_time_ms
        )?;
        if let Some(error) = &self.error_message {
            write!(f, ", error=\"{error}\"")?;
        }
        if !self.checks.is_empty() {
            write!(f, ", checks=[")?;
            for (i, (name, passed)) in self.checks.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}:{}", name, if *passed { "pass" } else { "fail" })?;
            }
            write!(f, "]")?;
        }
        write!(f, "}}")
    }
}
