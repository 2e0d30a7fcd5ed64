//! Class-specific solution verifiers.

use std::time::Instant;

use crate::details::VerificationDetails;
use crate::problem::{Problem, ProblemType, Solution};

pub mod generic;
pub mod hash_pow;
pub mod linear_algebra;
pub mod ml_training;

pub use generic::GenericVerifier;
pub use hash_pow::HashPowVerifier;
pub use linear_algebra::LinearAlgebraVerifier;
pub use ml_training::MlTrainingVerifier;

/// A verifier for one problem class.
///
/// `quick_validate` is the cheap structural gate; `verify` produces the
/// full scored verdict. Implementations are immutable after registration
/// and safe to call from any thread.
pub trait Verifier: Send + Sync {
    fn problem_type(&self) -> ProblemType;

    fn quick_validate(&self, problem: &Problem, solution: &Solution) -> bool;

    fn verify(&self, problem: &Problem, solution: &Solution) -> VerificationDetails;

    /// Rough verification cost estimate in milliseconds.
    fn estimate_verification_time_ms(&self, problem: &Problem) -> u64;
}

/// The structural gate every verifier applies: matching problem type,
/// non-empty result, and the solution actually referencing the problem.
pub(crate) fn quick_validate_common(
    expected: ProblemType,
    problem: &Problem,
    solution: &Solution,
) -> bool {
    if problem.problem_type != expected {
        return false;
    }
    if solution.data.result.is_empty() {
        return false;
    }
    solution.problem_id == problem.id
}

/// Per-call timer for `verification_time_ms`.
pub(crate) struct Stopwatch(Instant);

impl Stopwatch {
    pub fn start() -> Self {
        Stopwatch(Instant::now())
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.0.elapsed().as_millis() as u64
    }
}

/// Fills the overall verdict from the accumulated checks: `Valid` iff
/// every check passed, with the first failure surfaced as the error
/// message.
pub(crate) fn finish_verdict(details: &mut VerificationDetails, stopwatch: &Stopwatch) {
    use crate::details::VerificationResult;

    let all_passed = details.all_checks_passed();
    if !all_passed && details.error_message.is_none() {
        if let Some(name) = details.first_failure() {
            details.error_message = Some(format!("Check failed: {name}"));
        }
    }

    details.result = if all_passed {
        VerificationResult::Valid
    } else {
        VerificationResult::Invalid
    };
    details.meets_requirements = all_passed;
    details.verification_time_ms = stopwatch.elapsed_ms();
}
