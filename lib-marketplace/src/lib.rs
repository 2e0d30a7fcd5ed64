//! SHURIUM Marketplace Package
//!
//! Useful-work solution verification: the problem/solution model,
//! class-specific verifiers producing scored structured verdicts, and
//! the dispatch layer with statistics and asynchronous offload.

pub mod details;
pub mod problem;
pub mod registry;
pub mod solution_verifier;
pub mod verifiers;

pub use details::{VerificationDetails, VerificationResult, MAX_SCORE};
pub use problem::{Problem, ProblemId, ProblemSpec, ProblemType, Solution, SolutionData, SolutionId};
pub use registry::VerifierRegistry;
pub use solution_verifier::{SolutionVerifier, VerificationCallback};
pub use verifiers::{
    GenericVerifier, HashPowVerifier, LinearAlgebraVerifier, MlTrainingVerifier, Verifier,
};

use lib_crypto::{sha256_concat, Hash256};

/// First-eight-bytes hash-vs-target check used by workers polling for
/// share-level progress: compares the leading 8 bytes of `hash` as a
/// little-endian integer against `target`.
pub fn verify_hash_target(hash: &Hash256, target: u64) -> bool {
    let hash_value = u64::from_le_bytes(hash.as_bytes()[..8].try_into().expect("8-byte prefix"));
    hash_value < target
}

/// Data-integrity predicate over a solution payload.
pub fn verify_data_integrity(data: &SolutionData) -> bool {
    data.is_valid()
}

/// Binds a problem to a solution payload for audit logs and receipts.
pub fn compute_verification_hash(problem: &Problem, data: &SolutionData) -> Hash256 {
    sha256_concat(&[problem.hash.as_bytes(), data.result_hash.as_bytes()])
}
