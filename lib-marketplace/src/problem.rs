//! Problem and solution model.
//!
//! A problem is published with a spec (input bytes plus verification
//! data); a solution binds to it by problem id and type and carries the
//! result bytes, their hash, an intermediate hash chain witnessing the
//! computation, and solver-reported metrics.

use lib_crypto::{sha256_concat, Hash256};
use serde::{Deserialize, Serialize};

pub type ProblemId = u64;
pub type SolutionId = u64;

/// Classes of useful work the marketplace can verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProblemType {
    HashPow,
    MlTraining,
    MlInference,
    LinearAlgebra,
    Simulation,
    DataProcessing,
    Optimization,
    Cryptographic,
    Custom,
}

impl ProblemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemType::HashPow => "hash_pow",
            ProblemType::MlTraining => "ml_training",
            ProblemType::MlInference => "ml_inference",
            ProblemType::LinearAlgebra => "linear_algebra",
            ProblemType::Simulation => "simulation",
            ProblemType::DataProcessing => "data_processing",
            ProblemType::Optimization => "optimization",
            ProblemType::Cryptographic => "cryptographic",
            ProblemType::Custom => "custom",
        }
    }

    /// Every supported type, in registry order.
    pub fn all() -> &'static [ProblemType] {
        &[
            ProblemType::HashPow,
            ProblemType::MlTraining,
            ProblemType::MlInference,
            ProblemType::LinearAlgebra,
            ProblemType::Simulation,
            ProblemType::DataProcessing,
            ProblemType::Optimization,
            ProblemType::Cryptographic,
            ProblemType::Custom,
        ]
    }

    fn tag(&self) -> u8 {
        match self {
            ProblemType::HashPow => 0,
            ProblemType::MlTraining => 1,
            ProblemType::MlInference => 2,
            ProblemType::LinearAlgebra => 3,
            ProblemType::Simulation => 4,
            ProblemType::DataProcessing => 5,
            ProblemType::Optimization => 6,
            ProblemType::Cryptographic => 7,
            ProblemType::Custom => 8,
        }
    }
}

impl std::fmt::Display for ProblemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a worker needs to solve the problem and a verifier needs to
/// check it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProblemSpec {
    pub input_data: Vec<u8>,
    pub verification_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: ProblemId,
    pub problem_type: ProblemType,
    pub spec: ProblemSpec,
    pub hash: Hash256,
}

impl Problem {
    pub fn new(id: ProblemId, problem_type: ProblemType, spec: ProblemSpec) -> Self {
        let hash = sha256_concat(&[
            &id.to_le_bytes(),
            &[problem_type.tag()],
            &spec.input_data,
            &spec.verification_data,
        ]);
        Problem {
            id,
            problem_type,
            spec,
            hash,
        }
    }
}

/// The computed payload of a solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SolutionData {
    pub result: Vec<u8>,
    pub result_hash: Hash256,
    /// Hash chain of intermediate states, witnessing that the work was
    /// actually iterated rather than fabricated.
    pub intermediates: Vec<Hash256>,
    pub iterations: u64,
    /// Solver-reported accuracy, scaled to 0..=1_000_000.
    pub accuracy: u32,
}

impl SolutionData {
    /// Structural validity only; hash correctness is a verifier check.
    pub fn is_valid(&self) -> bool {
        !self.result.is_empty() && !self.result_hash.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub id: SolutionId,
    pub problem_id: ProblemId,
    pub solver: String,
    pub data: SolutionData,
}

impl Solution {
    pub fn is_valid(&self) -> bool {
        !self.solver.is_empty() && self.data.is_valid()
    }
}
