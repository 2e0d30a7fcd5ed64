//! Generic verifier for problem classes without a specialized checker.
//!
//! Only structural guarantees: the result is present, hashes to the
//! claimed hash, names its solver and references the right problem.

use lib_crypto::sha256;

use super::{finish_verdict, quick_validate_common, Stopwatch, Verifier};
use crate::details::{VerificationDetails, VerificationResult, MAX_SCORE};
use crate::problem::{Problem, ProblemType, Solution};

#[derive(Debug, Clone, Copy)]
pub struct GenericVerifier {
    problem_type: ProblemType,
}

impl GenericVerifier {
    pub fn new(problem_type: ProblemType) -> Self {
        GenericVerifier { problem_type }
    }
}

impl Verifier for GenericVerifier {
    fn problem_type(&self) -> ProblemType {
        self.problem_type
    }

    fn quick_validate(&self, problem: &Problem, solution: &Solution) -> bool {
        quick_validate_common(self.problem_type, problem, solution)
    }

    fn verify(&self, problem: &Problem, solution: &Solution) -> VerificationDetails {
        let stopwatch = Stopwatch::start();
        let mut details = VerificationDetails::default();

        if !self.quick_validate(problem, solution) {
            details.result = VerificationResult::Malformed;
            details.error_message = Some("Quick validation failed".to_string());
            return details;
        }

        let data = &solution.data;

        details.add_check("result_non_empty", !data.result.is_empty());
        details.add_check("hash_valid", sha256(&data.result) == data.result_hash);
        details.add_check("solver_specified", !solution.solver.is_empty());
        details.add_check("problem_match", solution.problem_id == problem.id);

        // Hash-derived score, echoing the proof-of-work intuition that
        // lower hash values are scarcer.
        let hash_value =
            u64::from_le_bytes(data.result_hash.as_bytes()[..8].try_into().unwrap());
        details.score = (MAX_SCORE as u64 - hash_value % MAX_SCORE as u64) as u32;

        finish_verdict(&mut details, &stopwatch);
        details
    }

    fn estimate_verification_time_ms(&self, _problem: &Problem) -> u64 {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ProblemSpec, SolutionData};

    fn setup(problem_type: ProblemType) -> (Problem, Solution) {
        let problem = Problem::new(
            21,
            problem_type,
            ProblemSpec {
                input_data: vec![9, 9, 9],
                verification_data: vec![],
            },
        );
        let result = vec![5u8; 40];
        let solution = Solution {
            id: 22,
            problem_id: problem.id,
            solver: "sim-worker".to_string(),
            data: SolutionData {
                result_hash: sha256(&result),
                result,
                intermediates: vec![],
                iterations: 3,
                accuracy: 0,
            },
        };
        (problem, solution)
    }

    #[test]
    fn test_structurally_sound_solution_verifies() {
        let (problem, solution) = setup(ProblemType::Simulation);
        let verifier = GenericVerifier::new(ProblemType::Simulation);

        let details = verifier.verify(&problem, &solution);
        assert_eq!(details.result, VerificationResult::Valid);
        assert!(details.meets_requirements);
        assert!(details.score <= MAX_SCORE);
    }

    #[test]
    fn test_hash_mismatch_rejected() {
        let (problem, mut solution) = setup(ProblemType::Simulation);
        solution.data.result[0] ^= 1;

        let verifier = GenericVerifier::new(ProblemType::Simulation);
        let details = verifier.verify(&problem, &solution);
        assert_eq!(details.result, VerificationResult::Invalid);
        assert_eq!(details.error_message.as_deref(), Some("Check failed: hash_valid"));
    }

    #[test]
    fn test_type_binding() {
        let (problem, solution) = setup(ProblemType::Simulation);
        let wrong = GenericVerifier::new(ProblemType::Optimization);
        assert!(!wrong.quick_validate(&problem, &solution));
    }

    #[test]
    fn test_missing_solver_rejected() {
        let (problem, mut solution) = setup(ProblemType::DataProcessing);
        solution.solver.clear();

        let verifier = GenericVerifier::new(ProblemType::DataProcessing);
        let details = verifier.verify(&problem, &solution);
        assert_eq!(details.result, VerificationResult::Invalid);
    }
}
