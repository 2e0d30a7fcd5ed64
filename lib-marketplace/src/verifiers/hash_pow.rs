//! Hash proof-of-work verifier.
//!
//! The problem input's first 32 bytes are the target. A solution is
//! valid when its result hashes to the claimed hash and that hash is
//! below the target in little-endian unsigned order.

use lib_crypto::{sha256, Hash256};

use super::{finish_verdict, quick_validate_common, Stopwatch, Verifier};
use crate::details::{VerificationDetails, VerificationResult, MAX_SCORE};
use crate::problem::{Problem, ProblemType, Solution};

#[derive(Debug, Default, Clone, Copy)]
pub struct HashPowVerifier;

impl HashPowVerifier {
    pub fn new() -> Self {
        HashPowVerifier
    }

    /// Score from the leading 8 bytes: how far below the target prefix
    /// the hash prefix landed, scaled to `MAX_SCORE`.
    fn score(target: &Hash256, result_hash: &Hash256) -> u32 {
        let target_value = u64::from_le_bytes(target.as_bytes()[..8].try_into().unwrap());
        let hash_value = u64::from_le_bytes(result_hash.as_bytes()[..8].try_into().unwrap());

        if target_value == 0 || hash_value >= target_value {
            return 0;
        }

        ((target_value - hash_value) as f64 / target_value as f64 * MAX_SCORE as f64) as u32
    }
}

impl Verifier for HashPowVerifier {
    fn problem_type(&self) -> ProblemType {
        ProblemType::HashPow
    }

    fn quick_validate(&self, problem: &Problem, solution: &Solution) -> bool {
        quick_validate_common(ProblemType::HashPow, problem, solution)
    }

    fn verify(&self, problem: &Problem, solution: &Solution) -> VerificationDetails {
        let stopwatch = Stopwatch::start();
        let mut details = VerificationDetails::default();

        if !self.quick_validate(problem, solution) {
            details.result = VerificationResult::Malformed;
            details.error_message = Some("Quick validation failed".to_string());
            return details;
        }

        let input = &problem.spec.input_data;
        if input.len() < 32 {
            details.result = VerificationResult::Malformed;
            details.error_message = Some("Problem input data too small".to_string());
            return details;
        }

        let target = Hash256::from_slice(&input[..32]).expect("32-byte slice");
        let result_hash = solution.data.result_hash;

        details.add_check("hash_below_target", result_hash < target);

        let computed = sha256(&solution.data.result);
        details.add_check("hash_valid", computed == result_hash);

        details.score = Self::score(&target, &result_hash);

        finish_verdict(&mut details, &stopwatch);
        details
    }

    fn estimate_verification_time_ms(&self, _problem: &Problem) -> u64 {
        // One SHA-256 and a comparison.
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ProblemSpec, SolutionData};

    fn problem_with_target(target: [u8; 32]) -> Problem {
        Problem::new(
            1,
            ProblemType::HashPow,
            ProblemSpec {
                input_data: target.to_vec(),
                verification_data: vec![],
            },
        )
    }

    fn solution_for(problem: &Problem, result: Vec<u8>) -> Solution {
        let result_hash = sha256(&result);
        Solution {
            id: 9,
            problem_id: problem.id,
            solver: "worker".to_string(),
            data: SolutionData {
                result,
                result_hash,
                intermediates: vec![],
                iterations: 1,
                accuracy: 0,
            },
        }
    }

    #[test]
    fn test_easy_target_accepts_any_result() {
        // Maximum target: every hash is below it.
        let problem = problem_with_target([0xFF; 32]);
        let solution = solution_for(&problem, vec![0u8; 8]);

        let details = HashPowVerifier::new().verify(&problem, &solution);
        assert_eq!(details.result, VerificationResult::Valid);
        assert!(details.meets_requirements);
        assert!(details.all_checks_passed());
    }

    #[test]
    fn test_wrong_claimed_hash_rejected() {
        let problem = problem_with_target([0xFF; 32]);
        let mut solution = solution_for(&problem, vec![0u8; 8]);
        solution.data.result_hash = Hash256::from_bytes([1u8; 32]);

        let details = HashPowVerifier::new().verify(&problem, &solution);
        assert_eq!(details.result, VerificationResult::Invalid);
        assert!(details
            .checks
            .iter()
            .any(|(name, passed)| name == "hash_valid" && !passed));
    }

    #[test]
    fn test_impossible_target_rejected() {
        // Zero target: no hash is strictly below it.
        let problem = problem_with_target([0x00; 32]);
        let solution = solution_for(&problem, vec![0u8; 8]);

        let details = HashPowVerifier::new().verify(&problem, &solution);
        assert_eq!(details.result, VerificationResult::Invalid);
        assert!(details
            .checks
            .iter()
            .any(|(name, passed)| name == "hash_below_target" && !passed));
    }

    #[test]
    fn test_short_input_malformed() {
        let problem = Problem::new(
            1,
            ProblemType::HashPow,
            ProblemSpec {
                input_data: vec![0u8; 16],
                verification_data: vec![],
            },
        );
        let solution = solution_for(&problem, vec![1, 2, 3]);

        let details = HashPowVerifier::new().verify(&problem, &solution);
        assert_eq!(details.result, VerificationResult::Malformed);
    }

    #[test]
    fn test_type_mismatch_fails_quick_validate() {
        let problem = Problem::new(
            1,
            ProblemType::Custom,
            ProblemSpec {
                input_data: vec![0u8; 32],
                verification_data: vec![],
            },
        );
        let solution = solution_for(&problem, vec![1]);
        assert!(!HashPowVerifier::new().quick_validate(&problem, &solution));
    }

    #[test]
    fn test_score_prefers_lower_hashes() {
        let target = [0xFF; 32];
        let low = Hash256::from_bytes([0x01; 32]);
        let high = Hash256::from_bytes([0xF0; 32]);
        let target = Hash256::from_bytes(target);
        assert!(HashPowVerifier::score(&target, &low) > HashPowVerifier::score(&target, &high));
    }
}
