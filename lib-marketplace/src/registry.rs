//! Verifier registry.
//!
//! Maps problem types to their verifiers. The registry is injected into
//! whatever needs dispatch (notably [`SolutionVerifier`]) rather than
//! living behind a process-wide singleton, so tests can substitute
//! verifiers and multiple chains can coexist in one process.
//!
//! [`SolutionVerifier`]: crate::solution_verifier::SolutionVerifier

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::problem::ProblemType;
use crate::verifiers::{
    GenericVerifier, HashPowVerifier, LinearAlgebraVerifier, MlTrainingVerifier, Verifier,
};

/// Registered verifiers, keyed by problem type. Registration replaces;
/// the pointed-to verifier is never mutated, so handed-out `Arc`s stay
/// valid and immutable.
#[derive(Default)]
pub struct VerifierRegistry {
    verifiers: Mutex<HashMap<ProblemType, Arc<dyn Verifier>>>,
}

impl VerifierRegistry {
    /// An empty registry. Unregistered types verify as type mismatches.
    pub fn new() -> Self {
        VerifierRegistry::default()
    }

    /// A registry with the standard lineup: specialized verifiers for
    /// hash PoW, ML training and linear algebra, generic verifiers for
    /// everything else.
    pub fn with_default_verifiers() -> Self {
        let registry = VerifierRegistry::new();
        registry.register(Arc::new(HashPowVerifier::new()));
        registry.register(Arc::new(MlTrainingVerifier::new()));
        registry.register(Arc::new(LinearAlgebraVerifier::new()));

        for &problem_type in ProblemType::all() {
            if !registry.has_verifier(problem_type) {
                registry.register(Arc::new(GenericVerifier::new(problem_type)));
            }
        }
        registry
    }

    pub fn register(&self, verifier: Arc<dyn Verifier>) {
        let problem_type = verifier.problem_type();
        self.lock().insert(problem_type, verifier);
        debug!(%problem_type, "verifier registered");
    }

    pub fn get_verifier(&self, problem_type: ProblemType) -> Option<Arc<dyn Verifier>> {
        self.lock().get(&problem_type).cloned()
    }

    pub fn has_verifier(&self, problem_type: ProblemType) -> bool {
        self.lock().contains_key(&problem_type)
    }

    pub fn registered_types(&self) -> Vec<ProblemType> {
        let mut types: Vec<ProblemType> = self.lock().keys().copied().collect();
        types.sort_unstable();
        types
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ProblemType, Arc<dyn Verifier>>> {
        self.verifiers.lock().expect("verifier registry mutex poisoned")
    }
}

impl std::fmt::Debug for VerifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifierRegistry")
            .field("types", &self.registered_types())
            .finish()
    }
}
