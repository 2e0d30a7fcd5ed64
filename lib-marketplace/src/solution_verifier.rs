//! Solution verification dispatcher.
//!
//! Wraps the registry with global statistics and a bounded submission
//! queue for callers that want to offload verification. Statistics are
//! atomics; the mutex only guards the queue, and no lock is held while a
//! verifier runs, so CPU-heavy classification never blocks other
//! submitters.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::details::{VerificationDetails, VerificationResult};
use crate::problem::{Problem, Solution, SolutionId};
use crate::registry::VerifierRegistry;

/// Called with the verdict when an offloaded verification completes.
pub type VerificationCallback = Box<dyn FnOnce(VerificationDetails) + Send + 'static>;

/// Default cap on queued/concurrent offloaded verifications.
const DEFAULT_MAX_CONCURRENT: usize = 8;

struct PendingVerification {
    problem: Problem,
    solution: Solution,
    callback: Option<VerificationCallback>,
}

pub struct SolutionVerifier {
    registry: Arc<VerifierRegistry>,
    max_concurrent: usize,

    total_verifications: AtomicU64,
    successful_count: AtomicU64,
    failed_count: AtomicU64,
    total_verification_time_ms: AtomicU64,

    pending: Mutex<VecDeque<PendingVerification>>,
}

impl SolutionVerifier {
    pub fn new(registry: Arc<VerifierRegistry>) -> Self {
        SolutionVerifier {
            registry,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            total_verifications: AtomicU64::new(0),
            successful_count: AtomicU64::new(0),
            failed_count: AtomicU64::new(0),
            total_verification_time_ms: AtomicU64::new(0),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Synchronous verification: dispatch by problem type, record stats.
    /// An unregistered type yields `TypeMismatch`.
    pub fn verify(&self, problem: &Problem, solution: &Solution) -> VerificationDetails {
        let verifier = match self.registry.get_verifier(problem.problem_type) {
            Some(verifier) => verifier,
            None => {
                let mut details = VerificationDetails::default();
                details.result = VerificationResult::TypeMismatch;
                details.error_message = Some(format!(
                    "No verifier for problem type: {}",
                    problem.problem_type
                ));
                return details;
            }
        };

        let details = verifier.verify(problem, solution);

        self.total_verifications.fetch_add(1, Ordering::Relaxed);
        self.total_verification_time_ms
            .fetch_add(details.verification_time_ms, Ordering::Relaxed);
        if details.result == VerificationResult::Valid {
            self.successful_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_count.fetch_add(1, Ordering::Relaxed);
        }

        details
    }

    /// Cheap structural pre-check; false for unregistered types.
    pub fn quick_validate(&self, problem: &Problem, solution: &Solution) -> bool {
        match self.registry.get_verifier(problem.problem_type) {
            Some(verifier) => verifier.quick_validate(problem, solution),
            None => false,
        }
    }

    /// Enqueues a verification for later processing. Returns false when
    /// the queue is at capacity.
    pub fn submit_for_verification(
        &self,
        problem: Problem,
        solution: Solution,
        callback: VerificationCallback,
    ) -> bool {
        let mut pending = self.lock_pending();

        if pending.len() >= self.max_concurrent {
            warn!(
                queued = pending.len(),
                cap = self.max_concurrent,
                "verification queue full, rejecting submission"
            );
            return false;
        }

        pending.push_back(PendingVerification {
            problem,
            solution,
            callback: Some(callback),
        });
        true
    }

    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    /// Cancellation is not supported; this is a permitted no-op.
    pub fn cancel_verification(&self, _solution_id: SolutionId) -> bool {
        false
    }

    /// Drains the queue on the calling thread, invoking callbacks as
    /// verdicts are produced. Returns the number processed.
    pub fn process_pending(&self) -> usize {
        let mut processed = 0;
        loop {
            let item = self.lock_pending().pop_front();
            let Some(mut item) = item else { break };

            let details = self.verify(&item.problem, &item.solution);
            if let Some(callback) = item.callback.take() {
                callback(details);
            }
            processed += 1;
        }
        debug!(processed, "drained verification queue");
        processed
    }

    /// Drains the queue on the tokio runtime, running at most
    /// `max_concurrent` verifications in parallel on blocking threads.
    pub async fn process_pending_concurrent(self: Arc<Self>) -> usize {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::new();

        loop {
            let item = self.lock_pending().pop_front();
            let Some(mut item) = item else { break };

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .expect("semaphore never closed");
            let this = Arc::clone(&self);

            handles.push(tokio::task::spawn_blocking(move || {
                let details = this.verify(&item.problem, &item.solution);
                if let Some(callback) = item.callback.take() {
                    callback(details);
                }
                drop(permit);
            }));
        }

        let processed = handles.len();
        for handle in handles {
            let _ = handle.await;
        }
        processed
    }

    pub fn total_verifications(&self) -> u64 {
        self.total_verifications.load(Ordering::Relaxed)
    }

    pub fn successful_count(&self) -> u64 {
        self.successful_count.load(Ordering::Relaxed)
    }

    pub fn failed_count(&self) -> u64 {
        self.failed_count.load(Ordering::Relaxed)
    }

    pub fn average_verification_time_ms(&self) -> u64 {
        let total = self.total_verifications.load(Ordering::Relaxed);
        if total == 0 {
            return 0;
        }
        self.total_verification_time_ms.load(Ordering::Relaxed) / total
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, VecDeque<PendingVerification>> {
        self.pending.lock().expect("verification queue mutex poisoned")
    }
}

impl std::fmt::Debug for SolutionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolutionVerifier")
            .field("max_concurrent", &self.max_concurrent)
            .field("total", &self.total_verifications())
            .field("pending", &self.pending_count())
            .finish()
    }
}
