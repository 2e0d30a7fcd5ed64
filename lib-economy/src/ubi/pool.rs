//! Per-epoch UBI pool.

use lib_consensus::params::{Amount, Height, Params};
use lib_identity::Nullifier;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::claim::EpochId;

/// Accumulator for one epoch's UBI funds.
///
/// Funds accrue while the epoch is open; finalization freezes the
/// per-person allotment. The nullifier set only ever grows; a recorded
/// claim is never forgotten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochUBIPool {
    pub epoch: EpochId,
    pub end_height: Height,
    pub claim_deadline: Height,
    pub total_pool: Amount,
    pub eligible_count: u32,
    pub amount_per_person: Amount,
    pub amount_claimed: Amount,
    pub claim_count: u32,
    pub is_finalized: bool,
    pub used_nullifiers: HashSet<Nullifier>,
}

impl EpochUBIPool {
    pub fn new(epoch: EpochId, end_height: Height) -> Self {
        EpochUBIPool {
            epoch,
            end_height,
            claim_deadline: 0,
            total_pool: 0,
            eligible_count: 0,
            amount_per_person: 0,
            amount_claimed: 0,
            claim_count: 0,
            is_finalized: false,
            used_nullifiers: HashSet::new(),
        }
    }

    /// Freezes the per-person allotment from the authoritative identity
    /// count. Below the identity threshold the allotment is zero; above
    /// it, the equal share capped at the per-person maximum.
    ///
    /// Idempotent only for identical arguments; the distributor rejects
    /// conflicting refinalization before calling here.
    pub fn finalize(&mut self, identity_count: u32, params: &Params) {
        self.eligible_count = identity_count;

        if identity_count >= params.min_identities_for_ubi {
            self.amount_per_person =
                (self.total_pool / identity_count as Amount).min(params.max_ubi_per_person);
        } else {
            self.amount_per_person = 0;
        }

        self.is_finalized = true;
    }

    pub fn is_nullifier_used(&self, nullifier: &Nullifier) -> bool {
        self.used_nullifiers.contains(nullifier)
    }

    /// Records a successful claim. The caller has already checked the
    /// nullifier is fresh and the pool is accepting claims.
    pub fn record_claim(&mut self, nullifier: Nullifier, amount: Amount) {
        self.used_nullifiers.insert(nullifier);
        self.amount_claimed += amount;
        self.claim_count += 1;
    }

    pub fn unclaimed_amount(&self) -> Amount {
        if self.total_pool > self.amount_claimed {
            self.total_pool - self.amount_claimed
        } else {
            0
        }
    }

    /// Claims as a percentage of eligible identities.
    pub fn claim_rate(&self) -> f64 {
        if self.eligible_count == 0 {
            return 0.0;
        }
        self.claim_count as f64 / self.eligible_count as f64 * 100.0
    }

    /// Whether a claim submitted at `height` is within the window.
    pub fn accepting_claims(&self, height: Height) -> bool {
        self.is_finalized && height <= self.claim_deadline
    }
}

impl fmt::Display for EpochUBIPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EpochUBIPool {{ epoch: {}, pool: {}, eligible: {}, perPerson: {}, claimed: {} ({} claims), rate: {:.1}% }}",
            self.epoch,
            self.total_pool,
            self.eligible_count,
            self.amount_per_person,
            self.amount_claimed,
            self.claim_count,
            self.claim_rate()
        )
    }
}
