//! The UBI distributor: owns every epoch pool and the claim pipeline.
//!
//! One mutex guards all distributor state. Every public operation takes
//! the lock for its whole body, including the query helpers, and nothing
//! is called back into the distributor while it is held; the lock is a
//! strict leaf. Claim ordering guarantees follow directly: two claims
//! racing on one nullifier serialize on the lock, so exactly one sees
//! `Valid` and the other `DoubleClaim`.

use lib_consensus::params::{Amount, Height, Params};
use lib_crypto::{Fp, Hash256};
use lib_identity::{IdentityOracle, Nullifier, ProofType, ProofVerifier, ZKProof, UBI_CLAIM_CIRCUIT};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, warn};

use super::claim::{ClaimStatus, EpochId, UBIClaim, UbiError};
use super::pool::EpochUBIPool;

/// Deserialization sanity caps; larger counts are malformed input.
const MAX_POOLS: u32 = 10_000;
const MAX_NULLIFIERS_PER_POOL: u32 = 1_000_000;

/// Snapshot format version.
const SERIALIZATION_VERSION: u8 = 0x01;

/// Epoch containing `height`.
pub fn height_to_epoch(height: Height, params: &Params) -> EpochId {
    debug_assert!(height >= 0);
    height as EpochId / params.epoch_blocks as EpochId
}

/// Last height inside `epoch`.
pub fn epoch_end_height(epoch: EpochId, params: &Params) -> Height {
    ((epoch + 1) * params.epoch_blocks as EpochId - 1) as Height
}

/// Per-epoch statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EpochStats {
    pub epoch: EpochId,
    pub pool_size: Amount,
    pub distributed: Amount,
    pub unclaimed: Amount,
    pub eligible_count: u32,
    pub claim_count: u32,
    pub claim_rate: f64,
}

#[derive(Debug, Default)]
struct DistributorState {
    pools: HashMap<EpochId, EpochUBIPool>,
    current_epoch: EpochId,
    total_distributed: Amount,
    total_claims: u64,
}

impl DistributorState {
    fn get_or_create_pool(&mut self, epoch: EpochId, params: &Params) -> &mut EpochUBIPool {
        self.pools
            .entry(epoch)
            .or_insert_with(|| EpochUBIPool::new(epoch, epoch_end_height(epoch, params)))
    }
}

/// Owner of all epoch pools. See the module docs for the locking
/// contract; the proof system is injected so tests and multi-chain
/// processes can substitute their own.
#[derive(Debug)]
pub struct UBIDistributor {
    params: Params,
    state: Mutex<DistributorState>,
}

impl UBIDistributor {
    pub fn new(params: Params) -> Self {
        UBIDistributor {
            params,
            state: Mutex::new(DistributorState::default()),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Routes a block's UBI split into the pool for that height's epoch
    /// and advances the current-epoch watermark. Heights must arrive in
    /// non-decreasing order; out-of-order delivery is not supported.
    pub fn add_block_reward(&self, height: Height, amount: Amount) {
        let mut state = self.lock();

        let epoch = height_to_epoch(height, &self.params);

        if epoch > state.current_epoch {
            // Epochs are finalized by an explicit FinalizeEpoch call with
            // the authoritative identity count; crossing a boundary with
            // prior epochs still open is an operational problem worth
            // surfacing, not something to fix up silently here.
            for e in state.current_epoch..epoch {
                if let Some(pool) = state.pools.get(&e) {
                    if !pool.is_finalized {
                        warn!(epoch = e, "advancing past unfinalized UBI epoch");
                    }
                }
            }
            state.current_epoch = epoch;
        }

        let pool = state.get_or_create_pool(epoch, &self.params);
        pool.total_pool = pool
            .total_pool
            .checked_add(amount)
            .expect("UBI pool balance overflow");
        debug!(height, epoch, amount, total = pool.total_pool, "UBI reward added");
    }

    /// Freezes `epoch`'s per-person allotment from the identity count.
    ///
    /// No-op when no pool exists for the epoch (no rewards ever routed
    /// there) or when refinalizing with the identical count. Refinalizing
    /// with a different count is refused: the allotment of a finalized
    /// pool must never change.
    pub fn finalize_epoch(&self, epoch: EpochId, identity_count: u32) -> Result<(), UbiError> {
        let mut state = self.lock();
        let params = &self.params;

        let pool = match state.pools.get_mut(&epoch) {
            Some(pool) => pool,
            None => return Ok(()),
        };

        if pool.is_finalized {
            if pool.eligible_count == identity_count {
                return Ok(());
            }
            return Err(UbiError::FinalizeConflict {
                epoch,
                existing: pool.eligible_count,
                requested: identity_count,
            });
        }

        pool.end_height = epoch_end_height(epoch, params);
        pool.claim_deadline = pool.end_height
            + params.ubi_claim_window
            + (params.ubi_grace_epochs as Height * params.epoch_blocks);
        pool.finalize(identity_count, params);

        info!(
            epoch,
            identity_count,
            amount_per_person = pool.amount_per_person,
            claim_deadline = pool.claim_deadline,
            "UBI epoch finalized"
        );
        Ok(())
    }

    /// Block-connect pipeline entry: ingest the height's UBI split, and
    /// on the last block of an epoch finalize it from the identity
    /// oracle.
    pub fn on_block_connected(
        &self,
        height: Height,
        ubi_amount: Amount,
        oracle: &dyn IdentityOracle,
    ) -> Result<(), UbiError> {
        self.add_block_reward(height, ubi_amount);

        let epoch = height_to_epoch(height, &self.params);
        if height == epoch_end_height(epoch, &self.params) {
            self.finalize_epoch(epoch, oracle.count_at(epoch))?;
        }
        Ok(())
    }

    /// Processes a claim, writing the outcome into `claim.status` and
    /// returning it. The check order is part of the contract: pool
    /// existence/finalization, deadline, pool funds, double-claim, then
    /// proof validity. An earlier failure shadows any later one.
    pub fn process_claim(
        &self,
        claim: &mut UBIClaim,
        identity_tree_root: &Hash256,
        current_height: Height,
        verifier: &dyn ProofVerifier,
    ) -> ClaimStatus {
        let mut state = self.lock();

        claim.submit_height = current_height;

        let pool = match state.pools.get_mut(&claim.epoch) {
            Some(pool) => pool,
            None => {
                claim.status = ClaimStatus::EpochNotComplete;
                return claim.status;
            }
        };

        if !pool.is_finalized {
            claim.status = ClaimStatus::EpochNotComplete;
            return claim.status;
        }

        if !pool.accepting_claims(current_height) {
            claim.status = ClaimStatus::EpochExpired;
            return claim.status;
        }

        if pool.amount_per_person == 0 {
            claim.status = ClaimStatus::PoolEmpty;
            return claim.status;
        }

        if pool.is_nullifier_used(&claim.nullifier) {
            claim.status = ClaimStatus::DoubleClaim;
            return claim.status;
        }

        if !proof_admissible(&claim.proof, claim.epoch, identity_tree_root, verifier) {
            claim.status = ClaimStatus::InvalidProof;
            return claim.status;
        }

        claim.amount = pool.amount_per_person;
        claim.status = ClaimStatus::Valid;
        pool.record_claim(claim.nullifier, claim.amount);

        state.total_distributed += claim.amount;
        state.total_claims += 1;

        debug!(
            epoch = claim.epoch,
            amount = claim.amount,
            height = current_height,
            "UBI claim admitted"
        );
        claim.status
    }

    /// Read-only form of the claim predicate, for relayers pre-screening
    /// claims: no status write, no nullifier recording, no counters.
    pub fn verify_claim(
        &self,
        claim: &UBIClaim,
        identity_tree_root: &Hash256,
        current_height: Height,
        verifier: &dyn ProofVerifier,
    ) -> bool {
        let state = self.lock();

        let pool = match state.pools.get(&claim.epoch) {
            Some(pool) => pool,
            None => return false,
        };

        if !pool.is_finalized || !pool.accepting_claims(current_height) {
            return false;
        }

        if pool.is_nullifier_used(&claim.nullifier) {
            return false;
        }

        proof_admissible(&claim.proof, claim.epoch, identity_tree_root, verifier)
    }

    pub fn is_epoch_claimable(&self, epoch: EpochId, current_height: Height) -> bool {
        let state = self.lock();
        state
            .pools
            .get(&epoch)
            .map(|pool| pool.is_finalized && pool.accepting_claims(current_height))
            .unwrap_or(false)
    }

    /// Claim deadline for `epoch`, or -1 when no pool exists.
    pub fn get_claim_deadline(&self, epoch: EpochId) -> Height {
        let state = self.lock();
        state
            .pools
            .get(&epoch)
            .map(|pool| pool.claim_deadline)
            .unwrap_or(-1)
    }

    pub fn get_pool(&self, epoch: EpochId) -> Option<EpochUBIPool> {
        let state = self.lock();
        state.pools.get(&epoch).cloned()
    }

    pub fn get_amount_per_person(&self, epoch: EpochId) -> Amount {
        let state = self.lock();
        state
            .pools
            .get(&epoch)
            .filter(|pool| pool.is_finalized)
            .map(|pool| pool.amount_per_person)
            .unwrap_or(0)
    }

    pub fn get_epoch_stats(&self, epoch: EpochId) -> EpochStats {
        let state = self.lock();
        let mut stats = EpochStats {
            epoch,
            ..EpochStats::default()
        };
        if let Some(pool) = state.pools.get(&epoch) {
            stats.pool_size = pool.total_pool;
            stats.distributed = pool.amount_claimed;
            stats.unclaimed = pool.unclaimed_amount();
            stats.eligible_count = pool.eligible_count;
            stats.claim_count = pool.claim_count;
            stats.claim_rate = pool.claim_rate();
        }
        stats
    }

    /// Mean claim rate over finalized pools.
    pub fn get_average_claim_rate(&self) -> f64 {
        let state = self.lock();

        let mut total = 0.0;
        let mut count = 0u32;
        for pool in state.pools.values() {
            if pool.is_finalized {
                total += pool.claim_rate();
                count += 1;
            }
        }

        if count > 0 {
            total / count as f64
        } else {
            0.0
        }
    }

    pub fn current_epoch(&self) -> EpochId {
        self.lock().current_epoch
    }

    pub fn total_distributed(&self) -> Amount {
        self.lock().total_distributed
    }

    pub fn total_claims(&self) -> u64 {
        self.lock().total_claims
    }

    /// Drops pools older than the grace period plus a safety buffer.
    pub fn prune_old_pools(&self, current_epoch: EpochId) {
        let mut state = self.lock();
        let buffer = self.params.ubi_grace_epochs + 10;
        let cutoff = current_epoch.saturating_sub(buffer);

        let before = state.pools.len();
        state.pools.retain(|&epoch, _| epoch >= cutoff);
        let removed = before - state.pools.len();
        if removed > 0 {
            debug!(removed, cutoff, "pruned UBI pools");
        }
    }

    /// Versioned little-endian snapshot of the full distributor state.
    /// Pools and nullifiers are emitted in sorted order, so equal states
    /// serialize to equal bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let state = self.lock();

        let mut out = Vec::new();
        out.push(SERIALIZATION_VERSION);
        out.extend_from_slice(&state.current_epoch.to_le_bytes());
        out.extend_from_slice(&(state.pools.len() as u32).to_le_bytes());

        let mut epochs: Vec<EpochId> = state.pools.keys().copied().collect();
        epochs.sort_unstable();

        for epoch in epochs {
            let pool = &state.pools[&epoch];
            out.extend_from_slice(&epoch.to_le_bytes());
            out.extend_from_slice(&pool.total_pool.to_le_bytes());
            out.extend_from_slice(&pool.eligible_count.to_le_bytes());
            out.extend_from_slice(&pool.amount_per_person.to_le_bytes());
            out.extend_from_slice(&pool.amount_claimed.to_le_bytes());
            out.extend_from_slice(&pool.claim_count.to_le_bytes());
            out.push(if pool.is_finalized { 0x01 } else { 0x00 });
            out.extend_from_slice(&pool.end_height.to_le_bytes());
            out.extend_from_slice(&pool.claim_deadline.to_le_bytes());
            out.extend_from_slice(&(pool.used_nullifiers.len() as u32).to_le_bytes());

            let mut hashes: Vec<[u8; 32]> = pool
                .used_nullifiers
                .iter()
                .map(|n| *n.hash().as_bytes())
                .collect();
            hashes.sort_unstable();
            for hash in hashes {
                out.extend_from_slice(&hash);
            }
        }

        out
    }

    /// Restores a distributor from a snapshot produced by [`serialize`].
    ///
    /// [`serialize`]: UBIDistributor::serialize
    pub fn deserialize(data: &[u8], params: Params) -> Result<UBIDistributor, UbiError> {
        let mut reader = Reader::new(data);

        let version = reader.u8()?;
        if version != SERIALIZATION_VERSION {
            return Err(UbiError::UnsupportedVersion(version));
        }

        let current_epoch = reader.u64()?;
        let pool_count = reader.u32()?;
        if pool_count > MAX_POOLS {
            return Err(UbiError::Malformed("pool count exceeds cap"));
        }

        let mut pools = HashMap::with_capacity(pool_count as usize);
        for _ in 0..pool_count {
            let epoch = reader.u64()?;
            let mut pool = EpochUBIPool::new(epoch, 0);
            pool.total_pool = reader.i64()?;
            pool.eligible_count = reader.u32()?;
            pool.amount_per_person = reader.i64()?;
            pool.amount_claimed = reader.i64()?;
            pool.claim_count = reader.u32()?;
            pool.is_finalized = reader.u8()? != 0;
            pool.end_height = reader.i32()?;
            pool.claim_deadline = reader.i32()?;

            let nullifier_count = reader.u32()?;
            if nullifier_count > MAX_NULLIFIERS_PER_POOL {
                return Err(UbiError::Malformed("nullifier count exceeds cap"));
            }
            for _ in 0..nullifier_count {
                let hash = Hash256::from_slice(reader.take(32)?)
                    .ok_or(UbiError::Malformed("nullifier hash"))?;
                pool.used_nullifiers.insert(Nullifier::new(hash, epoch));
            }

            if pools.insert(epoch, pool).is_some() {
                return Err(UbiError::Malformed("duplicate pool epoch"));
            }
        }

        // Aggregate counters are derivable; restore them from the pools.
        let total_distributed: Amount = pools.values().map(|p| p.amount_claimed).sum();
        let total_claims: u64 = pools.values().map(|p| p.claim_count as u64).sum();

        Ok(UBIDistributor {
            params,
            state: Mutex::new(DistributorState {
                pools,
                current_epoch,
                total_distributed,
                total_claims,
            }),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DistributorState> {
        // A poisoned mutex means a panic mid-update; distributor state
        // can no longer be trusted past that point.
        self.state.lock().expect("UBI distributor mutex poisoned")
    }
}

/// The proof admission predicate shared by `process_claim` and
/// `verify_claim`: structural validity, the UBI claim type, at least
/// three public inputs, the identity root and epoch bindings, then the
/// circuit verification itself.
fn proof_admissible(
    proof: &ZKProof,
    epoch: EpochId,
    identity_tree_root: &Hash256,
    verifier: &dyn ProofVerifier,
) -> bool {
    if !proof.is_valid() {
        return false;
    }

    if proof.proof_type() != Some(ProofType::UBIClaim) {
        return false;
    }

    let inputs = proof.public_inputs();
    if inputs.len() < 3 {
        return false;
    }

    let expected_root = Fp::from_bytes_le_reduced(identity_tree_root.as_bytes());
    if inputs[0] != expected_root {
        return false;
    }

    if inputs[2] != Fp::from_u64(epoch) {
        return false;
    }

    verifier.verify(proof, UBI_CLAIM_CIRCUIT)
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Reader { data, offset: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], UbiError> {
        if self.offset + n > self.data.len() {
            return Err(UbiError::Malformed("truncated snapshot"));
        }
        let slice = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, UbiError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, UbiError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn i32(&mut self) -> Result<i32, UbiError> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn u64(&mut self) -> Result<u64, UbiError> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn i64(&mut self) -> Result<i64, UbiError> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }
}
