//! Integration tests for the UBI distribution engine.

use lib_consensus::params::Params;
use lib_crypto::{Hash160, Hash256};
use lib_economy::{
    epoch_end_height, ClaimStatus, EpochId, UBIClaim, UBIClaimGenerator, UBIDistributor, UbiError,
};
use lib_identity::{
    IdentitySecrets, IdentityTree, MerkleProof, StaticIdentityOracle, TranscriptProofSystem,
};
use std::sync::Arc;

/// Small epochs so tests can walk entire windows.
fn test_params() -> Params {
    Params {
        epoch_blocks: 10,
        ubi_claim_window: 20,
        ubi_grace_epochs: 1,
        ..Params::testnet()
    }
}

struct Harness {
    params: Params,
    distributor: UBIDistributor,
    tree: IdentityTree,
    proof_system: TranscriptProofSystem,
    identities: Vec<IdentitySecrets>,
}

impl Harness {
    /// Registers `count` identities and fills epoch 1 with rewards.
    fn new(count: usize) -> Self {
        let params = test_params();
        let distributor = UBIDistributor::new(params.clone());
        let mut tree = IdentityTree::new(8);

        let identities: Vec<IdentitySecrets> = (0..count)
            .map(|i| IdentitySecrets::from_seed(format!("identity {i}").as_bytes()))
            .collect();
        for identity in &identities {
            tree.insert(identity.commitment().to_field_element());
        }

        // Route one reward into every block of epoch 1.
        for height in 10..20 {
            distributor.add_block_reward(height, 1_000);
        }

        Harness {
            params,
            distributor,
            tree,
            proof_system: TranscriptProofSystem::new(),
            identities,
        }
    }

    fn finalize(&self, epoch: EpochId) {
        self.distributor
            .finalize_epoch(epoch, self.identities.len() as u32)
            .expect("finalize");
    }

    fn root(&self) -> Hash256 {
        self.tree.root_hash()
    }

    fn claim_for(&self, index: usize, epoch: EpochId) -> UBIClaim {
        let membership = self.tree.prove(index).expect("member");
        UBIClaim::create(
            epoch,
            &self.identities[index],
            Hash160::from_bytes([index as u8; 20]),
            &membership,
            &self.proof_system,
        )
    }

    fn in_window_height(&self, epoch: EpochId) -> i32 {
        epoch_end_height(epoch, &self.params) + 1
    }
}

#[test]
fn test_successful_claim_pays_per_person_amount() {
    let harness = Harness::new(4);
    harness.finalize(1);

    let mut claim = harness.claim_for(0, 1);
    let status = harness.distributor.process_claim(
        &mut claim,
        &harness.root(),
        harness.in_window_height(1),
        &harness.proof_system,
    );

    assert_eq!(status, ClaimStatus::Valid);
    // 10 blocks x 1000 units split over 4 identities.
    assert_eq!(claim.amount, 2_500);
    assert_eq!(harness.distributor.total_claims(), 1);
    assert_eq!(harness.distributor.total_distributed(), 2_500);
}

#[test]
fn test_double_claim_rejected() {
    let harness = Harness::new(4);
    harness.finalize(1);
    let height = harness.in_window_height(1);

    let mut first = harness.claim_for(0, 1);
    let mut second = harness.claim_for(0, 1);
    assert_eq!(first.nullifier, second.nullifier);

    assert_eq!(
        harness
            .distributor
            .process_claim(&mut first, &harness.root(), height, &harness.proof_system),
        ClaimStatus::Valid
    );
    assert_eq!(
        harness
            .distributor
            .process_claim(&mut second, &harness.root(), height, &harness.proof_system),
        ClaimStatus::DoubleClaim
    );

    let pool = harness.distributor.get_pool(1).unwrap();
    assert_eq!(pool.claim_count, 1);
    assert_eq!(pool.amount_claimed, pool.amount_per_person);
}

#[test]
fn test_double_claim_shadows_invalid_proof() {
    let harness = Harness::new(4);
    harness.finalize(1);
    let height = harness.in_window_height(1);

    let mut first = harness.claim_for(0, 1);
    harness
        .distributor
        .process_claim(&mut first, &harness.root(), height, &harness.proof_system);

    // Same nullifier, garbage proof: the double-claim check runs first
    // and must shadow the proof failure.
    let mut second = harness.claim_for(0, 1);
    second.proof = Default::default();
    assert_eq!(
        harness
            .distributor
            .process_claim(&mut second, &harness.root(), height, &harness.proof_system),
        ClaimStatus::DoubleClaim
    );
}

#[test]
fn test_expired_epoch_rejected_without_state_change() {
    let harness = Harness::new(4);
    harness.finalize(1);

    let deadline = harness.distributor.get_claim_deadline(1);
    assert!(deadline > 0);

    let mut claim = harness.claim_for(0, 1);
    let status = harness.distributor.process_claim(
        &mut claim,
        &harness.root(),
        deadline + 1,
        &harness.proof_system,
    );

    assert_eq!(status, ClaimStatus::EpochExpired);
    let pool = harness.distributor.get_pool(1).unwrap();
    assert_eq!(pool.claim_count, 0);
    assert_eq!(pool.amount_claimed, 0);
    assert!(pool.used_nullifiers.is_empty());
    assert_eq!(harness.distributor.total_claims(), 0);
    assert_eq!(harness.distributor.total_distributed(), 0);
}

#[test]
fn test_claim_at_deadline_still_accepted() {
    let harness = Harness::new(4);
    harness.finalize(1);

    let deadline = harness.distributor.get_claim_deadline(1);
    let mut claim = harness.claim_for(0, 1);
    assert_eq!(
        harness
            .distributor
            .process_claim(&mut claim, &harness.root(), deadline, &harness.proof_system),
        ClaimStatus::Valid
    );
}

#[test]
fn test_insufficient_identities_empty_pool() {
    let harness = Harness::new(4);
    let params = test_params();
    let below = params.min_identities_for_ubi - 1;

    harness.distributor.finalize_epoch(1, below).unwrap();
    assert_eq!(harness.distributor.get_amount_per_person(1), 0);

    let mut claim = harness.claim_for(0, 1);
    assert_eq!(
        harness.distributor.process_claim(
            &mut claim,
            &harness.root(),
            harness.in_window_height(1),
            &harness.proof_system,
        ),
        ClaimStatus::PoolEmpty
    );
}

#[test]
fn test_unfinalized_epoch_not_complete() {
    let harness = Harness::new(4);

    let mut claim = harness.claim_for(0, 1);
    assert_eq!(
        harness.distributor.process_claim(
            &mut claim,
            &harness.root(),
            harness.in_window_height(1),
            &harness.proof_system,
        ),
        ClaimStatus::EpochNotComplete
    );

    // Same for an epoch no reward ever touched.
    let mut other = harness.claim_for(0, 7);
    assert_eq!(
        harness.distributor.process_claim(
            &mut other,
            &harness.root(),
            harness.in_window_height(7),
            &harness.proof_system,
        ),
        ClaimStatus::EpochNotComplete
    );
}

#[test]
fn test_wrong_root_is_invalid_proof() {
    let harness = Harness::new(4);
    harness.finalize(1);

    let mut claim = harness.claim_for(0, 1);
    let wrong_root = Hash256::from_bytes([0x99; 32]);
    assert_eq!(
        harness.distributor.process_claim(
            &mut claim,
            &wrong_root,
            harness.in_window_height(1),
            &harness.proof_system,
        ),
        ClaimStatus::InvalidProof
    );

    // Failure leaves no trace in the pool.
    let pool = harness.distributor.get_pool(1).unwrap();
    assert!(pool.used_nullifiers.is_empty());
}

#[test]
fn test_epoch_mismatch_is_invalid_proof() {
    let harness = Harness::new(4);
    harness.finalize(1);
    harness.finalize(0);

    // Proof generated for epoch 2, claim submitted against epoch 1.
    let mut claim = harness.claim_for(0, 2);
    claim.epoch = 1;
    assert_eq!(
        harness.distributor.process_claim(
            &mut claim,
            &harness.root(),
            harness.in_window_height(1),
            &harness.proof_system,
        ),
        ClaimStatus::InvalidProof
    );
}

#[test]
fn test_tampered_payload_is_invalid_proof() {
    let harness = Harness::new(4);
    harness.finalize(1);

    let mut claim = harness.claim_for(0, 1);
    let mut payload = claim.proof.payload().to_vec();
    payload[0] ^= 0xFF;
    claim.proof = lib_identity::ZKProof::new(
        lib_identity::ProofType::UBIClaim,
        claim.proof.public_inputs().to_vec(),
        payload,
    );

    assert_eq!(
        harness.distributor.process_claim(
            &mut claim,
            &harness.root(),
            harness.in_window_height(1),
            &harness.proof_system,
        ),
        ClaimStatus::InvalidProof
    );
}

#[test]
fn test_verify_claim_is_read_only() {
    let harness = Harness::new(4);
    harness.finalize(1);
    let height = harness.in_window_height(1);

    let claim = harness.claim_for(0, 1);
    assert!(harness
        .distributor
        .verify_claim(&claim, &harness.root(), height, &harness.proof_system));

    // Screening does not consume the nullifier.
    let pool = harness.distributor.get_pool(1).unwrap();
    assert!(pool.used_nullifiers.is_empty());
    assert_eq!(claim.submit_height, 0);

    // And the claim still processes.
    let mut claim = claim;
    assert_eq!(
        harness
            .distributor
            .process_claim(&mut claim, &harness.root(), height, &harness.proof_system),
        ClaimStatus::Valid
    );
}

#[test]
fn test_funds_conservation() {
    let harness = Harness::new(4);
    harness.finalize(1);
    let height = harness.in_window_height(1);

    for i in 0..4 {
        let mut claim = harness.claim_for(i, 1);
        harness
            .distributor
            .process_claim(&mut claim, &harness.root(), height, &harness.proof_system);

        let pool = harness.distributor.get_pool(1).unwrap();
        assert_eq!(
            pool.amount_claimed,
            pool.claim_count as i64 * pool.amount_per_person
        );
        assert!(pool.amount_claimed <= pool.total_pool);
    }
}

#[test]
fn test_conflicting_refinalization_rejected() {
    let harness = Harness::new(4);
    harness.finalize(1);

    // Identical arguments: no-op.
    assert_eq!(harness.distributor.finalize_epoch(1, 4), Ok(()));

    // Different count: refused, allotment unchanged.
    let before = harness.distributor.get_amount_per_person(1);
    assert_eq!(
        harness.distributor.finalize_epoch(1, 5),
        Err(UbiError::FinalizeConflict {
            epoch: 1,
            existing: 4,
            requested: 5,
        })
    );
    assert_eq!(harness.distributor.get_amount_per_person(1), before);
}

#[test]
fn test_finalize_absent_pool_is_noop() {
    let harness = Harness::new(4);
    assert_eq!(harness.distributor.finalize_epoch(42, 4), Ok(()));
    assert!(harness.distributor.get_pool(42).is_none());
}

#[test]
fn test_can_claim_lifecycle() {
    let harness = Harness::new(4);
    let generator = UBIClaimGenerator::new();

    // Not finalized yet.
    assert!(!generator.can_claim(1, &harness.identities[0], &harness.distributor));

    harness.finalize(1);
    assert!(generator.can_claim(1, &harness.identities[0], &harness.distributor));

    // Claiming consumes the nullifier.
    let mut claim = harness.claim_for(0, 1);
    harness.distributor.process_claim(
        &mut claim,
        &harness.root(),
        harness.in_window_height(1),
        &harness.proof_system,
    );
    assert!(!generator.can_claim(1, &harness.identities[0], &harness.distributor));
    assert!(generator.can_claim(1, &harness.identities[1], &harness.distributor));
}

#[test]
fn test_distributor_snapshot_round_trip() {
    let harness = Harness::new(4);
    harness.finalize(1);
    let height = harness.in_window_height(1);

    for i in 0..3 {
        let mut claim = harness.claim_for(i, 1);
        harness
            .distributor
            .process_claim(&mut claim, &harness.root(), height, &harness.proof_system);
    }
    // A second, unfinalized epoch with funds.
    harness.distributor.add_block_reward(25, 7_777);

    let bytes = harness.distributor.serialize();
    let restored = UBIDistributor::deserialize(&bytes, test_params()).unwrap();

    assert_eq!(restored.serialize(), bytes);
    assert_eq!(restored.current_epoch(), harness.distributor.current_epoch());
    assert_eq!(restored.total_claims(), 3);
    assert_eq!(
        restored.total_distributed(),
        harness.distributor.total_distributed()
    );

    // The restored nullifier set still blocks double claims.
    let mut replay = harness.claim_for(0, 1);
    assert_eq!(
        restored.process_claim(&mut replay, &harness.root(), height, &harness.proof_system),
        ClaimStatus::DoubleClaim
    );
}

#[test]
fn test_snapshot_rejects_malformed_input() {
    let harness = Harness::new(2);
    let bytes = harness.distributor.serialize();

    // Truncation.
    assert!(UBIDistributor::deserialize(&bytes[..bytes.len() - 1], test_params()).is_err());

    // Bad version byte.
    let mut bad_version = bytes.clone();
    bad_version[0] = 0x02;
    assert_eq!(
        UBIDistributor::deserialize(&bad_version, test_params()).unwrap_err(),
        UbiError::UnsupportedVersion(0x02)
    );

    // Pool count above the sanity cap.
    let mut bad_count = bytes.clone();
    bad_count[9..13].copy_from_slice(&20_000u32.to_le_bytes());
    assert_eq!(
        UBIDistributor::deserialize(&bad_count, test_params()).unwrap_err(),
        UbiError::Malformed("pool count exceeds cap")
    );
}

#[test]
fn test_prune_old_pools() {
    let params = test_params();
    let distributor = UBIDistributor::new(params.clone());

    // Pools for epochs 0..30.
    for epoch in 0..30i32 {
        distributor.add_block_reward(epoch * params.epoch_blocks, 100);
    }

    distributor.prune_old_pools(30);
    // Cutoff: 30 - (grace 1 + 10) = 19.
    assert!(distributor.get_pool(18).is_none());
    assert!(distributor.get_pool(19).is_some());
    assert!(distributor.get_pool(29).is_some());
}

#[test]
fn test_on_block_connected_finalizes_at_boundary() {
    let harness = Harness::new(4);
    let params = test_params();
    let distributor = UBIDistributor::new(params.clone());

    let mut oracle = StaticIdentityOracle::new();
    oracle.set(0, 4, harness.root());
    oracle.set(1, 4, harness.root());

    for height in 0..20 {
        distributor.on_block_connected(height, 1_000, &oracle).unwrap();
    }

    let pool0 = distributor.get_pool(0).unwrap();
    let pool1 = distributor.get_pool(1).unwrap();
    assert!(pool0.is_finalized);
    assert!(pool1.is_finalized);
    assert_eq!(pool0.amount_per_person, 2_500);
    assert_eq!(pool1.eligible_count, 4);
}

#[test]
fn test_missing_membership_proof_yields_invalid_claim() {
    let harness = Harness::new(4);
    harness.finalize(1);

    let claim = UBIClaim::create(
        1,
        &harness.identities[0],
        Hash160::from_bytes([1; 20]),
        &MerkleProof::default(),
        &harness.proof_system,
    );
    assert_eq!(claim.status, ClaimStatus::InvalidProof);
}

#[test]
fn test_racing_claims_one_winner() {
    let harness = Harness::new(4);
    harness.finalize(1);
    let height = harness.in_window_height(1);

    let distributor = Arc::new(harness.distributor);
    let root = harness.tree.root_hash();
    let base_claim = {
        let membership = harness.tree.prove(0).unwrap();
        UBIClaim::create(
            1,
            &harness.identities[0],
            Hash160::from_bytes([0; 20]),
            &membership,
            &harness.proof_system,
        )
    };

    let mut handles = Vec::new();
    for _ in 0..8 {
        let distributor = Arc::clone(&distributor);
        let mut claim = base_claim.clone();
        handles.push(std::thread::spawn(move || {
            let proof_system = TranscriptProofSystem::new();
            distributor.process_claim(&mut claim, &root, height, &proof_system)
        }));
    }

    let outcomes: Vec<ClaimStatus> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let valid = outcomes.iter().filter(|&&s| s == ClaimStatus::Valid).count();
    let doubled = outcomes
        .iter()
        .filter(|&&s| s == ClaimStatus::DoubleClaim)
        .count();

    assert_eq!(valid, 1, "exactly one racer wins: {outcomes:?}");
    assert_eq!(doubled, 7);
}
