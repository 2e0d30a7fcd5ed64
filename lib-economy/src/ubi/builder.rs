//! Claim generation and transaction output construction.

use lib_consensus::block::{opcodes, TxOut};
use lib_consensus::params::Amount;
use lib_crypto::Hash160;
use lib_identity::{IdentitySecrets, MerkleProof, UbiProver};

use super::claim::{EpochId, UBIClaim};
use super::distributor::{epoch_end_height, UBIDistributor};

/// P2PKH script length: OP_DUP OP_HASH160 <20> hash OP_EQUALVERIFY OP_CHECKSIG.
const P2PKH_SCRIPT_LEN: usize = 25;

/// Builds and checks the outputs paying out a valid claim.
#[derive(Debug, Default, Clone, Copy)]
pub struct UBITransactionBuilder;

impl UBITransactionBuilder {
    pub fn new() -> Self {
        UBITransactionBuilder
    }

    /// One standard pay-to-public-key-hash output for the claim
    /// recipient. Witness-program recipients are the transaction layer's
    /// concern; the consensus core always emits P2PKH.
    pub fn build_claim_outputs(&self, claim: &UBIClaim, amount: Amount) -> Vec<TxOut> {
        let mut script = Vec::with_capacity(P2PKH_SCRIPT_LEN);
        script.push(opcodes::OP_DUP);
        script.push(opcodes::OP_HASH160);
        script.push(Hash160::SIZE as u8);
        script.extend_from_slice(claim.recipient.as_bytes());
        script.push(opcodes::OP_EQUALVERIFY);
        script.push(opcodes::OP_CHECKSIG);

        vec![TxOut {
            value: amount,
            script_pubkey: script,
        }]
    }

    /// True when at least one output is a P2PKH program paying the
    /// claim's recipient a positive amount.
    pub fn verify_claim_outputs(&self, claim: &UBIClaim, outputs: &[TxOut]) -> bool {
        outputs.iter().any(|output| {
            let script = &output.script_pubkey;
            script.len() >= P2PKH_SCRIPT_LEN
                && script[0] == opcodes::OP_DUP
                && script[1] == opcodes::OP_HASH160
                && script[2] == Hash160::SIZE as u8
                && Hash160::from_slice(&script[3..23]) == Some(claim.recipient)
                && output.value > 0
        })
    }
}

/// Claimant-side helper: builds claims and pre-checks claimability.
#[derive(Debug, Default, Clone, Copy)]
pub struct UBIClaimGenerator;

impl UBIClaimGenerator {
    pub fn new() -> Self {
        UBIClaimGenerator
    }

    pub fn generate_claim(
        &self,
        epoch: EpochId,
        secrets: &IdentitySecrets,
        recipient: Hash160,
        membership_proof: &MerkleProof,
        prover: &dyn UbiProver,
    ) -> UBIClaim {
        UBIClaim::create(epoch, secrets, recipient, membership_proof, prover)
    }

    /// Whether this identity can still claim for `epoch`: the pool is
    /// finalized, inside its window just past the epoch end, and the
    /// identity's nullifier is unused.
    pub fn can_claim(
        &self,
        epoch: EpochId,
        secrets: &IdentitySecrets,
        distributor: &UBIDistributor,
    ) -> bool {
        let check_height = epoch_end_height(epoch, distributor.params()) + 1;

        if !distributor.is_epoch_claimable(epoch, check_height) {
            return false;
        }

        let nullifier = secrets.derive_nullifier(epoch);
        match distributor.get_pool(epoch) {
            Some(pool) => !pool.is_nullifier_used(&nullifier),
            None => false,
        }
    }
}
