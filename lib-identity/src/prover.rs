//! Proof generation and verification interfaces.
//!
//! The consensus core treats the ZK circuit as an external collaborator:
//! it only depends on the two traits here. They are injected into the UBI
//! distributor and the claim generator rather than reached through
//! process-wide singletons, so tests can substitute implementations and a
//! multi-chain process stays possible.

use lib_crypto::{sha256_concat, Fp};

use crate::merkle::MerkleProof;
use crate::proof::{IdentityError, ProofType, ZKProof};
use crate::secrets::IdentitySecrets;

/// Circuit name for UBI claim proofs, as passed to [`ProofVerifier::verify`].
pub const UBI_CLAIM_CIRCUIT: &str = "ubi_claim";

/// Generates UBI claim proofs from identity secrets and a membership proof.
pub trait UbiProver: Send + Sync {
    /// Produces a proof that the prover controls an identity whose
    /// commitment is included under `identity_root`, with public inputs
    /// `[identity_root, nullifierHash, epoch]`.
    fn generate_ubi_claim_proof(
        &self,
        secrets: &IdentitySecrets,
        identity_root: Fp,
        membership_proof: &MerkleProof,
        epoch: u64,
    ) -> Result<ZKProof, IdentityError>;
}

/// Verifies proofs against a named circuit.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, proof: &ZKProof, circuit: &str) -> bool;
}

/// Transcript-bound proof system.
///
/// This is the shipped stand-in for the external circuit backend: the
/// proof payload is a SHA-256 transcript over the circuit tag and public
/// inputs, followed by a witness digest. Verification recomputes the
/// transcript half. It gives deterministic, tamper-evident behavior for
/// tests and regtest but is NOT zero-knowledge and NOT sound against a
/// prover that skips the witness checks. Production networks must swap
/// in a real backend behind the same traits.
#[derive(Debug, Default, Clone, Copy)]
pub struct TranscriptProofSystem;

impl TranscriptProofSystem {
    pub fn new() -> Self {
        TranscriptProofSystem
    }

    fn transcript_tag(circuit: &str, public_inputs: &[Fp]) -> [u8; 32] {
        let mut segments: Vec<Vec<u8>> = Vec::with_capacity(public_inputs.len() + 2);
        segments.push(b"shurium.proof.v1".to_vec());
        segments.push(circuit.as_bytes().to_vec());
        for input in public_inputs {
            segments.push(input.to_bytes_le().to_vec());
        }
        let refs: Vec<&[u8]> = segments.iter().map(|s| s.as_slice()).collect();
        *sha256_concat(&refs).as_bytes()
    }
}

impl UbiProver for TranscriptProofSystem {
    fn generate_ubi_claim_proof(
        &self,
        secrets: &IdentitySecrets,
        identity_root: Fp,
        membership_proof: &MerkleProof,
        epoch: u64,
    ) -> Result<ZKProof, IdentityError> {
        // The witness checks a real circuit would enforce: the membership
        // path must actually lead from this identity's commitment to the
        // claimed root.
        let commitment = secrets.commitment().to_field_element();
        let computed_root = membership_proof.compute_root(commitment);
        if computed_root != identity_root {
            return Err(IdentityError::ProverFailure(
                "membership proof does not reach the identity root".to_string(),
            ));
        }

        let nullifier = secrets.nullifier_element(epoch);
        let public_inputs = vec![identity_root, nullifier, Fp::from_u64(epoch)];

        let tag = Self::transcript_tag(UBI_CLAIM_CIRCUIT, &public_inputs);
        let witness_digest = sha256_concat(&[
            b"shurium.witness.v1",
            &commitment.to_bytes_le(),
            &identity_root.to_bytes_le(),
            &epoch.to_le_bytes(),
        ]);

        let mut payload = Vec::with_capacity(64);
        payload.extend_from_slice(&tag);
        payload.extend_from_slice(witness_digest.as_bytes());

        Ok(ZKProof::new(ProofType::UBIClaim, public_inputs, payload))
    }
}

impl ProofVerifier for TranscriptProofSystem {
    fn verify(&self, proof: &ZKProof, circuit: &str) -> bool {
        if !proof.is_valid() {
            return false;
        }
        if proof.payload().len() != 64 {
            return false;
        }
        let expected = Self::transcript_tag(circuit, proof.public_inputs());
        proof.payload()[..32] == expected
    }
}
