//! UBI claims and their wire format.

use lib_consensus::params::{Amount, Height};
use lib_crypto::{sha256, Fp, Hash160, Hash256};
use lib_identity::{IdentitySecrets, MerkleProof, Nullifier, UbiProver, ZKProof};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Epoch identifier: `epoch = height / epoch_blocks`.
pub type EpochId = u64;

/// Structural errors in UBI parsing and persistence.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UbiError {
    #[error("malformed input: {0}")]
    Malformed(&'static str),

    #[error("unsupported serialization version: {0}")]
    UnsupportedVersion(u8),

    #[error("epoch {epoch} already finalized with identity count {existing}, refusing {requested}")]
    FinalizeConflict {
        epoch: EpochId,
        existing: u32,
        requested: u32,
    },
}

/// Outcome of claim processing. Serialized as a single byte; the order
/// of checks in the distributor decides which status a claim that fails
/// several ways reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    Pending,
    Valid,
    InvalidProof,
    DoubleClaim,
    IdentityNotFound,
    EpochExpired,
    EpochNotComplete,
    PoolEmpty,
}

impl ClaimStatus {
    pub fn to_byte(self) -> u8 {
        match self {
            ClaimStatus::Pending => 0,
            ClaimStatus::Valid => 1,
            ClaimStatus::InvalidProof => 2,
            ClaimStatus::DoubleClaim => 3,
            ClaimStatus::IdentityNotFound => 4,
            ClaimStatus::EpochExpired => 5,
            ClaimStatus::EpochNotComplete => 6,
            ClaimStatus::PoolEmpty => 7,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self, UbiError> {
        Ok(match byte {
            0 => ClaimStatus::Pending,
            1 => ClaimStatus::Valid,
            2 => ClaimStatus::InvalidProof,
            3 => ClaimStatus::DoubleClaim,
            4 => ClaimStatus::IdentityNotFound,
            5 => ClaimStatus::EpochExpired,
            6 => ClaimStatus::EpochNotComplete,
            7 => ClaimStatus::PoolEmpty,
            _ => return Err(UbiError::Malformed("unknown claim status byte")),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::Valid => "Valid",
            ClaimStatus::InvalidProof => "InvalidProof",
            ClaimStatus::DoubleClaim => "DoubleClaim",
            ClaimStatus::IdentityNotFound => "IdentityNotFound",
            ClaimStatus::EpochExpired => "EpochExpired",
            ClaimStatus::EpochNotComplete => "EpochNotComplete",
            ClaimStatus::PoolEmpty => "PoolEmpty",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum serialized size: every fixed field before the proof.
const CLAIM_MIN_SIZE: usize = 4 + 32 + 8 + 20 + 4 + 1 + 8;

/// A UBI claim as submitted to the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UBIClaim {
    pub epoch: EpochId,
    pub nullifier: Nullifier,
    pub recipient: Hash160,
    pub proof: ZKProof,
    pub amount: Amount,
    pub submit_height: Height,
    pub status: ClaimStatus,
}

impl UBIClaim {
    /// Builds a claim from identity secrets and a membership proof.
    ///
    /// The identity root is recomputed locally by folding the membership
    /// path from the claimant's commitment; the prover then produces the
    /// claim proof against that root. An empty membership proof or a
    /// prover failure yields a claim already stamped `InvalidProof`, so
    /// callers can surface the error uniformly.
    pub fn create(
        epoch: EpochId,
        secrets: &IdentitySecrets,
        recipient: Hash160,
        membership_proof: &MerkleProof,
        prover: &dyn UbiProver,
    ) -> UBIClaim {
        let mut claim = UBIClaim {
            epoch,
            nullifier: secrets.derive_nullifier(epoch),
            recipient,
            proof: ZKProof::default(),
            amount: 0,
            submit_height: 0,
            status: ClaimStatus::Pending,
        };

        if membership_proof.is_empty() {
            claim.status = ClaimStatus::InvalidProof;
            return claim;
        }

        let commitment = secrets.commitment().to_field_element();
        let identity_root = membership_proof.compute_root(commitment);

        match prover.generate_ubi_claim_proof(secrets, identity_root, membership_proof, epoch) {
            Ok(proof) => claim.proof = proof,
            Err(_) => claim.status = ClaimStatus::InvalidProof,
        }

        claim
    }

    /// Identity root the claim's proof commits to, if present.
    pub fn claimed_root(&self) -> Option<Fp> {
        self.proof.public_inputs().first().copied()
    }

    /// Canonical wire encoding, all integers little-endian:
    /// epoch (4), nullifier hash (32), nullifier epoch (8),
    /// recipient (20), submit height (4), status (1), amount (8),
    /// proof size (4), proof bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let proof_bytes = self.proof.to_bytes();

        let mut out = Vec::with_capacity(CLAIM_MIN_SIZE + 4 + proof_bytes.len());
        out.extend_from_slice(&(self.epoch as u32).to_le_bytes());
        out.extend_from_slice(self.nullifier.hash().as_bytes());
        out.extend_from_slice(&self.nullifier.epoch().to_le_bytes());
        out.extend_from_slice(self.recipient.as_bytes());
        out.extend_from_slice(&self.submit_height.to_le_bytes());
        out.push(self.status.to_byte());
        out.extend_from_slice(&self.amount.to_le_bytes());
        out.extend_from_slice(&(proof_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&proof_bytes);
        out
    }

    pub fn deserialize(data: &[u8]) -> Result<UBIClaim, UbiError> {
        if data.len() < CLAIM_MIN_SIZE {
            return Err(UbiError::Malformed("claim shorter than minimum size"));
        }

        let mut offset = 0usize;

        let epoch = u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap()) as EpochId;
        offset += 4;

        let nullifier_hash = Hash256::from_slice(&data[offset..offset + 32])
            .ok_or(UbiError::Malformed("nullifier hash"))?;
        offset += 32;

        let nullifier_epoch = u64::from_le_bytes(data[offset..offset + 8].try_into().unwrap());
        offset += 8;

        let recipient = Hash160::from_slice(&data[offset..offset + 20])
            .ok_or(UbiError::Malformed("recipient"))?;
        offset += 20;

        let submit_height = i32::from_le_bytes(data[offset..offset + 4].try_into().unwrap());
        offset += 4;

        let status = ClaimStatus::from_byte(data[offset])?;
        offset += 1;

        let amount = i64::from_le_bytes(data[offset..offset + 8].try_into().unwrap());
        offset += 8;

        if offset + 4 > data.len() {
            return Err(UbiError::Malformed("missing proof size"));
        }
        let proof_size = u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap()) as usize;
        offset += 4;

        if offset + proof_size > data.len() {
            return Err(UbiError::Malformed("declared proof size exceeds input"));
        }

        let proof = ZKProof::from_bytes(&data[offset..offset + proof_size])
            .map_err(|_| UbiError::Malformed("undecodable proof"))?;

        Ok(UBIClaim {
            epoch,
            nullifier: Nullifier::new(nullifier_hash, nullifier_epoch),
            recipient,
            proof,
            amount,
            submit_height,
            status,
        })
    }

    /// SHA-256 of the serialized claim.
    pub fn hash(&self) -> Hash256 {
        sha256(&self.serialize())
    }
}

impl fmt::Display for UBIClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UBIClaim {{ epoch: {}, nullifier: {}…, status: {}, amount: {} }}",
            self.epoch,
            &self.nullifier.to_hex()[..16],
            self.status,
            self.amount
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_identity::{IdentityTree, TranscriptProofSystem};

    fn sample_claim() -> UBIClaim {
        let secrets = IdentitySecrets::from_seed(b"claim tests");
        let mut tree = IdentityTree::new(8);
        let index = tree.insert(secrets.commitment().to_field_element());
        let membership = tree.prove(index).unwrap();
        UBIClaim::create(
            4,
            &secrets,
            Hash160::from_bytes([0x22; 20]),
            &membership,
            &TranscriptProofSystem::new(),
        )
    }

    #[test]
    fn test_create_produces_pending_claim() {
        let claim = sample_claim();
        assert_eq!(claim.status, ClaimStatus::Pending);
        assert_eq!(claim.epoch, 4);
        assert_eq!(claim.nullifier.epoch(), 4);
        assert!(claim.proof.is_valid());
    }

    #[test]
    fn test_create_without_membership_proof() {
        let secrets = IdentitySecrets::from_seed(b"claim tests");
        let claim = UBIClaim::create(
            4,
            &secrets,
            Hash160::from_bytes([0x22; 20]),
            &MerkleProof::default(),
            &TranscriptProofSystem::new(),
        );
        assert_eq!(claim.status, ClaimStatus::InvalidProof);
        assert!(!claim.proof.is_valid());
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut claim = sample_claim();
        claim.amount = 123_456_789;
        claim.submit_height = 777;
        claim.status = ClaimStatus::Valid;

        let decoded = UBIClaim::deserialize(&claim.serialize()).unwrap();
        assert_eq!(claim, decoded);
        assert_eq!(claim.hash(), decoded.hash());
    }

    #[test]
    fn test_deserialize_rejects_short_input() {
        let bytes = sample_claim().serialize();
        assert_eq!(
            UBIClaim::deserialize(&bytes[..76]),
            Err(UbiError::Malformed("claim shorter than minimum size"))
        );
    }

    #[test]
    fn test_deserialize_rejects_oversized_proof_length() {
        let mut bytes = sample_claim().serialize();
        // Inflate the declared proof size beyond the remaining bytes.
        let offset = 77;
        bytes[offset..offset + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(
            UBIClaim::deserialize(&bytes),
            Err(UbiError::Malformed("declared proof size exceeds input"))
        );
    }

    #[test]
    fn test_unknown_status_byte_rejected() {
        let mut bytes = sample_claim().serialize();
        bytes[68] = 0xEE; // status byte offset
        assert_eq!(
            UBIClaim::deserialize(&bytes),
            Err(UbiError::Malformed("unknown claim status byte"))
        );
    }

    #[test]
    fn test_status_byte_round_trip() {
        for status in [
            ClaimStatus::Pending,
            ClaimStatus::Valid,
            ClaimStatus::InvalidProof,
            ClaimStatus::DoubleClaim,
            ClaimStatus::IdentityNotFound,
            ClaimStatus::EpochExpired,
            ClaimStatus::EpochNotComplete,
            ClaimStatus::PoolEmpty,
        ] {
            assert_eq!(ClaimStatus::from_byte(status.to_byte()), Ok(status));
        }
        assert!(ClaimStatus::from_byte(8).is_err());
    }
}
