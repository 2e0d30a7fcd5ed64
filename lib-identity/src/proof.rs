//! Zero-knowledge proof envelope.
//!
//! The circuit backend is external to this crate; what consensus handles
//! is the envelope: a proof type tag, the ordered public inputs and the
//! opaque proof payload, with a canonical byte encoding for embedding in
//! claim messages.

use lib_crypto::Fp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from identity/proof parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("malformed proof encoding: {0}")]
    MalformedProof(&'static str),

    #[error("unknown proof type tag: {0}")]
    UnknownProofType(u8),

    #[error("proof generation failed: {0}")]
    ProverFailure(String),
}

/// Statement families the proof system supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProofType {
    /// Membership + nullifier correctness for a UBI claim.
    UBIClaim,
    /// Plain ownership of an identity commitment.
    IdentityOwnership,
}

impl ProofType {
    pub fn to_byte(self) -> u8 {
        match self {
            ProofType::UBIClaim => 1,
            ProofType::IdentityOwnership => 2,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self, IdentityError> {
        match byte {
            1 => Ok(ProofType::UBIClaim),
            2 => Ok(ProofType::IdentityOwnership),
            other => Err(IdentityError::UnknownProofType(other)),
        }
    }
}

/// Hard caps on the wire encoding; larger values are malformed input, not
/// big proofs.
const MAX_PUBLIC_INPUTS: u32 = 64;
const MAX_PAYLOAD_BYTES: u32 = 1024 * 1024;

/// Proof envelope. For `UBIClaim` the public inputs are, in order:
/// `[identityRoot, nullifierHash, epoch]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ZKProof {
    proof_type: Option<ProofType>,
    public_inputs: Vec<Fp>,
    payload: Vec<u8>,
}

impl ZKProof {
    pub fn new(proof_type: ProofType, public_inputs: Vec<Fp>, payload: Vec<u8>) -> Self {
        ZKProof {
            proof_type: Some(proof_type),
            public_inputs,
            payload,
        }
    }

    pub fn proof_type(&self) -> Option<ProofType> {
        self.proof_type
    }

    pub fn public_inputs(&self) -> &[Fp] {
        &self.public_inputs
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Structural validity: a typed proof with at least one public input
    /// and a non-empty payload. Says nothing about soundness.
    pub fn is_valid(&self) -> bool {
        self.proof_type.is_some() && !self.public_inputs.is_empty() && !self.payload.is_empty()
    }

    /// Canonical encoding: type byte, input count (u32 LE), inputs as
    /// 32-byte little-endian field elements, payload length (u32 LE),
    /// payload bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 4 + self.public_inputs.len() * 32 + 4 + self.payload.len());
        out.push(self.proof_type.map(ProofType::to_byte).unwrap_or(0));
        out.extend_from_slice(&(self.public_inputs.len() as u32).to_le_bytes());
        for input in &self.public_inputs {
            out.extend_from_slice(&input.to_bytes_le());
        }
        out.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, IdentityError> {
        if data.len() < 9 {
            return Err(IdentityError::MalformedProof("truncated header"));
        }

        let proof_type = match data[0] {
            0 => None,
            byte => Some(ProofType::from_byte(byte)?),
        };

        let input_count = u32::from_le_bytes(data[1..5].try_into().unwrap());
        if input_count > MAX_PUBLIC_INPUTS {
            return Err(IdentityError::MalformedProof("public input count exceeds cap"));
        }

        let mut offset = 5usize;
        let inputs_len = input_count as usize * 32;
        if data.len() < offset + inputs_len + 4 {
            return Err(IdentityError::MalformedProof("truncated public inputs"));
        }

        let mut public_inputs = Vec::with_capacity(input_count as usize);
        for _ in 0..input_count {
            let chunk: [u8; 32] = data[offset..offset + 32].try_into().unwrap();
            let element = Fp::from_bytes_le(&chunk)
                .ok_or(IdentityError::MalformedProof("public input not a field element"))?;
            public_inputs.push(element);
            offset += 32;
        }

        let payload_len = u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap());
        offset += 4;
        if payload_len > MAX_PAYLOAD_BYTES {
            return Err(IdentityError::MalformedProof("payload length exceeds cap"));
        }
        if data.len() < offset + payload_len as usize {
            return Err(IdentityError::MalformedProof("truncated payload"));
        }

        Ok(ZKProof {
            proof_type,
            public_inputs,
            payload: data[offset..offset + payload_len as usize].to_vec(),
        })
    }
}
