//! SHURIUM Identity Package
//!
//! Everything the consensus core needs from the identity layer: secret
//! material and its public derivations (commitment, nullifier), the
//! identity Merkle tree with membership proofs, the ZK proof envelope,
//! and the prover/verifier traits the UBI claim pipeline is written
//! against.

pub mod merkle;
pub mod nullifier;
pub mod oracle;
pub mod proof;
pub mod prover;
pub mod secrets;

pub use merkle::{IdentityTree, MerkleProof, IDENTITY_TREE_DEPTH};
pub use nullifier::Nullifier;
pub use oracle::{IdentityOracle, StaticIdentityOracle};
pub use proof::{IdentityError, ProofType, ZKProof};
pub use prover::{ProofVerifier, TranscriptProofSystem, UbiProver, UBI_CLAIM_CIRCUIT};
pub use secrets::{IdentityCommitment, IdentitySecrets, DOMAIN_UBI};
