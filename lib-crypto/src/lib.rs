//! SHURIUM Cryptography Package
//!
//! Hash types and primitives shared by the consensus, economics and
//! marketplace crates: SHA-256 helpers for consensus commitments, and the
//! BN254 scalar field with a Poseidon-style sponge for identity
//! commitments and nullifiers.

pub mod field;
pub mod hashing;
pub mod types;

pub use field::{poseidon_hash, poseidon_hash_pair, Fp};
pub use hashing::{leading_zero_bits, sha256, sha256_concat, sha256d};
pub use types::{Hash160, Hash256};
