//! SHA-256 hashing helpers.
//!
//! SHA-256 is the canonical hash for all SHURIUM consensus commitments:
//! proof-of-work checks, PoUW commitments, claim hashes and solution
//! verification all go through the functions here. Using an alternate
//! hash for any of these produces mismatched commitments between nodes.

use sha2::{Digest, Sha256};

use crate::types::Hash256;

/// Computes SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> Hash256 {
    let digest = Sha256::digest(data);
    Hash256(digest.into())
}

/// Computes SHA-256 over the concatenation of several segments without
/// materializing the joined buffer.
pub fn sha256_concat(segments: &[&[u8]]) -> Hash256 {
    let mut hasher = Sha256::new();
    for segment in segments {
        hasher.update(segment);
    }
    Hash256(hasher.finalize().into())
}

/// Double SHA-256, used where header-style hardening is wanted.
pub fn sha256d(data: &[u8]) -> Hash256 {
    sha256(sha256(data).as_bytes())
}

/// Counts leading zero bits of a hash interpreted most-significant-byte
/// first over its canonical byte stream (index 0 first). PoUW solution
/// difficulty is expressed in these bits.
pub fn leading_zero_bits(hash: &Hash256) -> u32 {
    let mut bits = 0u32;
    for &byte in hash.as_bytes() {
        if byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}
