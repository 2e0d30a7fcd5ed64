//! Epoch-scoped nullifiers.
//!
//! A nullifier is revealed when a UBI claim is made. It is deterministic
//! in (nullifier key, epoch), so claiming twice in the same epoch reveals
//! the same nullifier, while nullifiers from different epochs are
//! unlinkable.

use lib_crypto::Hash256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nullifier: a 32-byte hash bound to the epoch it was derived for.
/// Equality covers both fields: the same hash in two epochs is two
/// distinct nullifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Nullifier {
    hash: Hash256,
    epoch: u64,
}

impl Nullifier {
    pub const HASH_SIZE: usize = Hash256::SIZE;

    pub fn new(hash: Hash256, epoch: u64) -> Self {
        Nullifier { hash, epoch }
    }

    pub fn hash(&self) -> &Hash256 {
        &self.hash
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn to_hex(&self) -> String {
        self.hash.to_hex()
    }
}

impl fmt::Display for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", &self.to_hex()[..16], self.epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_covers_epoch() {
        let hash = Hash256::from_bytes([7u8; 32]);
        let a = Nullifier::new(hash, 1);
        let b = Nullifier::new(hash, 2);
        assert_ne!(a, b);
        assert_eq!(a, Nullifier::new(hash, 1));
    }
}
