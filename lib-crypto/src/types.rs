//! Fixed-size hash types shared across the SHURIUM consensus core.
//!
//! Both types store their bytes in little-endian integer order: byte 0 is
//! the least significant byte and byte 31 (or 19) the most significant.
//! Ordering comparisons are unsigned integer comparisons in that byte
//! order, which is the contract proof-of-work target checks rely on.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 256-bit hash stored as a little-endian integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub const SIZE: usize = 32;

    /// The zero hash (also used as the "null" sentinel for genesis parents).
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }

    /// Builds a hash from a byte slice; returns `None` unless exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Hash256(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Hex encoding in display (big-endian) order, matching how block
    /// hashes and targets are conventionally printed.
    pub fn to_hex(&self) -> String {
        let mut be = self.0;
        be.reverse();
        hex::encode(be)
    }

    /// Parses display-order hex produced by [`Hash256::to_hex`].
    pub fn from_hex(s: &str) -> Option<Self> {
        let raw = hex::decode(s).ok()?;
        let mut arr: [u8; 32] = raw.try_into().ok()?;
        arr.reverse();
        Some(Hash256(arr))
    }
}

impl Ord for Hash256 {
    fn cmp(&self, other: &Self) -> Ordering {
        // Unsigned integer comparison: most significant byte lives at index 31.
        for i in (0..32).rev() {
            match self.0[i].cmp(&other.0[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Hash256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }
}

/// 160-bit hash, used for pay-to-public-key-hash recipients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Hash160(pub [u8; 20]);

impl Hash160 {
    pub const SIZE: usize = 20;

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Hash160(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 20] = bytes.try_into().ok()?;
        Some(Hash160(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash160 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
