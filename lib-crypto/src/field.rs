//! Arithmetic over the BN254 scalar field and the Poseidon-style sponge.
//!
//! Identity commitments, nullifiers and Merkle path folding all operate on
//! field elements so that the same values can be re-derived inside a ZK
//! circuit. The sponge below is an x^5 MiMC-style permutation; it must
//! stay in lockstep with the off-chain prover tooling.
//!
//! The representation is four 64-bit limbs, least significant limb first,
//! always fully reduced modulo `r`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of sponge rounds applied after each absorbed element.
const SPONGE_ROUNDS: usize = 3;

/// Seed for deriving per-round constants (splitmix64 increment).
const ROUND_CONSTANT_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

// BN254 scalar field modulus r, little-endian limbs:
// 21888242871839275222246405745257275088548364400416034343698204186575808495617
const MODULUS: [u64; 4] = [
    0x43E1_F593_F000_0001,
    0x2833_E848_79B9_7091,
    0xB850_45B6_8181_585D,
    0x3064_4E72_E131_A029,
];

/// Element of the BN254 scalar field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Fp([u64; 4]);

impl Fp {
    pub const ZERO: Fp = Fp([0, 0, 0, 0]);
    pub const ONE: Fp = Fp([1, 0, 0, 0]);

    /// Builds an element from a small integer.
    pub fn from_u64(value: u64) -> Self {
        Fp([value, 0, 0, 0])
    }

    /// Parses 32 little-endian bytes; `None` if the value is not fully
    /// reduced (>= r). Use this for values that originated as field
    /// elements.
    pub fn from_bytes_le(bytes: &[u8; 32]) -> Option<Self> {
        let limbs = limbs_from_le(bytes);
        if gte(&limbs, &MODULUS) {
            return None;
        }
        Some(Fp(limbs))
    }

    /// Parses 32 little-endian bytes, reducing modulo r. Use this when
    /// mapping arbitrary 256-bit hashes (e.g. an identity tree root) into
    /// the field.
    pub fn from_bytes_le_reduced(bytes: &[u8; 32]) -> Self {
        let mut limbs = limbs_from_le(bytes);
        // r > 2^253, so a handful of subtractions always suffices.
        while gte(&limbs, &MODULUS) {
            limbs = sub_limbs(&limbs, &MODULUS).0;
        }
        Fp(limbs)
    }

    pub fn to_bytes_le(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (i, limb) in self.0.iter().enumerate() {
            out[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_le_bytes());
        }
        out
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0, 0, 0, 0]
    }

    pub fn add(&self, other: &Fp) -> Fp {
        let (sum, carry) = add_limbs(&self.0, &other.0);
        if carry || gte(&sum, &MODULUS) {
            Fp(sub_limbs(&sum, &MODULUS).0)
        } else {
            Fp(sum)
        }
    }

    pub fn sub(&self, other: &Fp) -> Fp {
        let (diff, borrow) = sub_limbs(&self.0, &other.0);
        if borrow {
            Fp(add_limbs(&diff, &MODULUS).0)
        } else {
            Fp(diff)
        }
    }

    pub fn double(&self) -> Fp {
        self.add(self)
    }

    /// Modular multiplication by binary double-and-add. Not the fastest
    /// possible reduction, but branch structure and memory use are flat
    /// and it needs no precomputed constants.
    pub fn mul(&self, other: &Fp) -> Fp {
        let mut acc = Fp::ZERO;
        for i in (0..256).rev() {
            acc = acc.double();
            if bit(&other.0, i) {
                acc = acc.add(self);
            }
        }
        acc
    }

    pub fn square(&self) -> Fp {
        self.mul(self)
    }

    /// x^5, the sponge S-box.
    fn pow5(&self) -> Fp {
        let x2 = self.square();
        let x4 = x2.square();
        x4.mul(self)
    }
}

impl fmt::Debug for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fp(0x{})", hex::encode(rev(self.to_bytes_le())))
    }
}

fn rev(mut bytes: [u8; 32]) -> [u8; 32] {
    bytes.reverse();
    bytes
}

fn limbs_from_le(bytes: &[u8; 32]) -> [u64; 4] {
    let mut limbs = [0u64; 4];
    for (i, limb) in limbs.iter_mut().enumerate() {
        *limb = u64::from_le_bytes(bytes[i * 8..(i + 1) * 8].try_into().unwrap());
    }
    limbs
}

fn gte(a: &[u64; 4], b: &[u64; 4]) -> bool {
    for i in (0..4).rev() {
        if a[i] > b[i] {
            return true;
        }
        if a[i] < b[i] {
            return false;
        }
    }
    true
}

fn bit(limbs: &[u64; 4], n: usize) -> bool {
    (limbs[n / 64] >> (n % 64)) & 1 == 1
}

fn add_limbs(a: &[u64; 4], b: &[u64; 4]) -> ([u64; 4], bool) {
    let mut out = [0u64; 4];
    let mut carry = 0u64;
    for i in 0..4 {
        let (s1, c1) = a[i].overflowing_add(b[i]);
        let (s2, c2) = s1.overflowing_add(carry);
        out[i] = s2;
        carry = (c1 as u64) + (c2 as u64);
    }
    (out, carry != 0)
}

fn sub_limbs(a: &[u64; 4], b: &[u64; 4]) -> ([u64; 4], bool) {
    let mut out = [0u64; 4];
    let mut borrow = 0u64;
    for i in 0..4 {
        let (d1, b1) = a[i].overflowing_sub(b[i]);
        let (d2, b2) = d1.overflowing_sub(borrow);
        out[i] = d2;
        borrow = (b1 as u64) + (b2 as u64);
    }
    (out, borrow != 0)
}

/// Round constant for absorption index `i`, round `round`.
fn round_constant(i: usize, round: usize) -> Fp {
    let mixed = ROUND_CONSTANT_SEED
        .wrapping_mul((i as u64).wrapping_mul(SPONGE_ROUNDS as u64) + round as u64 + 1);
    Fp::from_u64(mixed)
}

/// Poseidon-style sponge over the scalar field.
///
/// Absorbs each input into the running state, then applies
/// [`SPONGE_ROUNDS`] rounds of add-constant / x^5. The final state is the
/// digest. The construction is order-sensitive: `poseidon_hash([a, b])`
/// and `poseidon_hash([b, a])` differ, which Merkle path folding depends
/// on.
pub fn poseidon_hash(inputs: &[Fp]) -> Fp {
    let mut state = Fp::ZERO;
    for (i, input) in inputs.iter().enumerate() {
        state = state.add(input);
        for round in 0..SPONGE_ROUNDS {
            state = state.add(&round_constant(i, round)).pow5();
        }
    }
    state
}

/// Two-input convenience wrapper (Merkle node hashing).
pub fn poseidon_hash_pair(left: &Fp, right: &Fp) -> Fp {
    poseidon_hash(&[*left, *right])
}
