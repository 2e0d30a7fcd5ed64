//! Identity secrets and the values derived from them.
//!
//! The three secrets never leave the claimant's process. Everything the
//! network sees is derived: the commitment (stored in the identity tree)
//! and per-epoch nullifiers. Both derivations are Poseidon hashes so they
//! can be re-proven inside the UBI claim circuit.

use lib_crypto::{poseidon_hash, sha256_concat, Fp, Hash256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::nullifier::Nullifier;

/// Domain separation tag for UBI nullifier derivation ("SHRUBI" packed).
pub const DOMAIN_UBI: u64 = 0x5348_5255_4249;

/// Public commitment to an identity: `Poseidon(secretKey, nullifierKey,
/// trapdoor)`. This is the leaf value stored in the identity Merkle tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityCommitment(Fp);

impl IdentityCommitment {
    pub fn to_field_element(&self) -> Fp {
        self.0
    }

    pub fn to_hash(&self) -> Hash256 {
        Hash256::from_bytes(self.0.to_bytes_le())
    }
}

/// The claimant's three field-element secrets.
///
/// Stored as canonical little-endian field bytes so the buffers can be
/// zeroized on drop. Accessors re-parse into [`Fp`]; the constructor
/// guarantees the stored bytes are reduced, so parsing cannot fail.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct IdentitySecrets {
    secret_key: [u8; 32],
    nullifier_key: [u8; 32],
    trapdoor: [u8; 32],
}

impl IdentitySecrets {
    pub fn new(secret_key: Fp, nullifier_key: Fp, trapdoor: Fp) -> Self {
        IdentitySecrets {
            secret_key: secret_key.to_bytes_le(),
            nullifier_key: nullifier_key.to_bytes_le(),
            trapdoor: trapdoor.to_bytes_le(),
        }
    }

    /// Derives the three secrets from seed material (wallet entropy) via
    /// domain-tagged SHA-256, reduced into the field.
    pub fn from_seed(seed: &[u8]) -> Self {
        let derive = |tag: &[u8]| {
            let digest = sha256_concat(&[b"shurium.identity.v1", tag, seed]);
            Fp::from_bytes_le_reduced(digest.as_bytes())
        };
        IdentitySecrets::new(derive(b"sk"), derive(b"nk"), derive(b"td"))
    }

    pub fn secret_key(&self) -> Fp {
        parse_reduced(&self.secret_key)
    }

    pub fn nullifier_key(&self) -> Fp {
        parse_reduced(&self.nullifier_key)
    }

    pub fn trapdoor(&self) -> Fp {
        parse_reduced(&self.trapdoor)
    }

    /// The public identity commitment.
    pub fn commitment(&self) -> IdentityCommitment {
        IdentityCommitment(poseidon_hash(&[
            self.secret_key(),
            self.nullifier_key(),
            self.trapdoor(),
        ]))
    }

    /// Derives the nullifier this identity reveals when claiming UBI for
    /// `epoch`: `Poseidon(nullifierKey, epoch, DOMAIN_UBI)`.
    pub fn derive_nullifier(&self, epoch: u64) -> Nullifier {
        let element = poseidon_hash(&[
            self.nullifier_key(),
            Fp::from_u64(epoch),
            Fp::from_u64(DOMAIN_UBI),
        ]);
        Nullifier::new(Hash256::from_bytes(element.to_bytes_le()), epoch)
    }

    /// Field-element form of the nullifier, as it appears among the claim
    /// proof's public inputs.
    pub fn nullifier_element(&self, epoch: u64) -> Fp {
        poseidon_hash(&[
            self.nullifier_key(),
            Fp::from_u64(epoch),
            Fp::from_u64(DOMAIN_UBI),
        ])
    }
}

fn parse_reduced(bytes: &[u8; 32]) -> Fp {
    Fp::from_bytes_le(bytes).expect("identity secrets are stored as reduced field elements")
}

impl std::fmt::Debug for IdentitySecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print secret material.
        write!(f, "IdentitySecrets(..)")
    }
}
