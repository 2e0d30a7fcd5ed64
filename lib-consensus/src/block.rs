//! Block and transaction structures.
//!
//! Only the parts the consensus core reads are modeled: headers for
//! proof-of-work and chaining, and enough of the transaction shape to
//! locate the coinbase and scan its scripts for the PoUW commitment.

use lib_crypto::{sha256d, Hash256};
use serde::{Deserialize, Serialize};

use crate::params::Amount;

/// Script opcodes the consensus core recognizes.
pub mod opcodes {
    pub const OP_RETURN: u8 = 0x6a;
    pub const OP_DUP: u8 = 0x76;
    pub const OP_HASH160: u8 = 0xa9;
    pub const OP_EQUALVERIFY: u8 = 0x88;
    pub const OP_CHECKSIG: u8 = 0xac;
}

/// Transaction input. The coinbase input has a null previous outpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub prev_hash: Hash256,
    pub prev_index: u32,
    pub script_sig: Vec<u8>,
}

impl TxIn {
    /// A coinbase-style input carrying `script_sig`.
    pub fn coinbase(script_sig: Vec<u8>) -> Self {
        TxIn {
            prev_hash: Hash256::ZERO,
            prev_index: u32::MAX,
            script_sig,
        }
    }

    pub fn is_null_outpoint(&self) -> bool {
        self.prev_hash.is_zero() && self.prev_index == u32::MAX
    }
}

/// Transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: Amount,
    pub script_pubkey: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Transaction {
    pub vin: Vec<TxIn>,
    pub vout: Vec<TxOut>,
}

impl Transaction {
    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].is_null_outpoint()
    }
}

/// Block header. `bits` is the compact difficulty target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_hash: Hash256,
    pub merkle_root: Hash256,
    pub time: i64,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    /// Canonical header bytes: all fields little-endian, in declaration
    /// order. This is the proof-of-work preimage.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(84);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(self.prev_hash.as_bytes());
        out.extend_from_slice(self.merkle_root.as_bytes());
        out.extend_from_slice(&self.time.to_le_bytes());
        out.extend_from_slice(&self.bits.to_le_bytes());
        out.extend_from_slice(&self.nonce.to_le_bytes());
        out
    }

    /// Double-SHA-256 of the serialized header.
    pub fn hash(&self) -> Hash256 {
        sha256d(&self.serialize())
    }
}

/// Full block: header plus transactions, coinbase first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub vtx: Vec<Transaction>,
}

impl Block {
    /// The coinbase, if the block is well-formed enough to have one.
    pub fn coinbase(&self) -> Option<&Transaction> {
        self.vtx.first().filter(|tx| tx.is_coinbase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> BlockHeader {
        BlockHeader {
            version: 1,
            prev_hash: Hash256::from_bytes([1u8; 32]),
            merkle_root: Hash256::from_bytes([2u8; 32]),
            time: 1_700_000_000,
            bits: 0x1d00ffff,
            nonce: 42,
        }
    }

    #[test]
    fn test_header_hash_depends_on_nonce() {
        let a = header();
        let mut b = header();
        b.nonce += 1;
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), header().hash());
    }

    #[test]
    fn test_coinbase_detection() {
        let coinbase = Transaction {
            vin: vec![TxIn::coinbase(vec![0x01, 0x02])],
            vout: vec![],
        };
        assert!(coinbase.is_coinbase());

        let spend = Transaction {
            vin: vec![TxIn {
                prev_hash: Hash256::from_bytes([9u8; 32]),
                prev_index: 0,
                script_sig: vec![],
            }],
            vout: vec![],
        };
        assert!(!spend.is_coinbase());

        let block = Block {
            header: header(),
            vtx: vec![coinbase.clone(), spend.clone()],
        };
        assert_eq!(block.coinbase(), Some(&coinbase));

        let headless = Block {
            header: header(),
            vtx: vec![spend],
        };
        assert!(headless.coinbase().is_none());
    }
}
