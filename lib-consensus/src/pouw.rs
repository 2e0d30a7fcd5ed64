//! Proof-of-useful-work commitments and solution checks.
//!
//! Miners bind a useful-work solution to their block by embedding a
//! commitment in the coinbase: the 4-byte magic `"SHRW"` followed by a
//! 32-byte hash, either inline in the coinbase scriptSig or in an
//! OP_RETURN output. Validation here is structural and chain-binding;
//! marketplace lookup of the referenced solution (submitted in time,
//! unclaimed, meets the quality bar) is an integration point layered on
//! top of this check.

use lib_crypto::{leading_zero_bits, sha256_concat, Hash256};

use crate::block::{opcodes, Block, Transaction};
use crate::params::Params;

/// Commitment magic: "SHRW" (SHURIUM useful work).
pub const POUW_COMMITMENT_MAGIC: [u8; 4] = *b"SHRW";

/// Commitment payload size.
pub const POUW_COMMITMENT_HASH_SIZE: usize = 32;

const POUW_COMMITMENT_MIN_SIZE: usize = POUW_COMMITMENT_MAGIC.len() + POUW_COMMITMENT_HASH_SIZE;

/// Minimum number of byte transitions a commitment must contain. Filters
/// out constant-byte padding masquerading as a hash.
const MIN_COMMITMENT_TRANSITIONS: u32 = 8;

/// Scans a coinbase for a PoUW commitment: first the scriptSig, then
/// each output's scriptPubKey after OP_RETURN (optionally with a direct
/// push opcode between OP_RETURN and the magic). First occurrence wins.
pub fn extract_pouw_commitment(coinbase: &Transaction) -> Option<Hash256> {
    let script_sig = &coinbase.vin.first()?.script_sig;

    for i in 0..script_sig.len().saturating_sub(POUW_COMMITMENT_MIN_SIZE - 1) {
        if script_sig[i..].starts_with(&POUW_COMMITMENT_MAGIC) {
            let start = i + POUW_COMMITMENT_MAGIC.len();
            return Hash256::from_slice(&script_sig[start..start + POUW_COMMITMENT_HASH_SIZE]);
        }
    }

    for output in &coinbase.vout {
        let script = &output.script_pubkey;
        for i in 0..script.len().saturating_sub(POUW_COMMITMENT_MIN_SIZE) {
            if script[i] != opcodes::OP_RETURN {
                continue;
            }

            let mut data_start = i + 1;
            // Direct pushes (1..=75) may sit between OP_RETURN and the payload.
            if data_start < script.len() && script[data_start] <= 75 {
                data_start += 1;
            }

            if data_start + POUW_COMMITMENT_MIN_SIZE <= script.len()
                && script[data_start..].starts_with(&POUW_COMMITMENT_MAGIC)
            {
                let start = data_start + POUW_COMMITMENT_MAGIC.len();
                return Hash256::from_slice(&script[start..start + POUW_COMMITMENT_HASH_SIZE]);
            }
        }
    }

    None
}

/// Number of positions where a commitment's byte differs from its
/// predecessor.
fn byte_transitions(commitment: &Hash256) -> u32 {
    let bytes = commitment.as_bytes();
    let mut transitions = 0;
    let mut last = bytes[0];
    for &byte in &bytes[1..] {
        if byte != last {
            transitions += 1;
            last = byte;
        }
    }
    transitions
}

/// Validates a block's useful-work commitment.
///
/// The genesis block is exempt. A missing commitment is acceptable only
/// on networks that mark PoUW optional. A present commitment must be
/// non-zero, carry enough byte transitions to look like a hash, differ
/// from the previous block hash, and be bound to the chain position: the
/// XOR of its first four bytes with the previous block hash must be
/// neither zero nor all ones.
pub fn verify_useful_work(block: &Block, params: &Params) -> bool {
    if block.vtx.is_empty() {
        return false;
    }

    let coinbase = match block.coinbase() {
        Some(tx) => tx,
        None => return false,
    };

    // Genesis is exempt.
    if block.header.prev_hash.is_zero() {
        return true;
    }

    let commitment = match extract_pouw_commitment(coinbase) {
        Some(commitment) => commitment,
        None => return params.pouw_optional,
    };

    if commitment.is_zero() {
        return false;
    }

    if byte_transitions(&commitment) < MIN_COMMITMENT_TRANSITIONS {
        return false;
    }

    // Chain binding: XOR of the leading 4 bytes against the parent hash.
    let prev = block.header.prev_hash.as_bytes();
    let commit = commitment.as_bytes();
    let mut binding: u32 = 0;
    for i in 0..4 {
        binding |= ((commit[i] ^ prev[i]) as u32) << (i * 8);
    }
    if binding == 0 || binding == 0xFFFF_FFFF {
        return false;
    }

    if commitment == block.header.prev_hash {
        return false;
    }

    true
}

/// Standalone check that `solution` solves `problem_hash` at the given
/// difficulty (leading zero bits of `SHA256(problem_hash || solution)`).
/// Zero difficulty is a misconfiguration and always fails.
pub fn verify_pouw_solution(problem_hash: &Hash256, solution: &[u8], difficulty: u32) -> bool {
    if solution.is_empty() || solution.len() < 32 {
        return false;
    }

    if difficulty == 0 {
        return false;
    }

    let solution_hash = sha256_concat(&[problem_hash.as_bytes(), solution]);
    if leading_zero_bits(&solution_hash) < difficulty {
        return false;
    }

    if solution.iter().all(|&b| b == 0) {
        return false;
    }

    true
}
