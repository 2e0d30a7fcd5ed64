//! Difficulty retargeting.
//!
//! Bitcoin-style interval retargeting over the compact representation:
//! every `difficulty_adjustment_interval` blocks the target is rescaled
//! by the observed timespan, clamped to a 4x band. Test networks may
//! additionally allow one-off min-difficulty blocks after a long gap
//! without permanently lowering difficulty.

use tracing::debug;

use crate::chain::{BlockIndex, Chain};
use crate::compact::{compact_from_target, expand_compact, COMPACT_MANTISSA_MASK, COMPACT_SIGN_BIT};
use crate::params::Params;
use lib_crypto::Hash256;

use crate::block::BlockHeader;

/// Compact bits the next block must meet, given the current chain tip.
///
/// `proposed` is the header being built or validated; it is only
/// consulted for the testnet min-difficulty rule (its timestamp decides
/// whether the gap exception applies).
pub fn get_next_work_required(
    chain: &Chain,
    proposed: Option<&BlockHeader>,
    params: &Params,
) -> u32 {
    let last = match chain.tip() {
        Some(index) => index,
        // Genesis or empty chain: start from the pow limit.
        None => return compact_from_target(&params.pow_limit),
    };

    if params.pow_no_retargeting {
        return last.bits;
    }

    let interval = params.difficulty_adjustment_interval();
    let next_height = last.height + 1;
    let min_bits = compact_from_target(&params.pow_limit);

    // Testnet rule: a block arriving more than twice the target spacing
    // after its parent may use the minimum difficulty, for that block
    // only. Subsequent blocks recover the last real difficulty by
    // skipping over consecutive min-difficulty entries.
    if params.allow_min_difficulty_blocks {
        if let Some(block) = proposed {
            if block.time > last.time + params.pow_target_spacing * 2 {
                return min_bits;
            }

            let mut index = last;
            while index.height > 0
                && index.height as i64 % interval != 0
                && index.bits == min_bits
            {
                match chain.at(index.height - 1) {
                    Some(prev) => index = prev,
                    None => break,
                }
            }
            return index.bits;
        }
    }

    // Between retarget points the difficulty carries over unchanged.
    if next_height as i64 % interval != 0 {
        return last.bits;
    }

    // First block of the closing retarget window (or genesis when the
    // chain is shorter than a full window).
    let first_height = (last.height - (interval as i32 - 1)).max(0);
    let first = match chain.at(first_height) {
        Some(index) => index,
        None => return last.bits,
    };

    calculate_next_work_required(last, first.block_time(), params)
}

/// Rescales the tip's target by the observed window timespan.
pub fn calculate_next_work_required(
    last: &BlockIndex,
    first_block_time: i64,
    params: &Params,
) -> u32 {
    if params.pow_no_retargeting {
        return last.bits;
    }

    let target_timespan = params.pow_target_timespan;
    let mut actual_timespan = last.block_time() - first_block_time;

    // Limit adjustment to 4x in either direction.
    if actual_timespan < target_timespan / 4 {
        actual_timespan = target_timespan / 4;
    }
    if actual_timespan > target_timespan * 4 {
        actual_timespan = target_timespan * 4;
    }

    let mut exponent = ((last.bits >> 24) & 0xFF) as i32;
    let mantissa = last.bits & COMPACT_MANTISSA_MASK;

    // 23-bit mantissa times a timespan capped at 4x the two-week window
    // stays far below 2^64; saturate anyway rather than wrap.
    debug_assert!(
        (mantissa as u128) * (actual_timespan as u128) <= u64::MAX as u128,
        "mantissa scaling overflows u64"
    );
    let mut scaled = (mantissa as u64)
        .checked_mul(actual_timespan as u64)
        .unwrap_or(u64::MAX)
        / target_timespan as u64;

    // Renormalize the mantissa into 23 bits.
    while scaled > COMPACT_MANTISSA_MASK as u64 {
        scaled >>= 8;
        exponent += 1;
    }
    while scaled < 0x8000 && exponent > 1 {
        scaled <<= 8;
        exponent -= 1;
    }

    exponent = exponent.clamp(1, 32);

    let mut new_bits = ((exponent as u32) << 24) | (scaled as u32 & COMPACT_MANTISSA_MASK);

    // Keep the sign bit clear.
    if scaled as u32 & COMPACT_SIGN_BIT != 0 {
        new_bits = (((exponent + 1) as u32) << 24) | ((scaled >> 8) as u32 & COMPACT_MANTISSA_MASK);
    }

    // Never drop below minimum difficulty.
    let new_target = expand_compact(new_bits);
    if new_target > params.pow_limit {
        return compact_from_target(&params.pow_limit);
    }

    debug!(
        actual_timespan,
        target_timespan,
        "difficulty retarget {:#010x} -> {:#010x}",
        last.bits,
        new_bits
    );

    new_bits
}

/// Proof-of-work check: `bits` must encode a target no easier than the
/// pow limit, and the block hash must be strictly below it.
pub fn check_proof_of_work(block_hash: &Hash256, bits: u32, params: &Params) -> bool {
    if bits == 0 {
        return false;
    }

    let target = expand_compact(bits);
    if target > params.pow_limit {
        return false;
    }

    *block_hash < target
}
