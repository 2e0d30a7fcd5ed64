//! Per-network consensus parameters.
//!
//! Three profiles exist. Mainnet and testnet differ only in numerics
//! (testnet halves roughly weekly and allows min-difficulty blocks);
//! regtest additionally disables retargeting so unit and integration
//! tests can mine at will.

use lib_crypto::Hash256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compact::expand_compact;

/// Monetary amount in base units. Signed, like the original transaction
/// formats; never negative in normal flow.
pub type Amount = i64;

/// Block height. Signed to match the wire formats that carry heights.
pub type Height = i32;

/// Base units per coin.
pub const COIN: Amount = 100_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("invalid parameter: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Network {
    Main,
    Test,
    Reg,
}

/// Consensus parameters read by the consensus core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    pub network: Network,

    // Subsidy schedule.
    pub initial_block_reward: Amount,
    pub subsidy_halving_interval: Height,

    // Proof of work.
    pub pow_target_spacing: i64,
    pub pow_target_timespan: i64,
    pub pow_limit: Hash256,
    pub pow_no_retargeting: bool,
    pub allow_min_difficulty_blocks: bool,

    // Reward splits, integer percentages of the block subsidy.
    pub ubi_percentage: u32,
    pub work_reward_percentage: u32,
    pub contribution_reward_percentage: u32,
    pub ecosystem_percentage: u32,
    pub stability_reserve_percentage: u32,

    // UBI epochs.
    pub ubi_distribution_interval: Height,
    pub epoch_blocks: Height,
    pub ubi_claim_window: Height,
    pub ubi_grace_epochs: u64,
    pub min_identities_for_ubi: u32,
    pub max_ubi_per_person: Amount,

    // Proof of useful work.
    pub pouw_optional: bool,
    pub pouw_activation_height: Height,
}

impl Params {
    /// Mainnet: ~4-year halving at 10-minute spacing, daily UBI epochs.
    pub fn main() -> Self {
        Params {
            network: Network::Main,
            initial_block_reward: 50 * COIN,
            subsidy_halving_interval: 210_000,
            pow_target_spacing: 600,
            pow_target_timespan: 14 * 24 * 60 * 60,
            pow_limit: expand_compact(0x1d00ffff),
            pow_no_retargeting: false,
            allow_min_difficulty_blocks: false,
            ubi_percentage: 30,
            work_reward_percentage: 40,
            contribution_reward_percentage: 10,
            ecosystem_percentage: 10,
            stability_reserve_percentage: 10,
            ubi_distribution_interval: 144,
            epoch_blocks: 144,
            ubi_claim_window: 1_008,
            ubi_grace_epochs: 2,
            min_identities_for_ubi: 100,
            max_ubi_per_person: 1_000 * COIN,
            pouw_optional: false,
            pouw_activation_height: 1_000,
        }
    }

    /// Testnet: weekly halving, min-difficulty blocks allowed, low
    /// identity threshold, PoUW optional.
    pub fn testnet() -> Self {
        Params {
            network: Network::Test,
            subsidy_halving_interval: 1_008,
            pow_target_timespan: 24 * 60 * 60,
            allow_min_difficulty_blocks: true,
            min_identities_for_ubi: 3,
            pouw_optional: true,
            pouw_activation_height: 0,
            ..Params::main()
        }
    }

    /// Regtest: no retargeting, trivial pow limit, short epochs.
    pub fn regtest() -> Self {
        Params {
            network: Network::Reg,
            subsidy_halving_interval: 150,
            pow_limit: expand_compact(0x207fffff),
            pow_no_retargeting: true,
            allow_min_difficulty_blocks: true,
            ubi_distribution_interval: 10,
            epoch_blocks: 10,
            ubi_claim_window: 20,
            ubi_grace_epochs: 1,
            min_identities_for_ubi: 1,
            pouw_optional: true,
            pouw_activation_height: 0,
            ..Params::testnet()
        }
    }

    /// Blocks between difficulty retargets.
    pub fn difficulty_adjustment_interval(&self) -> i64 {
        self.pow_target_timespan / self.pow_target_spacing
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.pow_target_spacing <= 0 {
            return Err(ParamsError::Invalid("pow target spacing must be positive"));
        }
        if self.pow_target_timespan < self.pow_target_spacing {
            return Err(ParamsError::Invalid(
                "pow target timespan must cover at least one block",
            ));
        }
        if self.subsidy_halving_interval <= 0 {
            return Err(ParamsError::Invalid("halving interval must be positive"));
        }
        if self.epoch_blocks <= 0 {
            return Err(ParamsError::Invalid("epoch length must be positive"));
        }
        if self.ubi_distribution_interval <= 0 {
            return Err(ParamsError::Invalid("distribution interval must be positive"));
        }
        let split_total = self.ubi_percentage
            + self.work_reward_percentage
            + self.contribution_reward_percentage
            + self.ecosystem_percentage
            + self.stability_reserve_percentage;
        if split_total > 100 {
            return Err(ParamsError::Invalid("reward splits exceed 100 percent"));
        }
        if self.pow_limit.is_zero() {
            return Err(ParamsError::Invalid("pow limit must be non-zero"));
        }
        Ok(())
    }
}
