//! Block subsidy schedule and reward splits.
//!
//! The subsidy halves every `subsidy_halving_interval` blocks and is zero
//! after 64 halvings. Each block's subsidy is divided into five integer
//! percentage splits; truncation means the splits may undershoot the
//! subsidy by a few base units, never overshoot it.

use serde::{Deserialize, Serialize};

use crate::params::{Amount, Height, Params};

/// Total block subsidy at `height`.
pub fn get_block_subsidy(height: Height, params: &Params) -> Amount {
    if height == 0 {
        return params.initial_block_reward;
    }

    let halvings = height / params.subsidy_halving_interval;
    if halvings >= 64 {
        return 0;
    }

    params.initial_block_reward >> halvings
}

/// UBI pool share of a block reward.
pub fn ubi_reward(block_reward: Amount, params: &Params) -> Amount {
    block_reward * params.ubi_percentage as Amount / 100
}

/// Miner useful-work share.
pub fn work_reward(block_reward: Amount, params: &Params) -> Amount {
    block_reward * params.work_reward_percentage as Amount / 100
}

/// Contribution (open-source bounty) share.
pub fn contribution_reward(block_reward: Amount, params: &Params) -> Amount {
    block_reward * params.contribution_reward_percentage as Amount / 100
}

/// Ecosystem fund share.
pub fn ecosystem_reward(block_reward: Amount, params: &Params) -> Amount {
    block_reward * params.ecosystem_percentage as Amount / 100
}

/// Stability reserve share.
pub fn stability_reserve(block_reward: Amount, params: &Params) -> Amount {
    block_reward * params.stability_reserve_percentage as Amount / 100
}

/// All five splits of one block reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSplit {
    pub ubi: Amount,
    pub work: Amount,
    pub contribution: Amount,
    pub ecosystem: Amount,
    pub reserve: Amount,
}

impl RewardSplit {
    pub fn of(block_reward: Amount, params: &Params) -> Self {
        RewardSplit {
            ubi: ubi_reward(block_reward, params),
            work: work_reward(block_reward, params),
            contribution: contribution_reward(block_reward, params),
            ecosystem: ecosystem_reward(block_reward, params),
            reserve: stability_reserve(block_reward, params),
        }
    }

    /// Splits of the subsidy at `height`.
    pub fn at_height(height: Height, params: &Params) -> Self {
        RewardSplit::of(get_block_subsidy(height, params), params)
    }

    pub fn total(&self) -> Amount {
        self.ubi + self.work + self.contribution + self.ecosystem + self.reserve
    }
}

/// True at the heights where accumulated UBI funds are distributed.
pub fn is_ubi_distribution_block(height: Height, params: &Params) -> bool {
    height > 0 && height % params.ubi_distribution_interval == 0
}

/// Expected per-person UBI for one epoch at the subsidy level of
/// `height`, or zero below the identity threshold.
pub fn expected_epoch_ubi(identity_count: u32, height: Height, params: &Params) -> Amount {
    if identity_count < params.min_identities_for_ubi {
        return 0;
    }

    let per_block = ubi_reward(get_block_subsidy(height, params), params);
    let epoch_pool = per_block * params.epoch_blocks as Amount;
    epoch_pool / identity_count as Amount
}

/// Rough annual per-person UBI at the current subsidy level, assuming one
/// epoch per day.
pub fn estimate_annual_ubi(identity_count: u32, height: Height, params: &Params) -> Amount {
    const EPOCHS_PER_YEAR: Amount = 365;
    expected_epoch_ubi(identity_count, height, params) * EPOCHS_PER_YEAR
}
