//! SHURIUM Consensus Package
//!
//! The chain-consensus core: subsidy schedule and reward splits,
//! compact-target arithmetic, difficulty retargeting over the in-memory
//! chain index, and proof-of-useful-work commitment validation. All
//! functions here are pure in their arguments and freely callable from
//! any thread.

pub mod block;
pub mod chain;
pub mod compact;
pub mod difficulty;
pub mod params;
pub mod pouw;
pub mod subsidy;

pub use block::{Block, BlockHeader, Transaction, TxIn, TxOut};
pub use chain::{BlockIndex, Chain};
pub use compact::{compact_from_target, expand_compact};
pub use difficulty::{calculate_next_work_required, check_proof_of_work, get_next_work_required};
pub use params::{Amount, Height, Network, Params, ParamsError, COIN};
pub use pouw::{
    extract_pouw_commitment, verify_pouw_solution, verify_useful_work, POUW_COMMITMENT_MAGIC,
};
pub use subsidy::{
    expected_epoch_ubi, get_block_subsidy, is_ubi_distribution_block, ubi_reward, RewardSplit,
};
