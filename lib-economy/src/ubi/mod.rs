//! Universal Basic Income distribution.
//!
//! Rewards flow in per block, accumulate in per-epoch pools, and are
//! paid out against zero-knowledge identity claims gated by nullifiers.

pub mod builder;
pub mod claim;
pub mod distributor;
pub mod pool;

pub use builder::{UBIClaimGenerator, UBITransactionBuilder};
pub use claim::{ClaimStatus, EpochId, UBIClaim, UbiError};
pub use distributor::{epoch_end_height, height_to_epoch, EpochStats, UBIDistributor};
pub use pool::EpochUBIPool;
