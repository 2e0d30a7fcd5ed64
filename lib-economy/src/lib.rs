//! SHURIUM Economics Package
//!
//! The UBI distribution engine: epoch pools with nullifier tracking, the
//! distributor state machine that admits or rejects claims, and the
//! claimant-side generator and transaction builder.

pub mod ubi;

pub use ubi::{
    epoch_end_height, height_to_epoch, ClaimStatus, EpochId, EpochStats, EpochUBIPool, UBIClaim,
    UBIClaimGenerator, UBIDistributor, UBITransactionBuilder, UbiError,
};
