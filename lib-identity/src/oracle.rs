//! Identity oracle: the narrow seam between the identity subsystem and
//! epoch finalization.
//!
//! Finalizing a UBI epoch needs an authoritative identity count and the
//! tree root frozen at the epoch boundary. Only the identity manager can
//! supply those, so the consensus pipeline depends on this trait rather
//! than on the manager itself.

use lib_crypto::Hash256;
use std::collections::HashMap;

pub trait IdentityOracle: Send + Sync {
    /// Number of registered identities eligible in `epoch`.
    fn count_at(&self, epoch: u64) -> u32;

    /// Identity tree root frozen for `epoch`.
    fn root_at(&self, epoch: u64) -> Hash256;
}

/// Table-backed oracle for tests and regtest: per-epoch entries with a
/// zero fallback.
#[derive(Debug, Default, Clone)]
pub struct StaticIdentityOracle {
    entries: HashMap<u64, (u32, Hash256)>,
}

impl StaticIdentityOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, epoch: u64, count: u32, root: Hash256) {
        self.entries.insert(epoch, (count, root));
    }
}

impl IdentityOracle for StaticIdentityOracle {
    fn count_at(&self, epoch: u64) -> u32 {
        self.entries.get(&epoch).map(|(count, _)| *count).unwrap_or(0)
    }

    fn root_at(&self, epoch: u64) -> Hash256 {
        self.entries
            .get(&epoch)
            .map(|(_, root)| *root)
            .unwrap_or(Hash256::ZERO)
    }
}
