//! In-memory chain index.
//!
//! The difficulty engine needs to walk block ancestry by height. Indices
//! are owned by the [`Chain`]; callers hold borrowed references whose
//! lifetime is bounded by the chain, which only grows (trimming below
//! finality is a storage concern, not modeled here).

use serde::{Deserialize, Serialize};

use crate::params::Height;

/// One entry of the chain index: the header fields retargeting reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIndex {
    pub height: Height,
    pub time: i64,
    pub bits: u32,
}

impl BlockIndex {
    pub fn block_time(&self) -> i64 {
        self.time
    }
}

/// Append-only main-chain index, heights 0..len.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chain {
    entries: Vec<BlockIndex>,
}

impl Chain {
    pub fn new() -> Self {
        Chain::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The highest index, if any.
    pub fn tip(&self) -> Option<&BlockIndex> {
        self.entries.last()
    }

    /// Index at `height`.
    pub fn at(&self, height: Height) -> Option<&BlockIndex> {
        if height < 0 {
            return None;
        }
        self.entries.get(height as usize)
    }

    /// Appends the next block's index; height is assigned sequentially.
    pub fn push(&mut self, time: i64, bits: u32) -> &BlockIndex {
        let height = self.entries.len() as Height;
        self.entries.push(BlockIndex { height, time, bits });
        self.entries.last().expect("entry just pushed")
    }
}
