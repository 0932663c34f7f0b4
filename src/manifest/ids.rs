//! File identifier allocation.

use anyhow::{Context, Result};

/// Hands out file identifiers for one submission, in call order.
pub trait IdAllocator {
    fn next_id(&mut self) -> Result<String>;
}

/// Monotonic `fid<n>-<rep>` identifiers, starting at `fid1-<rep>`.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u64,
    representation: u32,
}

impl SequentialIds {
    pub fn new(representation: u32) -> Self {
        Self {
            next: 1,
            representation,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new(1)
    }
}

impl IdAllocator for SequentialIds {
    fn next_id(&mut self) -> Result<String> {
        let current = self.next;
        self.next = current
            .checked_add(1)
            .context("file identifier counter overflow")?;
        Ok(format!("fid{}-{}", current, self.representation))
    }
}
