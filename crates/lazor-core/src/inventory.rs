use crate::error::{LazorError, Result};
use crate::BlockKind;
use serde::{Deserialize, Serialize};

/// Remaining blocks per kind. Counts never go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub reflect: usize,
    pub opaque: usize,
    pub refract: usize,
}

impl Inventory {
    pub fn new(reflect: usize, opaque: usize, refract: usize) -> Self {
        Self {
            reflect,
            opaque,
            refract,
        }
    }

    pub fn count(&self, kind: BlockKind) -> usize {
        match kind {
            BlockKind::Reflect => self.reflect,
            BlockKind::Opaque => self.opaque,
            BlockKind::Refract => self.refract,
        }
    }

    fn count_mut(&mut self, kind: BlockKind) -> &mut usize {
        match kind {
            BlockKind::Reflect => &mut self.reflect,
            BlockKind::Opaque => &mut self.opaque,
            BlockKind::Refract => &mut self.refract,
        }
    }

    pub fn set(&mut self, kind: BlockKind, count: usize) {
        *self.count_mut(kind) = count;
    }

    /// Whether at least one block of `kind` remains
    pub fn has(&self, kind: BlockKind) -> bool {
        self.count(kind) > 0
    }

    /// Take one block of `kind`. Changes nothing when none remain.
    pub fn take(&mut self, kind: BlockKind) -> Result<()> {
        let count = self.count_mut(kind);
        if *count == 0 {
            return Err(LazorError::InventoryExhausted { kind });
        }
        *count -= 1;
        Ok(())
    }

    /// Return one block of `kind` to the pool
    pub fn restore(&mut self, kind: BlockKind) {
        *self.count_mut(kind) += 1;
    }

    /// Total number of blocks left to place
    pub fn total(&self) -> usize {
        self.reflect + self.opaque + self.refract
    }
}
