//! Array engine
//!
//! A chain of fixed-capacity blocks holding key/value slots. Every operation
//! is a linear scan, so this is the baseline the other engines are measured
//! against.

use super::{check_entry, check_key, KvEngine};
use crate::error::{HexError, Result};

/// A single occupied slot
#[derive(Debug, Clone)]
struct Slot {
    key: Vec<u8>,
    value: Vec<u8>,
}

/// Fixed-capacity block of slots
#[derive(Debug)]
struct Block {
    slots: Vec<Option<Slot>>,

    /// Number of occupied slots
    live: usize,
}

impl Block {
    fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            live: 0,
        }
    }
}

/// Block-chained unordered store
///
/// ## Invariants
/// - At least one block exists at all times (the head, `blocks[0]`)
/// - A non-head block is released as soon as its live count drops to zero
/// - A key occupies at most one slot across all blocks
#[derive(Debug)]
pub struct ArrayStore {
    /// Blocks in chain order, head first
    blocks: Vec<Block>,

    /// Slots per block
    block_size: usize,

    /// Live entries across all blocks
    count: usize,
}

impl ArrayStore {
    /// Create a store whose blocks hold `block_size` slots each
    pub fn new(block_size: usize) -> Self {
        let block_size = block_size.max(1);
        Self {
            blocks: vec![Block::new(block_size)],
            block_size,
            count: 0,
        }
    }

    /// Number of allocated blocks (always >= 1)
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Locate `key` as (block index, slot index)
    fn position(&self, key: &[u8]) -> Option<(usize, usize)> {
        self.blocks.iter().enumerate().find_map(|(b, block)| {
            block
                .slots
                .iter()
                .position(|slot| matches!(slot, Some(s) if s.key == key))
                .map(|s| (b, s))
        })
    }

    /// First free slot, appending a fresh block at the tail when all are full
    fn free_slot(&mut self) -> (usize, usize) {
        for (b, block) in self.blocks.iter().enumerate() {
            if block.live < self.block_size {
                if let Some(s) = block.slots.iter().position(Option::is_none) {
                    return (b, s);
                }
            }
        }

        self.blocks.push(Block::new(self.block_size));
        tracing::debug!(blocks = self.blocks.len(), "array store grew by one block");
        (self.blocks.len() - 1, 0)
    }
}

impl Default for ArrayStore {
    fn default() -> Self {
        Self::new(32)
    }
}

impl KvEngine for ArrayStore {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        check_entry(key, value)?;
        if self.position(key).is_some() {
            return Err(HexError::DuplicateKey);
        }

        let (b, s) = self.free_slot();
        let block = &mut self.blocks[b];
        block.slots[s] = Some(Slot {
            key: key.to_vec(),
            value: value.to_vec(),
        });
        block.live += 1;
        self.count += 1;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let (b, s) = self.position(key)?;
        self.blocks[b].slots[s].as_ref().map(|slot| slot.value.as_slice())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        check_key(key)?;
        let (b, s) = self.position(key).ok_or(HexError::KeyNotFound)?;

        let block = &mut self.blocks[b];
        block.slots[s] = None;
        block.live -= 1;
        self.count -= 1;

        if block.live == 0 && b != 0 {
            let released = self.blocks.remove(b);
            assert_eq!(released.live, 0, "released a block with live entries");
            tracing::debug!(blocks = self.blocks.len(), "array store released an empty block");
        }
        Ok(())
    }

    fn count(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.blocks.clear();
        self.blocks.push(Block::new(self.block_size));
        self.count = 0;
    }

    fn name(&self) -> &'static str {
        "array"
    }
}
