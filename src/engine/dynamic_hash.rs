//! Dynamic hash engine
//!
//! Open addressing with linear probing over a contiguous slot array.
//!
//! ## Resizing
//! - Grows to twice the capacity when an insert would push the load above 1/2
//! - Shrinks to half the capacity when a delete leaves the load below 1/4,
//!   never going under the initial capacity
//!
//! Both directions rebuild the table by reinserting every live entry into a
//! fresh slot array, so probe sequences always start from a clean layout.
//!
//! ## Deletion
//! There are no tombstones. After a slot is emptied the rest of its probe
//! cluster is reinserted, so no key is ever stranded behind a hole.

use super::{check_entry, check_key, KvEngine};
use crate::error::{HexError, Result};

/// Grow/shrink multiplier
const GROW_FACTOR: usize = 2;

#[derive(Debug)]
struct Entry {
    key: Vec<u8>,
    value: Vec<u8>,
}

/// Linear-probing hash table with load-driven rehashing
#[derive(Debug)]
pub struct DynamicHash {
    slots: Vec<Option<Entry>>,

    /// Live entries
    count: usize,

    /// Capacity at construction; the table never shrinks below it
    min_capacity: usize,
}

impl DynamicHash {
    /// Create a table with `initial_capacity` slots
    pub fn new(initial_capacity: usize) -> Self {
        let capacity = initial_capacity.max(2);
        Self {
            slots: empty_slots(capacity),
            count: 0,
            min_capacity: capacity,
        }
    }

    /// Current slot count
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Polynomial accumulation `h = h * 37 + byte`, reduced modulo `capacity`
    fn home(key: &[u8], capacity: usize) -> usize {
        let hash = key
            .iter()
            .fold(0u64, |acc, &b| acc.wrapping_mul(37).wrapping_add(b as u64));
        (hash % capacity as u64) as usize
    }

    /// Slot holding `key`, if any
    fn find_slot(&self, key: &[u8]) -> Option<usize> {
        let capacity = self.slots.len();
        let mut idx = Self::home(key, capacity);
        for _ in 0..capacity {
            match &self.slots[idx] {
                None => return None,
                Some(entry) if entry.key == key => return Some(idx),
                Some(_) => idx = (idx + 1) % capacity,
            }
        }
        None
    }

    /// Put an entry known to be absent into the first free slot of its probe run
    fn place(slots: &mut [Option<Entry>], entry: Entry) {
        let capacity = slots.len();
        let mut idx = Self::home(&entry.key, capacity);
        while slots[idx].is_some() {
            idx = (idx + 1) % capacity;
        }
        slots[idx] = Some(entry);
    }

    /// Rebuild into a table of `new_capacity` slots
    fn rehash(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity > self.count, "rehash target cannot hold all entries");
        let old = std::mem::replace(&mut self.slots, empty_slots(new_capacity));
        for entry in old.into_iter().flatten() {
            Self::place(&mut self.slots, entry);
        }
        tracing::debug!(
            capacity = new_capacity,
            count = self.count,
            "dynamic hash rehashed"
        );
    }

    /// Reinsert the probe cluster that follows a freshly emptied slot
    fn close_gap(&mut self, hole: usize) {
        let capacity = self.slots.len();
        let mut idx = (hole + 1) % capacity;
        while let Some(entry) = self.slots[idx].take() {
            Self::place(&mut self.slots, entry);
            idx = (idx + 1) % capacity;
        }
    }
}

impl Default for DynamicHash {
    fn default() -> Self {
        Self::new(512)
    }
}

impl KvEngine for DynamicHash {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        check_entry(key, value)?;
        if self.find_slot(key).is_some() {
            return Err(HexError::DuplicateKey);
        }

        if self.count + 1 > self.slots.len() / 2 {
            let grown = self.slots.len().checked_mul(GROW_FACTOR).ok_or_else(|| {
                HexError::CapacityExhausted(format!(
                    "dynamic hash cannot grow past {} slots",
                    self.slots.len()
                ))
            })?;
            self.rehash(grown);
        }

        Self::place(
            &mut self.slots,
            Entry {
                key: key.to_vec(),
                value: value.to_vec(),
            },
        );
        self.count += 1;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let idx = self.find_slot(key)?;
        self.slots[idx].as_ref().map(|entry| entry.value.as_slice())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        check_key(key)?;
        let idx = self.find_slot(key).ok_or(HexError::KeyNotFound)?;

        self.slots[idx] = None;
        self.count -= 1;
        self.close_gap(idx);

        if self.count < self.slots.len() / 4 && self.slots.len() > self.min_capacity {
            let shrunk = (self.slots.len() / GROW_FACTOR).max(self.min_capacity);
            self.rehash(shrunk);
        }
        Ok(())
    }

    fn count(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.slots = empty_slots(self.min_capacity);
        self.count = 0;
    }

    fn name(&self) -> &'static str {
        "dynamic-hash"
    }
}

fn empty_slots(capacity: usize) -> Vec<Option<Entry>> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || None);
    slots
}
