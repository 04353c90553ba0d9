//! Engine Module
//!
//! The six interchangeable key-value storage engines.
//!
//! ## Engines
//! - `ArrayStore`: linked blocks of fixed-capacity slots, linear scan
//! - `ChainedHash`: fixed bucket array with head-inserted collision chains
//! - `DynamicHash`: linear probing, doubles above 1/2 load, halves below 1/4
//! - `RbTree`: red-black tree over an index arena with a sentinel at index 0
//! - `BTree`: order-m B-tree with split-before-insert, borrow/merge-before-delete
//! - `SkipList`: randomized multi-level list with per-level forward links
//!
//! ## Contract
//! Every engine owns independent copies of its keys and values. Duplicate
//! inserts are rejected (never overwrite), lookups hand out borrowed views.
//! No engine locks internally: callers hold the only `&mut`.

mod array;
mod btree;
mod chained_hash;
mod dynamic_hash;
mod rbtree;
mod skiplist;

pub use array::ArrayStore;
pub use btree::{BTree, BTreeIter};
pub use chained_hash::ChainedHash;
pub use dynamic_hash::DynamicHash;
pub use rbtree::{RbIter, RbTree};
pub use skiplist::SkipList;

use crate::error::{HexError, Result};

/// Operations shared by all storage engines
pub trait KvEngine {
    /// Insert a new key. Fails with `DuplicateKey` if the key is present.
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Borrow the value stored under `key`
    fn get(&self, key: &[u8]) -> Option<&[u8]>;

    /// Remove a key. Fails with `KeyNotFound` if the key is absent.
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Number of live keys
    fn count(&self) -> usize;

    /// Whether `key` is present
    fn exist(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Drop every entry and return to the freshly constructed state
    fn clear(&mut self);

    /// Short engine name used in logs
    fn name(&self) -> &'static str;
}

/// Reject empty keys and values before any engine state is touched
pub(crate) fn check_entry(key: &[u8], value: &[u8]) -> Result<()> {
    check_key(key)?;
    if value.is_empty() {
        return Err(HexError::InvalidArgument("empty value".into()));
    }
    Ok(())
}

pub(crate) fn check_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(HexError::InvalidArgument("empty key".into()));
    }
    Ok(())
}
