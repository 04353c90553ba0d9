//! Chained hash engine
//!
//! Fixed-size bucket array; colliding keys form a singly linked chain per
//! bucket. New nodes are pushed at the chain head. The table never resizes.

use super::{check_entry, check_key, KvEngine};
use crate::error::{HexError, Result};

/// Chain node
#[derive(Debug)]
struct Node {
    key: Vec<u8>,
    value: Vec<u8>,
    next: Option<Box<Node>>,
}

/// Separate-chaining hash table with a fixed bucket count
#[derive(Debug)]
pub struct ChainedHash {
    buckets: Vec<Option<Box<Node>>>,
    count: usize,
}

impl ChainedHash {
    /// Create a table with `buckets` chains
    pub fn new(buckets: usize) -> Self {
        let mut table = Vec::with_capacity(buckets.max(1));
        table.resize_with(buckets.max(1), || None);
        Self {
            buckets: table,
            count: 0,
        }
    }

    /// Number of buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Length of the longest chain
    pub fn longest_chain(&self) -> usize {
        (0..self.buckets.len())
            .map(|i| self.chain(i).count())
            .max()
            .unwrap_or(0)
    }

    /// Sum of byte values modulo the bucket count
    fn bucket_of(&self, key: &[u8]) -> usize {
        let sum: usize = key.iter().map(|&b| b as usize).sum();
        sum % self.buckets.len()
    }

    fn chain(&self, bucket: usize) -> impl Iterator<Item = &Node> {
        std::iter::successors(self.buckets[bucket].as_deref(), |node| node.next.as_deref())
    }

    fn find(&self, key: &[u8]) -> Option<&Node> {
        self.chain(self.bucket_of(key)).find(|node| node.key == key)
    }
}

impl Default for ChainedHash {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl KvEngine for ChainedHash {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        check_entry(key, value)?;
        if self.find(key).is_some() {
            return Err(HexError::DuplicateKey);
        }

        let bucket = self.bucket_of(key);
        let head = self.buckets[bucket].take();
        self.buckets[bucket] = Some(Box::new(Node {
            key: key.to_vec(),
            value: value.to_vec(),
            next: head,
        }));
        self.count += 1;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.find(key).map(|node| node.value.as_slice())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        check_key(key)?;
        let bucket = self.bucket_of(key);

        // Walk the links until `link` points at the matching node or the chain end
        let mut link = &mut self.buckets[bucket];
        while link.as_ref().is_some_and(|node| node.key != key) {
            // Just checked to be `Some`
            link = match link {
                Some(node) => &mut node.next,
                None => unreachable!(),
            };
        }

        let removed = link.take().ok_or(HexError::KeyNotFound)?;
        *link = removed.next;
        self.count -= 1;
        Ok(())
    }

    fn count(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        // Unlink iteratively so long chains don't recurse in Drop
        for bucket in self.buckets.iter_mut() {
            let mut next = bucket.take();
            while let Some(mut node) = next {
                next = node.next.take();
            }
        }
        self.count = 0;
    }

    fn name(&self) -> &'static str {
        "chained-hash"
    }
}

impl Drop for ChainedHash {
    fn drop(&mut self) {
        self.clear();
    }
}
