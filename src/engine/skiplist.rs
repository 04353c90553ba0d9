//! Skiplist engine
//!
//! A randomized multi-level ordered list. Nodes live in an arena; slot 0 is
//! the header, which carries no entry and has a forward link for every level
//! up to `max_level`. Freed slots are recycled through a free list.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{check_entry, check_key, KvEngine};
use crate::error::{HexError, Result};

const HEADER: usize = 0;

#[derive(Debug, Default)]
struct Node {
    key: Vec<u8>,
    value: Vec<u8>,

    /// `forward[l]` is the next node at level `l`; length is the node's level
    forward: Vec<Option<usize>>,
}

/// Probabilistic ordered list
#[derive(Debug)]
pub struct SkipList {
    nodes: Vec<Node>,
    free: Vec<usize>,

    /// Highest level any live node occupies (at least 1)
    level: usize,
    max_level: usize,
    count: usize,
    rng: StdRng,
}

impl SkipList {
    /// Create an empty list whose nodes can reach at most `max_level` levels
    pub fn new(max_level: usize) -> Self {
        Self::with_rng(max_level, StdRng::from_entropy())
    }

    /// Same as `new`, with a deterministic level sequence
    pub fn with_seed(max_level: usize, seed: u64) -> Self {
        Self::with_rng(max_level, StdRng::seed_from_u64(seed))
    }

    fn with_rng(max_level: usize, rng: StdRng) -> Self {
        let max_level = max_level.max(1);
        Self {
            nodes: vec![Self::header(max_level)],
            free: Vec::new(),
            level: 1,
            max_level,
            count: 0,
            rng,
        }
    }

    fn header(max_level: usize) -> Node {
        Node {
            forward: vec![None; max_level],
            ..Node::default()
        }
    }

    /// Current top level
    pub fn level(&self) -> usize {
        self.level
    }

    /// Configured level cap
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Entries in key order (level 0 walk)
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        std::iter::successors(self.nodes[HEADER].forward[0], move |&idx| {
            self.nodes[idx].forward[0]
        })
        .map(move |idx| {
            let node = &self.nodes[idx];
            (node.key.as_slice(), node.value.as_slice())
        })
    }

    /// Fair coin flips, capped at `max_level`
    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < self.max_level && self.rng.gen_bool(0.5) {
            level += 1;
        }
        level
    }

    /// Last node before `key` at each active level
    fn update_path(&self, key: &[u8]) -> Vec<usize> {
        let mut update = vec![HEADER; self.max_level];
        let mut cur = HEADER;
        for lvl in (0..self.level).rev() {
            while let Some(next) = self.nodes[cur].forward[lvl] {
                if self.nodes[next].key.as_slice() >= key {
                    break;
                }
                cur = next;
            }
            update[lvl] = cur;
        }
        update
    }

    fn find(&self, key: &[u8]) -> Option<usize> {
        let mut cur = HEADER;
        for lvl in (0..self.level).rev() {
            while let Some(next) = self.nodes[cur].forward[lvl] {
                if self.nodes[next].key.as_slice() >= key {
                    break;
                }
                cur = next;
            }
        }
        self.nodes[cur].forward[0].filter(|&next| self.nodes[next].key == key)
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new(6)
    }
}

impl KvEngine for SkipList {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        check_entry(key, value)?;
        let update = self.update_path(key);

        if let Some(next) = self.nodes[update[0]].forward[0] {
            if self.nodes[next].key == key {
                return Err(HexError::DuplicateKey);
            }
        }

        // Levels above the current top already point back to the header
        let level = self.random_level();
        if level > self.level {
            self.level = level;
        }

        let idx = self.alloc(Node {
            key: key.to_vec(),
            value: value.to_vec(),
            forward: vec![None; level],
        });
        for (lvl, &prev) in update.iter().enumerate().take(level) {
            self.nodes[idx].forward[lvl] = self.nodes[prev].forward[lvl];
            self.nodes[prev].forward[lvl] = Some(idx);
        }

        self.count += 1;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.find(key).map(|idx| self.nodes[idx].value.as_slice())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        check_key(key)?;
        let update = self.update_path(key);

        let target = self.nodes[update[0]].forward[0]
            .filter(|&next| self.nodes[next].key == key)
            .ok_or(HexError::KeyNotFound)?;

        for (lvl, &prev) in update.iter().enumerate().take(self.level) {
            if self.nodes[prev].forward[lvl] != Some(target) {
                break;
            }
            self.nodes[prev].forward[lvl] = self.nodes[target].forward[lvl];
        }

        self.nodes[target] = Node::default();
        self.free.push(target);
        self.count -= 1;

        while self.level > 1 && self.nodes[HEADER].forward[self.level - 1].is_none() {
            self.level -= 1;
        }
        Ok(())
    }

    fn count(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Self::header(self.max_level));
        self.free.clear();
        self.level = 1;
        self.count = 0;
    }

    fn name(&self) -> &'static str {
        "skiplist"
    }
}
