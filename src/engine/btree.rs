//! B-tree engine
//!
//! An order-`m` B-tree (at most `m` children and `m - 1` keys per node) that
//! restructures on the way down instead of on the way back up:
//!
//! - **Insert** splits any full node before stepping into it, so the target
//!   leaf always has room when it is reached. A full root is split first,
//!   which is the only way the tree grows in height.
//! - **Delete** tops up any child holding the minimum `m/2 - 1` keys before
//!   stepping into it, borrowing one key from a sibling with a surplus or
//!   merging with a sibling otherwise. A key found in an internal node is
//!   overwritten by its predecessor or successor, and that entry is then
//!   deleted from the subtree below.
//!
//! Both passes only preserve the occupancy bounds when `m` is even, so odd
//! orders are rejected at construction.

use std::cmp::Ordering;

use super::{check_entry, check_key, KvEngine};
use crate::error::{HexError, Result};

#[derive(Debug, Default)]
struct Node {
    /// Strictly increasing keys
    keys: Vec<Vec<u8>>,

    /// `values[i]` belongs to `keys[i]`
    values: Vec<Vec<u8>>,

    /// Empty for leaves, `keys.len() + 1` entries otherwise
    children: Vec<Box<Node>>,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn search(&self, key: &[u8]) -> std::result::Result<usize, usize> {
        self.keys.binary_search_by(|probe| probe.as_slice().cmp(key))
    }

    /// Split the full child at `idx`, lifting its median into this node
    fn split_child(&mut self, idx: usize, order: usize) {
        let mid = order / 2 - 1;
        let child = &mut self.children[idx];

        let right = Node {
            keys: child.keys.split_off(mid + 1),
            values: child.values.split_off(mid + 1),
            children: if child.is_leaf() {
                Vec::new()
            } else {
                child.children.split_off(mid + 1)
            },
        };
        let median_key = child.keys.remove(mid);
        let median_value = child.values.remove(mid);

        self.keys.insert(idx, median_key);
        self.values.insert(idx, median_value);
        self.children.insert(idx + 1, Box::new(right));
    }

    /// Rotate one entry from `children[sep + 1]` through `keys[sep]` into `children[sep]`
    fn borrow_from_right(&mut self, sep: usize) {
        let (head, tail) = self.children.split_at_mut(sep + 1);
        let (left, right) = (&mut head[sep], &mut tail[0]);

        let up_key = right.keys.remove(0);
        let up_value = right.values.remove(0);
        left.keys.push(std::mem::replace(&mut self.keys[sep], up_key));
        left.values.push(std::mem::replace(&mut self.values[sep], up_value));
        if !right.is_leaf() {
            left.children.push(right.children.remove(0));
        }
    }

    /// Rotate one entry from `children[sep]` through `keys[sep]` into `children[sep + 1]`
    fn borrow_from_left(&mut self, sep: usize) {
        let (head, tail) = self.children.split_at_mut(sep + 1);
        let (left, right) = (&mut head[sep], &mut tail[0]);

        let last = left.len() - 1;
        let up_key = left.keys.remove(last);
        let up_value = left.values.remove(last);
        right.keys.insert(0, std::mem::replace(&mut self.keys[sep], up_key));
        right.values.insert(0, std::mem::replace(&mut self.values[sep], up_value));
        if !left.is_leaf() {
            let moved = left.children.remove(last + 1);
            right.children.insert(0, moved);
        }
    }

    /// Fold `keys[sep]` and `children[sep + 1]` into `children[sep]`
    fn merge_children(&mut self, sep: usize) {
        let right = *self.children.remove(sep + 1);
        let sep_key = self.keys.remove(sep);
        let sep_value = self.values.remove(sep);

        let left = &mut self.children[sep];
        left.keys.push(sep_key);
        left.values.push(sep_value);
        left.keys.extend(right.keys);
        left.values.extend(right.values);
        left.children.extend(right.children);
    }

    fn max_entry(&self) -> (&[u8], &[u8]) {
        let mut cur = self;
        while !cur.is_leaf() {
            cur = &cur.children[cur.len()];
        }
        let last = cur.len() - 1;
        (&cur.keys[last], &cur.values[last])
    }

    fn min_entry(&self) -> (&[u8], &[u8]) {
        let mut cur = self;
        while !cur.is_leaf() {
            cur = &cur.children[0];
        }
        (&cur.keys[0], &cur.values[0])
    }
}

/// Order-m B-tree
#[derive(Debug)]
pub struct BTree {
    root: Box<Node>,

    /// Maximum children per node
    order: usize,

    count: usize,
}

impl BTree {
    /// Create an empty tree of the given order (even, at least 4)
    pub fn new(order: usize) -> Result<Self> {
        if order < 4 || order % 2 != 0 {
            return Err(HexError::InvalidArgument(format!(
                "btree order must be an even number >= 4, got {order}"
            )));
        }
        Ok(Self {
            root: Box::default(),
            order,
            count: 0,
        })
    }

    /// Order `m` of the tree
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of levels (0 for an empty tree)
    pub fn height(&self) -> usize {
        if self.count == 0 {
            return 0;
        }
        let mut depth = 1;
        let mut cur = &self.root;
        while !cur.is_leaf() {
            cur = &cur.children[0];
            depth += 1;
        }
        depth
    }

    /// Number of keys held by the root node
    pub fn root_len(&self) -> usize {
        self.root.len()
    }

    /// In-order iterator over all entries
    pub fn iter(&self) -> BTreeIter<'_> {
        let mut iter = BTreeIter { stack: Vec::new() };
        iter.descend_left(&self.root);
        iter
    }

    fn max_keys(&self) -> usize {
        self.order - 1
    }

    fn min_keys(&self) -> usize {
        self.order / 2 - 1
    }

    fn find(&self, key: &[u8]) -> Option<&[u8]> {
        let mut cur = &self.root;
        loop {
            match cur.search(key) {
                Ok(i) => return Some(&cur.values[i]),
                Err(_) if cur.is_leaf() => return None,
                Err(i) => cur = &cur.children[i],
            }
        }
    }
}

impl KvEngine for BTree {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        check_entry(key, value)?;
        if self.find(key).is_some() {
            return Err(HexError::DuplicateKey);
        }

        let (order, max_keys) = (self.order, self.max_keys());

        if self.root.len() == max_keys {
            let old_root = std::mem::take(&mut self.root);
            self.root.children.push(old_root);
            self.root.split_child(0, order);
            tracing::debug!(height = self.height(), "btree root split");
        }

        let mut node: &mut Node = &mut self.root;
        loop {
            let mut idx = match node.search(key) {
                Ok(_) => return Err(HexError::DuplicateKey),
                Err(i) => i,
            };

            if node.is_leaf() {
                node.keys.insert(idx, key.to_vec());
                node.values.insert(idx, value.to_vec());
                break;
            }

            if node.children[idx].len() == max_keys {
                node.split_child(idx, order);
                match key.cmp(node.keys[idx].as_slice()) {
                    Ordering::Less => {}
                    Ordering::Greater => idx += 1,
                    Ordering::Equal => return Err(HexError::DuplicateKey),
                }
            }
            node = &mut node.children[idx];
        }

        self.count += 1;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.find(key)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        check_key(key)?;
        if self.find(key).is_none() {
            return Err(HexError::KeyNotFound);
        }

        let min_keys = self.min_keys();
        let mut target = key.to_vec();
        let mut node: &mut Node = &mut self.root;

        loop {
            let pos = node.search(&target);

            if node.is_leaf() {
                let i = pos.map_err(|_| HexError::KeyNotFound)?;
                node.keys.remove(i);
                node.values.remove(i);
                break;
            }

            // Child to descend into, plus the sibling that may lend or merge
            let (next, sibling) = match pos {
                Ok(i) if node.children[i].len() <= node.children[i + 1].len() => (i, i + 1),
                Ok(i) => (i + 1, i),
                Err(0) => (0, 1),
                Err(i) if i == node.len() => (i, i - 1),
                Err(i) if node.children[i - 1].len() > node.children[i + 1].len() => (i, i - 1),
                Err(i) => (i, i + 1),
            };

            if node.children[next].len() <= min_keys {
                let sep = next.min(sibling);
                if node.children[sibling].len() > min_keys {
                    if sibling > next {
                        node.borrow_from_right(sep);
                    } else {
                        node.borrow_from_left(sep);
                    }
                } else {
                    node.merge_children(sep);
                }
                // Entries moved; look at this node again
                continue;
            }

            if let Ok(i) = pos {
                let (k, v) = if next == i {
                    node.children[i].max_entry()
                } else {
                    node.children[i + 1].min_entry()
                };
                let (k, v) = (k.to_vec(), v.to_vec());
                node.keys[i] = k.clone();
                node.values[i] = v;
                target = k;
            }
            node = &mut node.children[next];
        }

        if self.root.len() == 0 && !self.root.is_leaf() {
            self.root = self.root.children.remove(0);
            tracing::debug!(height = self.height(), "btree root collapsed");
        }

        self.count -= 1;
        Ok(())
    }

    fn count(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.root = Box::default();
        self.count = 0;
    }

    fn name(&self) -> &'static str {
        "btree"
    }
}

/// In-order iterator over a `BTree`
pub struct BTreeIter<'a> {
    /// Path of (node, next key index) pairs
    stack: Vec<(&'a Node, usize)>,
}

impl<'a> BTreeIter<'a> {
    fn descend_left(&mut self, mut node: &'a Node) {
        loop {
            self.stack.push((node, 0));
            if node.is_leaf() {
                break;
            }
            node = &node.children[0];
        }
    }
}

impl<'a> Iterator for BTreeIter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            let node: &'a Node = top.0;
            let i = top.1;
            if i < node.len() {
                top.1 += 1;
                if !node.is_leaf() {
                    self.descend_left(&node.children[i + 1]);
                }
                return Some((node.keys[i].as_slice(), node.values[i].as_slice()));
            }
            self.stack.pop();
        }
    }
}
