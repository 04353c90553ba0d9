//! Red-black tree engine
//!
//! Nodes live in an index arena. Slot 0 is the shared black sentinel `NIL`:
//! it stands in for every leaf child and for the root's parent, so the
//! rebalancing code never special-cases a missing link.
//!
//! ## Invariants
//! - The root is black
//! - A red node never has a red child
//! - Every root-to-`NIL` path crosses the same number of black nodes

use std::cmp::Ordering;

use super::{check_entry, check_key, KvEngine};
use crate::error::{HexError, Result};

/// Arena index of the sentinel
const NIL: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug)]
struct Node {
    key: Vec<u8>,
    value: Vec<u8>,
    color: Color,
    left: usize,
    right: usize,
    parent: usize,
}

impl Node {
    fn sentinel() -> Self {
        Self {
            key: Vec::new(),
            value: Vec::new(),
            color: Color::Black,
            left: NIL,
            right: NIL,
            parent: NIL,
        }
    }
}

/// Arena-backed red-black tree
#[derive(Debug)]
pub struct RbTree {
    /// Node arena; `nodes[NIL]` is the sentinel
    nodes: Vec<Node>,

    /// Released arena slots available for reuse
    free: Vec<usize>,

    root: usize,
    count: usize,
}

impl RbTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::sentinel()],
            free: Vec::new(),
            root: NIL,
            count: 0,
        }
    }

    // =========================================================================
    // Ordered queries
    // =========================================================================

    /// Smallest entry
    pub fn min(&self) -> Option<(&[u8], &[u8])> {
        self.entry(self.min_of(self.root))
    }

    /// Largest entry
    pub fn max(&self) -> Option<(&[u8], &[u8])> {
        self.entry(self.max_of(self.root))
    }

    /// Entry immediately after `key` in key order (`key` must be present)
    pub fn successor(&self, key: &[u8]) -> Option<(&[u8], &[u8])> {
        let node = self.search(key);
        if node == NIL {
            return None;
        }
        self.entry(self.next_of(node))
    }

    /// Entry immediately before `key` in key order (`key` must be present)
    pub fn predecessor(&self, key: &[u8]) -> Option<(&[u8], &[u8])> {
        let node = self.search(key);
        if node == NIL {
            return None;
        }
        self.entry(self.prev_of(node))
    }

    /// In-order iterator over all entries
    pub fn iter(&self) -> RbIter<'_> {
        RbIter {
            tree: self,
            next: self.min_of(self.root),
        }
    }

    /// Longest root-to-leaf path, counted in nodes
    pub fn height(&self) -> usize {
        self.height_of(self.root)
    }

    // =========================================================================
    // Arena helpers
    // =========================================================================

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

    fn release(&mut self, idx: usize) {
        debug_assert_ne!(idx, NIL, "released the sentinel");
        let node = &mut self.nodes[idx];
        node.key = Vec::new();
        node.value = Vec::new();
        node.left = NIL;
        node.right = NIL;
        node.parent = NIL;
        self.free.push(idx);
    }

    fn entry(&self, idx: usize) -> Option<(&[u8], &[u8])> {
        if idx == NIL {
            return None;
        }
        let node = &self.nodes[idx];
        Some((node.key.as_slice(), node.value.as_slice()))
    }

    fn color(&self, idx: usize) -> Color {
        self.nodes[idx].color
    }

    fn set_color(&mut self, idx: usize, color: Color) {
        self.nodes[idx].color = color;
    }

    fn is_red(&self, idx: usize) -> bool {
        self.color(idx) == Color::Red
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    fn search(&self, key: &[u8]) -> usize {
        let mut cur = self.root;
        while cur != NIL {
            match key.cmp(self.nodes[cur].key.as_slice()) {
                Ordering::Less => cur = self.nodes[cur].left,
                Ordering::Greater => cur = self.nodes[cur].right,
                Ordering::Equal => return cur,
            }
        }
        NIL
    }

    fn min_of(&self, mut cur: usize) -> usize {
        if cur == NIL {
            return NIL;
        }
        while self.nodes[cur].left != NIL {
            cur = self.nodes[cur].left;
        }
        cur
    }

    fn max_of(&self, mut cur: usize) -> usize {
        if cur == NIL {
            return NIL;
        }
        while self.nodes[cur].right != NIL {
            cur = self.nodes[cur].right;
        }
        cur
    }

    fn next_of(&self, mut cur: usize) -> usize {
        if self.nodes[cur].right != NIL {
            return self.min_of(self.nodes[cur].right);
        }
        let mut parent = self.nodes[cur].parent;
        while parent != NIL && cur == self.nodes[parent].right {
            cur = parent;
            parent = self.nodes[parent].parent;
        }
        parent
    }

    fn prev_of(&self, mut cur: usize) -> usize {
        if self.nodes[cur].left != NIL {
            return self.max_of(self.nodes[cur].left);
        }
        let mut parent = self.nodes[cur].parent;
        while parent != NIL && cur == self.nodes[parent].left {
            cur = parent;
            parent = self.nodes[parent].parent;
        }
        parent
    }

    fn height_of(&self, idx: usize) -> usize {
        if idx == NIL {
            return 0;
        }
        let node = &self.nodes[idx];
        1 + self.height_of(node.left).max(self.height_of(node.right))
    }

    // =========================================================================
    // Rotations
    // =========================================================================

    /// Replace `old` with `new` in `old`'s parent (or at the root)
    fn replace_child(&mut self, parent: usize, old: usize, new: usize) {
        if parent == NIL {
            self.root = new;
        } else if self.nodes[parent].left == old {
            self.nodes[parent].left = new;
        } else {
            self.nodes[parent].right = new;
        }
    }

    fn rotate_left(&mut self, x: usize) {
        let y = self.nodes[x].right;
        let y_left = self.nodes[y].left;

        self.nodes[x].right = y_left;
        if y_left != NIL {
            self.nodes[y_left].parent = x;
        }

        let parent = self.nodes[x].parent;
        self.nodes[y].parent = parent;
        self.replace_child(parent, x, y);

        self.nodes[y].left = x;
        self.nodes[x].parent = y;
    }

    fn rotate_right(&mut self, y: usize) {
        let x = self.nodes[y].left;
        let x_right = self.nodes[x].right;

        self.nodes[y].left = x_right;
        if x_right != NIL {
            self.nodes[x_right].parent = y;
        }

        let parent = self.nodes[y].parent;
        self.nodes[x].parent = parent;
        self.replace_child(parent, y, x);

        self.nodes[x].right = y;
        self.nodes[y].parent = x;
    }

    // =========================================================================
    // Rebalancing
    // =========================================================================

    fn insert_fixup(&mut self, mut z: usize) {
        while self.is_red(self.nodes[z].parent) {
            let parent = self.nodes[z].parent;
            let grand = self.nodes[parent].parent;

            if parent == self.nodes[grand].left {
                let uncle = self.nodes[grand].right;
                if self.is_red(uncle) {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grand, Color::Red);
                    z = grand;
                } else {
                    // LR: straighten into LL first
                    if z == self.nodes[parent].right {
                        z = parent;
                        self.rotate_left(z);
                    }
                    let parent = self.nodes[z].parent;
                    let grand = self.nodes[parent].parent;
                    self.set_color(parent, Color::Black);
                    self.set_color(grand, Color::Red);
                    self.rotate_right(grand);
                }
            } else {
                let uncle = self.nodes[grand].left;
                if self.is_red(uncle) {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grand, Color::Red);
                    z = grand;
                } else {
                    // RL: straighten into RR first
                    if z == self.nodes[parent].left {
                        z = parent;
                        self.rotate_right(z);
                    }
                    let parent = self.nodes[z].parent;
                    let grand = self.nodes[parent].parent;
                    self.set_color(parent, Color::Black);
                    self.set_color(grand, Color::Red);
                    self.rotate_left(grand);
                }
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    fn delete_fixup(&mut self, mut x: usize) {
        while x != self.root && !self.is_red(x) {
            let parent = self.nodes[x].parent;

            if x == self.nodes[parent].left {
                let mut sibling = self.nodes[parent].right;
                if self.is_red(sibling) {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_left(parent);
                    sibling = self.nodes[parent].right;
                }

                let (near, far) = (self.nodes[sibling].left, self.nodes[sibling].right);
                if !self.is_red(near) && !self.is_red(far) {
                    self.set_color(sibling, Color::Red);
                    x = parent;
                } else {
                    if !self.is_red(far) {
                        self.set_color(near, Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_right(sibling);
                        sibling = self.nodes[parent].right;
                    }
                    let parent_color = self.color(parent);
                    self.set_color(sibling, parent_color);
                    self.set_color(parent, Color::Black);
                    let far = self.nodes[sibling].right;
                    self.set_color(far, Color::Black);
                    self.rotate_left(parent);
                    x = self.root;
                }
            } else {
                let mut sibling = self.nodes[parent].left;
                if self.is_red(sibling) {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_right(parent);
                    sibling = self.nodes[parent].left;
                }

                let (near, far) = (self.nodes[sibling].right, self.nodes[sibling].left);
                if !self.is_red(near) && !self.is_red(far) {
                    self.set_color(sibling, Color::Red);
                    x = parent;
                } else {
                    if !self.is_red(far) {
                        self.set_color(near, Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_left(sibling);
                        sibling = self.nodes[parent].left;
                    }
                    let parent_color = self.color(parent);
                    self.set_color(sibling, parent_color);
                    self.set_color(parent, Color::Black);
                    let far = self.nodes[sibling].left;
                    self.set_color(far, Color::Black);
                    self.rotate_right(parent);
                    x = self.root;
                }
            }
        }
        self.set_color(x, Color::Black);
    }

    /// Physically unlink `z`, which has at most one non-sentinel child
    fn splice_out(&mut self, z: usize) {
        let node = &self.nodes[z];
        let child = if node.left != NIL { node.left } else { node.right };
        let parent = node.parent;
        let removed_color = node.color;

        // The sentinel's parent is written too; delete_fixup reads it
        self.nodes[child].parent = parent;
        self.replace_child(parent, z, child);

        if removed_color == Color::Black {
            self.delete_fixup(child);
        }
        self.release(z);
    }
}

impl Default for RbTree {
    fn default() -> Self {
        Self::new()
    }
}

impl KvEngine for RbTree {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        check_entry(key, value)?;

        let mut parent = NIL;
        let mut cur = self.root;
        let mut went_left = false;
        while cur != NIL {
            parent = cur;
            match key.cmp(self.nodes[cur].key.as_slice()) {
                Ordering::Less => {
                    went_left = true;
                    cur = self.nodes[cur].left;
                }
                Ordering::Greater => {
                    went_left = false;
                    cur = self.nodes[cur].right;
                }
                Ordering::Equal => return Err(HexError::DuplicateKey),
            }
        }

        let z = self.alloc(Node {
            key: key.to_vec(),
            value: value.to_vec(),
            color: Color::Red,
            left: NIL,
            right: NIL,
            parent,
        });

        if parent == NIL {
            self.root = z;
        } else if went_left {
            self.nodes[parent].left = z;
        } else {
            self.nodes[parent].right = z;
        }

        self.insert_fixup(z);
        self.count += 1;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entry(self.search(key)).map(|(_, value)| value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        check_key(key)?;
        let z = self.search(key);
        if z == NIL {
            return Err(HexError::KeyNotFound);
        }

        let (left, right) = (self.nodes[z].left, self.nodes[z].right);
        let target = if left != NIL && right != NIL {
            // Move the successor's entry into z, then remove the successor's node
            let succ = self.min_of(right);
            let key = std::mem::take(&mut self.nodes[succ].key);
            let value = std::mem::take(&mut self.nodes[succ].value);
            self.nodes[z].key = key;
            self.nodes[z].value = value;
            succ
        } else {
            z
        };

        self.splice_out(target);
        self.count -= 1;
        Ok(())
    }

    fn count(&self) -> usize {
        self.count
    }

    fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[NIL] = Node::sentinel();
        self.free.clear();
        self.root = NIL;
        self.count = 0;
    }

    fn name(&self) -> &'static str {
        "rbtree"
    }
}

/// In-order iterator over an `RbTree`
pub struct RbIter<'a> {
    tree: &'a RbTree,
    next: usize,
}

impl<'a> Iterator for RbIter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == NIL {
            return None;
        }
        let current = self.next;
        self.next = self.tree.next_of(current);
        let node = &self.tree.nodes[current];
        Some((node.key.as_slice(), node.value.as_slice()))
    }
}
