//! Scenario Tests
//!
//! Engine-specific structural behavior observable through public accessors.

use hexkv::engine::{ArrayStore, BTree, ChainedHash, DynamicHash, KvEngine, RbTree, SkipList};

use crate::key;

// =============================================================================
// Dynamic Hash
// =============================================================================

#[test]
fn test_dynamic_hash_grows_then_shrinks() {
    let mut table = DynamicHash::new(512);

    for i in 0..257 {
        table.set(&key(i), b"v").unwrap();
    }
    assert_eq!(table.capacity(), 1024);

    for i in 0..250 {
        table.delete(&key(i)).unwrap();
    }
    assert_eq!(table.capacity(), 512);
    assert_eq!(table.count(), 7);
    for i in 250..257 {
        assert_eq!(table.get(&key(i)), Some(&b"v"[..]));
    }
}

#[test]
fn test_dynamic_hash_growth_threshold() {
    let mut table = DynamicHash::new(16);
    for i in 0..8 {
        table.set(&key(i), b"v").unwrap();
    }
    assert_eq!(table.capacity(), 16);

    table.set(&key(8), b"v").unwrap();
    assert_eq!(table.capacity(), 32);
}

#[test]
fn test_dynamic_hash_survives_repeated_cycles() {
    let mut table = DynamicHash::new(8);
    for round in 0..5 {
        for i in 0..300 {
            table.set(&key(i), format!("{round}").as_bytes()).unwrap();
        }
        assert_eq!(table.capacity(), 1024);
        for i in 0..295 {
            table.delete(&key(i)).unwrap();
        }
        for i in 295..300 {
            assert_eq!(table.get(&key(i)), Some(format!("{round}").as_bytes()));
        }
        for i in 295..300 {
            table.delete(&key(i)).unwrap();
        }
        assert_eq!(table.capacity(), 8);
    }
}

// =============================================================================
// B-Tree
// =============================================================================

#[test]
fn test_btree_order_four_single_root_split() {
    let mut tree = BTree::new(4).unwrap();
    let keys: Vec<&[u8]> = vec![&b"a"[..], b"b", b"c", b"d", b"e", b"f", b"g"];

    for k in &keys[..3] {
        tree.set(k, k).unwrap();
    }
    assert_eq!(tree.height(), 1);
    assert_eq!(tree.root_len(), 3);

    // Fourth insert meets a full root
    tree.set(keys[3], keys[3]).unwrap();
    assert_eq!(tree.height(), 2);
    assert_eq!(tree.root_len(), 1);

    for k in &keys[4..] {
        tree.set(k, k).unwrap();
    }
    // Later splits only touch leaves
    assert_eq!(tree.height(), 2);

    let walked: Vec<&[u8]> = tree.iter().map(|(k, _)| k).collect();
    assert_eq!(walked, keys);
}

#[test]
fn test_btree_shrinks_to_empty() {
    let mut tree = BTree::new(4).unwrap();
    for i in 0..100 {
        tree.set(&key(i), b"v").unwrap();
    }
    assert!(tree.height() >= 3);

    for i in (0..100).rev() {
        tree.delete(&key(i)).unwrap();
    }
    assert_eq!(tree.height(), 0);
    assert_eq!(tree.iter().count(), 0);
}

#[test]
fn test_btree_rejects_odd_order() {
    assert!(BTree::new(5).is_err());
}

// =============================================================================
// Red-Black Tree
// =============================================================================

#[test]
fn test_rbtree_ascending_inserts_stay_balanced() {
    let mut tree = RbTree::new();
    for i in 0..1024 {
        tree.set(&key(i), b"v").unwrap();
    }
    // Red-black height bound: 2 * log2(n + 1)
    assert!(tree.height() <= 20, "height {}", tree.height());
}

#[test]
fn test_rbtree_ordered_queries() {
    let mut tree = RbTree::new();
    for k in [&b"m"[..], b"c", b"x", b"a"] {
        tree.set(k, k).unwrap();
    }
    assert_eq!(tree.min().map(|(k, _)| k), Some(&b"a"[..]));
    assert_eq!(tree.max().map(|(k, _)| k), Some(&b"x"[..]));
    assert_eq!(tree.successor(b"c").map(|(k, _)| k), Some(&b"m"[..]));
    assert_eq!(tree.predecessor(b"c").map(|(k, _)| k), Some(&b"a"[..]));
    assert_eq!(tree.successor(b"x"), None);
    assert_eq!(tree.predecessor(b"zz"), None);
}

// =============================================================================
// Skiplist
// =============================================================================

#[test]
fn test_skiplist_level_bounded_and_reset() {
    let mut list = SkipList::with_seed(4, 3);
    for i in 0..256 {
        list.set(&key(i), b"v").unwrap();
        assert!(list.level() <= list.max_level());
    }
    list.clear();
    assert_eq!(list.level(), 1);
}

#[test]
fn test_skiplist_same_seed_same_shape() {
    let mut a = SkipList::with_seed(8, 21);
    let mut b = SkipList::with_seed(8, 21);
    for i in 0..128 {
        a.set(&key(i), b"v").unwrap();
        b.set(&key(i), b"v").unwrap();
    }
    assert_eq!(a.level(), b.level());
}

// =============================================================================
// Array And Chained Hash
// =============================================================================

#[test]
fn test_array_blocks_follow_occupancy() {
    let mut store = ArrayStore::new(8);
    for i in 0..20 {
        store.set(&key(i), b"v").unwrap();
    }
    assert_eq!(store.block_count(), 3);

    for i in 16..20 {
        store.delete(&key(i)).unwrap();
    }
    assert_eq!(store.block_count(), 2);
}

#[test]
fn test_chained_hash_never_resizes() {
    let mut table = ChainedHash::new(4);
    for i in 0..100 {
        table.set(&key(i), b"v").unwrap();
    }
    assert_eq!(table.bucket_count(), 4);
    assert!(table.longest_chain() >= 25);
}
