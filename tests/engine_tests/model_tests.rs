//! Model Tests
//!
//! Random operation sequences checked step by step against `BTreeMap`.

use std::collections::BTreeMap;

use hexkv::engine::{BTree, KvEngine, RbTree, SkipList};
use hexkv::HexError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{all_engines, key};

// =============================================================================
// Helper Functions
// =============================================================================

/// Apply `ops` random operations to `engine` and to a model, comparing every outcome
fn run_against_model(engine: &mut dyn KvEngine, seed: u64, ops: usize, key_space: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut model: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();

    for step in 0..ops {
        let k = key(rng.gen_range(0..key_space));
        match rng.gen_range(0..10) {
            0..=4 => {
                let v = format!("v{step}").into_bytes();
                let result = engine.set(&k, &v);
                if model.contains_key(&k) {
                    assert!(matches!(result, Err(HexError::DuplicateKey)));
                } else {
                    result.unwrap();
                    model.insert(k, v);
                }
            }
            5..=7 => {
                let result = engine.delete(&k);
                match model.remove(&k) {
                    Some(_) => result.unwrap(),
                    None => assert!(matches!(result, Err(HexError::KeyNotFound))),
                }
            }
            _ => {
                assert_eq!(
                    engine.get(&k),
                    model.get(&k).map(Vec::as_slice),
                    "{} step {step}",
                    engine.name()
                );
            }
        }
        assert_eq!(engine.count(), model.len(), "{} step {step}", engine.name());
    }

    for (k, v) in &model {
        assert_eq!(engine.get(k), Some(v.as_slice()), "{}", engine.name());
    }
}

fn model_of(seed: u64, ops: usize, key_space: usize) -> Vec<Vec<u8>> {
    // Replays the same sequence as run_against_model to learn the final key set
    let mut rng = StdRng::seed_from_u64(seed);
    let mut model: BTreeMap<Vec<u8>, ()> = BTreeMap::new();
    for _ in 0..ops {
        let k = key(rng.gen_range(0..key_space));
        match rng.gen_range(0..10) {
            0..=4 => {
                model.entry(k).or_insert(());
            }
            5..=7 => {
                model.remove(&k);
            }
            _ => {}
        }
    }
    model.into_keys().collect()
}

// =============================================================================
// Randomized Workloads
// =============================================================================

#[test]
fn test_all_engines_match_model() {
    for (i, mut engine) in all_engines().into_iter().enumerate() {
        run_against_model(engine.as_mut(), 1000 + i as u64, 3000, 300);
    }
}

#[test]
fn test_all_engines_match_model_dense_keys() {
    // A tiny key space forces constant duplicate and miss paths
    for mut engine in all_engines() {
        run_against_model(engine.as_mut(), 77, 2000, 12);
    }
}

#[test]
fn test_btree_orders_match_model() {
    for order in [4, 6, 10, 32] {
        let mut tree = BTree::new(order).unwrap();
        run_against_model(&mut tree, order as u64, 4000, 500);
    }
}

#[test]
fn test_ordered_engines_iterate_in_key_order() {
    let (seed, ops, space) = (5, 2500, 400);
    let expected = model_of(seed, ops, space);

    let mut rb = RbTree::new();
    run_against_model(&mut rb, seed, ops, space);
    let keys: Vec<Vec<u8>> = rb.iter().map(|(k, _)| k.to_vec()).collect();
    assert_eq!(keys, expected);

    let mut bt = BTree::new(6).unwrap();
    run_against_model(&mut bt, seed, ops, space);
    let keys: Vec<Vec<u8>> = bt.iter().map(|(k, _)| k.to_vec()).collect();
    assert_eq!(keys, expected);

    let mut sk = SkipList::with_seed(8, 99);
    run_against_model(&mut sk, seed, ops, space);
    let keys: Vec<Vec<u8>> = sk.iter().map(|(k, _)| k.to_vec()).collect();
    assert_eq!(keys, expected);
}
