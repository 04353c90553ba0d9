//! Contract Tests
//!
//! Behavior every engine must share.

use hexkv::HexError;

use crate::{all_engines, key};

#[test]
fn test_set_then_get() {
    for mut engine in all_engines() {
        engine.set(b"hello", b"world").unwrap();
        assert_eq!(engine.get(b"hello"), Some(&b"world"[..]), "{}", engine.name());
        assert_eq!(engine.get(b"missing"), None, "{}", engine.name());
    }
}

#[test]
fn test_duplicate_set_keeps_first_value() {
    for mut engine in all_engines() {
        engine.set(b"k", b"first").unwrap();
        let result = engine.set(b"k", b"second");
        assert!(matches!(result, Err(HexError::DuplicateKey)), "{}", engine.name());
        assert_eq!(engine.get(b"k"), Some(&b"first"[..]), "{}", engine.name());
        assert_eq!(engine.count(), 1);
    }
}

#[test]
fn test_delete_missing_key() {
    for mut engine in all_engines() {
        assert!(matches!(engine.delete(b"nope"), Err(HexError::KeyNotFound)));

        engine.set(b"a", b"1").unwrap();
        engine.delete(b"a").unwrap();
        assert!(
            matches!(engine.delete(b"a"), Err(HexError::KeyNotFound)),
            "{}",
            engine.name()
        );
        assert_eq!(engine.count(), 0);
    }
}

#[test]
fn test_empty_key_and_value_rejected() {
    for mut engine in all_engines() {
        assert!(matches!(engine.set(b"", b"v"), Err(HexError::InvalidArgument(_))));
        assert!(matches!(engine.set(b"k", b""), Err(HexError::InvalidArgument(_))));
        assert!(matches!(engine.delete(b""), Err(HexError::InvalidArgument(_))));
        assert_eq!(engine.count(), 0, "{}", engine.name());
    }
}

#[test]
fn test_count_tracks_live_keys() {
    for mut engine in all_engines() {
        for i in 0..40 {
            engine.set(&key(i), b"v").unwrap();
        }
        for i in (0..40).step_by(2) {
            engine.delete(&key(i)).unwrap();
        }
        assert_eq!(engine.count(), 20, "{}", engine.name());
        assert!(engine.exist(&key(1)));
        assert!(!engine.exist(&key(2)));
    }
}

#[test]
fn test_deleted_key_can_be_set_again() {
    for mut engine in all_engines() {
        engine.set(b"k", b"old").unwrap();
        engine.delete(b"k").unwrap();
        engine.set(b"k", b"new").unwrap();
        assert_eq!(engine.get(b"k"), Some(&b"new"[..]), "{}", engine.name());
    }
}

#[test]
fn test_clear_resets_engine() {
    for mut engine in all_engines() {
        for i in 0..30 {
            engine.set(&key(i), b"v").unwrap();
        }
        engine.clear();
        assert_eq!(engine.count(), 0, "{}", engine.name());
        assert!(!engine.exist(&key(0)));

        engine.set(&key(0), b"again").unwrap();
        assert_eq!(engine.get(&key(0)), Some(&b"again"[..]));
    }
}

#[test]
fn test_values_are_copied() {
    for mut engine in all_engines() {
        let mut value = b"original".to_vec();
        engine.set(b"k", &value).unwrap();
        value[0] = b'X';
        assert_eq!(engine.get(b"k"), Some(&b"original"[..]), "{}", engine.name());
    }
}
