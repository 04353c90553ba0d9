//! Store Module
//!
//! Owns one instance of every engine and routes commands to them.
//!
//! ## Responsibilities
//! - Build all six engines from the `Config`
//! - Run exactly one engine operation per command
//! - Translate engine outcomes into protocol responses
//! - Tear every engine down on `clear`
//!
//! The store is an ordinary value handed to whoever serves requests. There
//! is no global state; the reactor owns the store it was given and is the
//! only caller, so no locking is involved.

use std::fmt;

use crate::config::Config;
use crate::engine::{ArrayStore, BTree, ChainedHash, DynamicHash, KvEngine, RbTree, SkipList};
use crate::error::{HexError, Result};
use crate::protocol::{Command, Operation, Response};

/// Selects one of the six engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Array,
    RbTree,
    BTree,
    ChainedHash,
    DynamicHash,
    SkipList,
}

impl EngineKind {
    /// Every engine, in protocol table order
    pub const ALL: [EngineKind; 6] = [
        EngineKind::Array,
        EngineKind::RbTree,
        EngineKind::BTree,
        EngineKind::ChainedHash,
        EngineKind::DynamicHash,
        EngineKind::SkipList,
    ];

    /// Command verb prefix selecting this engine
    pub fn prefix(self) -> &'static str {
        match self {
            EngineKind::Array => "",
            EngineKind::RbTree => "RB",
            EngineKind::BTree => "B",
            EngineKind::ChainedHash => "SH",
            EngineKind::DynamicHash => "DH",
            EngineKind::SkipList => "SK",
        }
    }

    /// Parse a CLI-style engine name (`array`, `rb`, `b`, `sh`, `dh`, `sk`)
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "array" => Ok(EngineKind::Array),
            "rb" | "rbtree" => Ok(EngineKind::RbTree),
            "b" | "btree" => Ok(EngineKind::BTree),
            "sh" | "hash" => Ok(EngineKind::ChainedHash),
            "dh" | "dhash" => Ok(EngineKind::DynamicHash),
            "sk" | "skiplist" => Ok(EngineKind::SkipList),
            other => Err(HexError::InvalidArgument(format!("unknown engine: {other}"))),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineKind::Array => "array",
            EngineKind::RbTree => "rbtree",
            EngineKind::BTree => "btree",
            EngineKind::ChainedHash => "chained-hash",
            EngineKind::DynamicHash => "dynamic-hash",
            EngineKind::SkipList => "skiplist",
        };
        f.write_str(name)
    }
}

/// All six engines behind one handle
pub struct Store {
    array: ArrayStore,
    rbtree: RbTree,
    btree: BTree,
    chained: ChainedHash,
    dynamic: DynamicHash,
    skiplist: SkipList,
}

impl Store {
    /// Build every engine from `config`
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let store = Self {
            array: ArrayStore::new(config.array_block_size),
            rbtree: RbTree::new(),
            btree: BTree::new(config.btree_order)?,
            chained: ChainedHash::new(config.hash_buckets),
            dynamic: DynamicHash::new(config.dhash_initial_capacity),
            skiplist: SkipList::new(config.skiplist_max_level),
        };

        tracing::info!(
            array_block = config.array_block_size,
            hash_buckets = config.hash_buckets,
            dhash_capacity = config.dhash_initial_capacity,
            btree_order = config.btree_order,
            skiplist_level = config.skiplist_max_level,
            "store initialized"
        );
        Ok(store)
    }

    /// Borrow one engine
    pub fn engine(&self, kind: EngineKind) -> &dyn KvEngine {
        match kind {
            EngineKind::Array => &self.array,
            EngineKind::RbTree => &self.rbtree,
            EngineKind::BTree => &self.btree,
            EngineKind::ChainedHash => &self.chained,
            EngineKind::DynamicHash => &self.dynamic,
            EngineKind::SkipList => &self.skiplist,
        }
    }

    /// Mutably borrow one engine
    pub fn engine_mut(&mut self, kind: EngineKind) -> &mut dyn KvEngine {
        match kind {
            EngineKind::Array => &mut self.array,
            EngineKind::RbTree => &mut self.rbtree,
            EngineKind::BTree => &mut self.btree,
            EngineKind::ChainedHash => &mut self.chained,
            EngineKind::DynamicHash => &mut self.dynamic,
            EngineKind::SkipList => &mut self.skiplist,
        }
    }

    /// Run one command and map its outcome to a response
    pub fn execute(&mut self, command: Command) -> Response {
        let Command { engine: kind, op } = command;
        let engine = self.engine_mut(kind);

        match op {
            Operation::Set { key, value } => match engine.set(&key, &value) {
                Ok(()) => Response::Ok,
                Err(HexError::DuplicateKey) => Response::AlreadyExists,
                Err(e) => Self::failure(kind, "set", e),
            },
            Operation::Get { key } => match engine.get(&key) {
                Some(value) => Response::Value(value.to_vec()),
                None => Response::NoSuchKey,
            },
            Operation::Delete { key } => match engine.delete(&key) {
                Ok(()) => Response::Ok,
                Err(HexError::KeyNotFound) => Response::NoSuchKey,
                Err(e) => Self::failure(kind, "delete", e),
            },
            Operation::Count => Response::Count(engine.count()),
            Operation::Exist { key } => Response::from_bool(engine.exist(&key)),
        }
    }

    /// Drop every entry in every engine
    pub fn clear(&mut self) {
        for kind in EngineKind::ALL {
            self.engine_mut(kind).clear();
        }
        tracing::debug!("store cleared");
    }

    /// Live keys summed over all engines
    pub fn total_count(&self) -> usize {
        EngineKind::ALL
            .iter()
            .map(|&kind| self.engine(kind).count())
            .sum()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn btree(&self) -> &BTree {
        &self.btree
    }

    pub fn dynamic_hash(&self) -> &DynamicHash {
        &self.dynamic
    }

    pub fn skiplist(&self) -> &SkipList {
        &self.skiplist
    }

    fn failure(kind: EngineKind, op: &str, err: HexError) -> Response {
        tracing::warn!(engine = %kind, op, error = %err, "engine operation failed");
        Response::Error
    }
}
