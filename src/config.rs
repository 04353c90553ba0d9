//! Configuration for hexkv
//!
//! Centralized configuration with sensible defaults.

use std::net::SocketAddr;

use crate::error::{HexError, Result};

/// Main configuration for a hexkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Engine Configuration
    // -------------------------------------------------------------------------
    /// Slots per block of the array engine
    pub array_block_size: usize,

    /// Fixed bucket count of the chained hash table
    pub hash_buckets: usize,

    /// Initial slot count of the dynamic hash table (also its shrink floor)
    pub dhash_initial_capacity: usize,

    /// Order `m` of the B-tree (max children per node)
    pub btree_order: usize,

    /// Maximum level of the skiplist
    pub skiplist_max_level: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen addresses, one listener each
    pub listen_addrs: Vec<SocketAddr>,

    /// Longest accepted protocol line (bytes, terminator excluded)
    pub max_message_len: usize,

    /// Readiness events drained per poll
    pub events_capacity: usize,

    /// Connection slots per connection-table block
    pub connection_block_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            array_block_size: 32,
            hash_buckets: 1024,
            dhash_initial_capacity: 512,
            btree_order: 6,
            skiplist_max_level: 6,
            listen_addrs: vec![SocketAddr::from(([0, 0, 0, 0], 9096))],
            max_message_len: 1024,
            events_capacity: 1024,
            connection_block_size: 1024,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject values no engine or the reactor can work with
    pub fn validate(&self) -> Result<()> {
        if self.array_block_size == 0 {
            return Err(HexError::Config("array_block_size must be > 0".into()));
        }
        if self.hash_buckets == 0 {
            return Err(HexError::Config("hash_buckets must be > 0".into()));
        }
        if self.dhash_initial_capacity < 2 {
            return Err(HexError::Config(
                "dhash_initial_capacity must be >= 2".into(),
            ));
        }
        if self.btree_order < 4 || self.btree_order % 2 != 0 {
            return Err(HexError::Config(format!(
                "btree_order must be an even number >= 4, got {}",
                self.btree_order
            )));
        }
        if self.skiplist_max_level == 0 {
            return Err(HexError::Config("skiplist_max_level must be > 0".into()));
        }
        if self.listen_addrs.is_empty() {
            return Err(HexError::Config("at least one listen address is required".into()));
        }
        if self.max_message_len == 0 || self.events_capacity == 0 {
            return Err(HexError::Config(
                "max_message_len and events_capacity must be > 0".into(),
            ));
        }
        if self.connection_block_size == 0 {
            return Err(HexError::Config("connection_block_size must be > 0".into()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the array engine block size
    pub fn array_block_size(mut self, slots: usize) -> Self {
        self.config.array_block_size = slots;
        self
    }

    /// Set the chained hash bucket count
    pub fn hash_buckets(mut self, buckets: usize) -> Self {
        self.config.hash_buckets = buckets;
        self
    }

    /// Set the dynamic hash initial capacity
    pub fn dhash_initial_capacity(mut self, slots: usize) -> Self {
        self.config.dhash_initial_capacity = slots;
        self
    }

    /// Set the B-tree order
    pub fn btree_order(mut self, order: usize) -> Self {
        self.config.btree_order = order;
        self
    }

    /// Set the skiplist maximum level
    pub fn skiplist_max_level(mut self, level: usize) -> Self {
        self.config.skiplist_max_level = level;
        self
    }

    /// Replace the listen addresses with a single one
    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.config.listen_addrs = vec![addr];
        self
    }

    /// Replace the listen addresses
    pub fn listen_addrs(mut self, addrs: impl IntoIterator<Item = SocketAddr>) -> Self {
        self.config.listen_addrs = addrs.into_iter().collect();
        self
    }

    /// Set the maximum protocol line length
    pub fn max_message_len(mut self, len: usize) -> Self {
        self.config.max_message_len = len;
        self
    }

    /// Set the number of events drained per poll
    pub fn events_capacity(mut self, count: usize) -> Self {
        self.config.events_capacity = count;
        self
    }

    /// Set the connection table block size
    pub fn connection_block_size(mut self, slots: usize) -> Self {
        self.config.connection_block_size = slots;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
