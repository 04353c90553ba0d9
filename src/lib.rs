//! # hexkv
//!
//! An in-memory key-value store offering six interchangeable engines:
//! - Unordered block array
//! - Chained hash table with a fixed bucket count
//! - Open-addressed dynamic hash table that grows and shrinks with load
//! - Red-black tree
//! - Order-m B-tree
//! - Skiplist
//!
//! All six are reachable through one text line protocol served by a
//! single-threaded readiness reactor.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Reactor (mio::Poll)                       │
//! │        listeners + connections, one thread, no locks         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one line
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Protocol (parse_command)                     │
//! │           prefix selects engine, suffix selects op           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Command
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Store::execute                           │
//! └──┬────────┬────────┬────────┬────────┬────────┬─────────────┘
//!    ▼        ▼        ▼        ▼        ▼        ▼
//! ┌──────┐┌──────┐┌──────┐┌──────┐┌──────┐┌──────────┐
//! │array ││  RB  ││  B   ││  SH  ││  DH  ││ skiplist │
//! └──────┘└──────┘└──────┘└──────┘└──────┘└──────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod client;
pub mod engine;
pub mod network;
pub mod protocol;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::Client;
pub use config::Config;
pub use engine::KvEngine;
pub use error::{HexError, Result};
pub use network::{Reactor, ShutdownHandle};
pub use store::{EngineKind, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of hexkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
