//! hexkv Server Binary
//!
//! Builds the store and serves it over TCP.

use std::net::SocketAddr;

use clap::Parser;
use hexkv::{Config, Reactor, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// hexkv Server
#[derive(Parser, Debug)]
#[command(name = "hexkv-server")]
#[command(about = "In-memory key-value store with six storage engines")]
#[command(version)]
struct Args {
    /// Listen address (host:port); repeat to listen on several ports
    #[arg(short, long, default_value = "0.0.0.0:9096")]
    listen: Vec<SocketAddr>,

    /// B-tree order (even, >= 4)
    #[arg(long, default_value = "6")]
    btree_order: usize,

    /// Skiplist maximum level
    #[arg(long, default_value = "6")]
    skiplist_level: usize,

    /// Initial slot count of the dynamic hash table
    #[arg(long, default_value = "512")]
    dhash_capacity: usize,

    /// Bucket count of the chained hash table
    #[arg(long, default_value = "1024")]
    hash_buckets: usize,

    /// Slots per block of the array engine
    #[arg(long, default_value = "32")]
    array_block: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hexkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("hexkv server v{}", hexkv::VERSION);

    let config = Config::builder()
        .listen_addrs(args.listen)
        .btree_order(args.btree_order)
        .skiplist_max_level(args.skiplist_level)
        .dhash_initial_capacity(args.dhash_capacity)
        .hash_buckets(args.hash_buckets)
        .array_block_size(args.array_block)
        .build();

    let store = match Store::new(&config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to initialize store: {}", e);
            std::process::exit(1);
        }
    };

    let mut reactor = match Reactor::bind(&config, store) {
        Ok(reactor) => reactor,
        Err(e) => {
            tracing::error!("Failed to start reactor: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = reactor.run() {
        tracing::error!("Reactor error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
