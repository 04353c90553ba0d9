//! Network Module
//!
//! TCP serving over a single-threaded readiness reactor.
//!
//! ## Architecture
//! - One `mio::Poll` watches every listener and connection
//! - Each connection alternates between receiving a line and sending its reply
//! - Commands run synchronously against the `Store` on the reactor thread

mod connection;
mod reactor;

pub use connection::{ConnState, Connection, ConnectionTable};
pub use reactor::{Reactor, ShutdownHandle};
