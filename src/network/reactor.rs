//! Connection Reactor
//!
//! Single-threaded readiness loop multiplexing every listener and client
//! socket over one `mio::Poll`.
//!
//! ## Tokens
//! - `Token(0)`: the shutdown waker
//! - `Token(1..=L)`: the `L` listeners
//! - `Token(L + 1 + id)`: connection `id`
//!
//! ## Connection lifecycle
//! ```text
//!            accept
//!   (idle) ─────────► Receiving ──── full line ────► Sending
//!     ▲                   │  ▲                          │
//!     │    peer closed /  │  └──── reply written ───────┘
//!     └──── I/O error ────┘
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token, Waker};

use super::connection::{ConnState, Connection, ConnectionTable, ReadStatus};
use crate::config::Config;
use crate::error::{HexError, Result};
use crate::store::Store;

const WAKER: Token = Token(0);

/// Stops a running reactor from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    /// Make `Reactor::run` return `Ok(())` after its current iteration
    pub fn shutdown(&self) -> Result<()> {
        self.flag.store(true, Ordering::SeqCst);
        self.waker.wake()?;
        Ok(())
    }
}

/// Event loop owning the listeners, the connections and the store
pub struct Reactor {
    poll: Poll,
    listeners: Vec<TcpListener>,
    connections: ConnectionTable,
    store: Store,
    max_message_len: usize,
    events_capacity: usize,
    shutdown: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl Reactor {
    /// Bind every configured address and register the listeners
    pub fn bind(config: &Config, store: Store) -> Result<Self> {
        config.validate()?;

        let poll = Poll::new()?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);

        let mut listeners = Vec::with_capacity(config.listen_addrs.len());
        for (i, addr) in config.listen_addrs.iter().enumerate() {
            let mut listener = TcpListener::bind(*addr)
                .map_err(|e| HexError::Network(format!("bind {addr}: {e}")))?;
            poll.registry()
                .register(&mut listener, Token(i + 1), Interest::READABLE)?;
            tracing::info!(addr = %listener.local_addr()?, "listening");
            listeners.push(listener);
        }

        Ok(Self {
            poll,
            listeners,
            connections: ConnectionTable::new(config.connection_block_size),
            store,
            max_message_len: config.max_message_len,
            events_capacity: config.events_capacity,
            shutdown: Arc::new(AtomicBool::new(false)),
            waker,
        })
    }

    /// Addresses the listeners are bound to
    pub fn local_addrs(&self) -> Result<Vec<SocketAddr>> {
        self.listeners
            .iter()
            .map(|l| l.local_addr().map_err(HexError::from))
            .collect()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            waker: Arc::clone(&self.waker),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Consume the reactor, handing back its store
    pub fn into_store(self) -> Store {
        self.store
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Run the loop until shut down or `poll` fails
    pub fn run(&mut self) -> Result<()> {
        let mut events = Events::with_capacity(self.events_capacity);

        loop {
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                tracing::error!(error = %e, "readiness wait failed");
                return Err(HexError::Network(format!("poll failed: {e}")));
            }

            for event in events.iter() {
                let token = event.token();
                if token == WAKER {
                    continue;
                }
                if token.0 <= self.listeners.len() {
                    self.accept(token.0 - 1);
                    continue;
                }

                let id = token.0 - self.listeners.len() - 1;
                if event.is_readable() {
                    self.on_readable(id);
                }
                if event.is_writable() {
                    self.on_writable(id);
                }
            }

            if self.shutdown.load(Ordering::SeqCst) {
                tracing::info!(open = self.connections.len(), "reactor shutting down");
                return Ok(());
            }
        }
    }

    fn token_of(&self, id: usize) -> Token {
        Token(id + self.listeners.len() + 1)
    }

    fn accept(&mut self, listener: usize) {
        loop {
            let (stream, peer) = match self.listeners[listener].accept() {
                Ok(accepted) => accepted,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    return;
                }
            };

            let id = self.connections.insert(Connection::new(stream, peer));
            let token = self.token_of(id);
            let registered = match self.connections.get_mut(id) {
                Some(conn) => {
                    self.poll
                        .registry()
                        .register(conn.stream_mut(), token, Interest::READABLE)
                }
                None => continue,
            };

            match registered {
                Ok(()) => tracing::debug!(%peer, id, "connection opened"),
                Err(e) => {
                    tracing::warn!(%peer, error = %e, "could not register connection");
                    self.connections.remove(id);
                }
            }
        }
    }

    fn on_readable(&mut self, id: usize) {
        let Some(conn) = self.connections.get_mut(id) else {
            return;
        };
        if conn.state() != ConnState::Receiving {
            return;
        }

        match conn.fill_read_buf() {
            Ok(ReadStatus::Open) => {}
            Ok(ReadStatus::PeerClosed) => {
                tracing::debug!(peer = %conn.peer(), id, "peer shut down its write side");
            }
            Err(e) => {
                tracing::warn!(peer = %conn.peer(), error = %e, "receive failed");
                self.close(id);
                return;
            }
        }

        conn.process(&mut self.store, self.max_message_len);
        let state = conn.state();
        let peer_closed = conn.is_peer_closed();
        match state {
            ConnState::Sending => self.rearm(id),
            // Nothing left to answer once the peer is gone
            ConnState::Receiving if peer_closed => self.close(id),
            ConnState::Receiving => {}
        }
    }

    fn on_writable(&mut self, id: usize) {
        let Some(conn) = self.connections.get_mut(id) else {
            return;
        };
        if conn.state() != ConnState::Sending {
            return;
        }

        // Pipelined lines are answered here; the socket stays writable so no
        // further edge would arrive for them
        loop {
            match conn.flush_write_buf() {
                Ok(true) => {
                    conn.process(&mut self.store, self.max_message_len);
                    if conn.state() == ConnState::Receiving {
                        break;
                    }
                }
                Ok(false) => return,
                Err(e) => {
                    tracing::warn!(peer = %conn.peer(), error = %e, "send failed");
                    self.close(id);
                    return;
                }
            }
        }

        if conn.is_peer_closed() {
            self.close(id);
        } else {
            self.rearm(id);
        }
    }

    /// Point the registration at the readiness the current state waits for
    fn rearm(&mut self, id: usize) {
        let token = self.token_of(id);
        let Some(conn) = self.connections.get_mut(id) else {
            return;
        };
        let interest = match conn.state() {
            ConnState::Receiving => Interest::READABLE,
            ConnState::Sending => Interest::WRITABLE,
        };

        if let Err(e) = self
            .poll
            .registry()
            .reregister(conn.stream_mut(), token, interest)
        {
            tracing::warn!(peer = %conn.peer(), error = %e, "reregister failed");
            self.close(id);
        }
    }

    fn close(&mut self, id: usize) {
        let Some(mut conn) = self.connections.remove(id) else {
            return;
        };
        if let Err(e) = self.poll.registry().deregister(conn.stream_mut()) {
            tracing::debug!(peer = %conn.peer(), error = %e, "deregister failed");
        }
        tracing::debug!(peer = %conn.peer(), id, "connection closed");
    }
}
