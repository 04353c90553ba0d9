//! Connection Handler
//!
//! Per-connection state and the block-allocated table that holds it.

use std::io::{self, Read, Write};
use std::net::SocketAddr;

use bytes::{Buf, BytesMut};
use mio::net::TcpStream;

use crate::protocol::{encode_response, parse_command, split_line, trim_terminator, Response};
use crate::store::Store;

/// Bytes pulled from the socket per read call
const READ_CHUNK: usize = 4096;

/// Which readiness the connection is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Waiting for a request line
    Receiving,

    /// Holding a reply that has not been fully written
    Sending,
}

/// Result of draining the socket
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReadStatus {
    Open,
    PeerClosed,
}

/// A single client connection driven by the reactor
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    state: ConnState,

    /// Received bytes not yet consumed as a full line
    read_buf: BytesMut,

    /// Encoded reply not yet written
    write_buf: BytesMut,

    /// Dropping the rest of an overlong line
    discarding: bool,

    /// The peer shut down its write side; buffered lines are still answered
    peer_closed: bool,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        // Disable Nagle's algorithm for low latency
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer, error = %e, "could not set TCP_NODELAY");
        }

        Self {
            stream,
            peer,
            state: ConnState::Receiving,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            write_buf: BytesMut::new(),
            discarding: false,
            peer_closed: false,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    /// True once the peer has sent FIN
    pub fn is_peer_closed(&self) -> bool {
        self.peer_closed
    }

    pub(crate) fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Read until the socket would block or the peer shuts down its side
    ///
    /// Lines received before the FIN stay buffered and are still answered.
    pub(crate) fn fill_read_buf(&mut self) -> io::Result<ReadStatus> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    self.peer_closed = true;
                    // A trailing fragment is the peer's last request
                    if !self.discarding
                        && !self.read_buf.is_empty()
                        && !self.read_buf.ends_with(b"\n")
                    {
                        self.read_buf.extend_from_slice(b"\n");
                    }
                    return Ok(ReadStatus::PeerClosed);
                }
                Ok(n) => self.read_buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(ReadStatus::Open),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Answer at most one buffered request line
    ///
    /// Moves to `Sending` when a reply was produced. An unterminated fragment
    /// longer than `max_len` is answered with an error and its remainder is
    /// skipped up to the next newline.
    pub(crate) fn process(&mut self, store: &mut Store, max_len: usize) {
        if self.state != ConnState::Receiving {
            return;
        }

        if self.discarding {
            match split_line(&mut self.read_buf) {
                Some(_) => self.discarding = false,
                None => {
                    self.read_buf.clear();
                    return;
                }
            }
        }

        let response = match split_line(&mut self.read_buf) {
            Some(line) if trim_terminator(&line).len() > max_len => {
                tracing::warn!(peer = %self.peer, len = line.len(), "request line too long");
                Response::Error
            }
            Some(line) => match parse_command(&line) {
                Ok(command) => {
                    tracing::trace!(peer = %self.peer, ?command, "executing");
                    store.execute(command)
                }
                Err(e) => {
                    tracing::debug!(peer = %self.peer, error = %e, "rejected request");
                    Response::Error
                }
            },
            None if self.read_buf.len() > max_len => {
                tracing::warn!(
                    peer = %self.peer,
                    len = self.read_buf.len(),
                    "unterminated request exceeds limit"
                );
                self.read_buf.clear();
                self.discarding = true;
                Response::Error
            }
            None => return,
        };

        self.write_buf.extend_from_slice(&encode_response(&response));
        self.state = ConnState::Sending;
    }

    /// Write as much of the pending reply as the socket takes
    ///
    /// Returns `true` once the reply is fully written, switching back to
    /// `Receiving`.
    pub(crate) fn flush_write_buf(&mut self) -> io::Result<bool> {
        while !self.write_buf.is_empty() {
            match self.stream.write(&self.write_buf) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => self.write_buf.advance(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.state = ConnState::Receiving;
        Ok(true)
    }
}

/// Connection slots grouped into fixed-size blocks
///
/// Ids are stable for the lifetime of a connection and recycled after it
/// closes. `id / block_size` selects the block and `id % block_size` the
/// slot inside it. Blocks are appended as needed and never released.
pub struct ConnectionTable {
    blocks: Vec<Vec<Option<Connection>>>,
    block_size: usize,
    free: Vec<usize>,
    next_id: usize,
    live: usize,
}

impl ConnectionTable {
    pub fn new(block_size: usize) -> Self {
        Self {
            blocks: Vec::new(),
            block_size: block_size.max(1),
            free: Vec::new(),
            next_id: 0,
            live: 0,
        }
    }

    /// Store a connection and return its id
    pub fn insert(&mut self, conn: Connection) -> usize {
        let id = self.free.pop().unwrap_or_else(|| {
            self.next_id += 1;
            self.next_id - 1
        });

        let block = id / self.block_size;
        while self.blocks.len() <= block {
            let mut slots = Vec::with_capacity(self.block_size);
            slots.resize_with(self.block_size, || None);
            self.blocks.push(slots);
            tracing::debug!(blocks = self.blocks.len(), "connection table grew");
        }

        self.blocks[block][id % self.block_size] = Some(conn);
        self.live += 1;
        id
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Connection> {
        self.blocks
            .get_mut(id / self.block_size)?
            .get_mut(id % self.block_size)?
            .as_mut()
    }

    /// Take a connection out, freeing its id
    pub fn remove(&mut self, id: usize) -> Option<Connection> {
        let conn = self
            .blocks
            .get_mut(id / self.block_size)?
            .get_mut(id % self.block_size)?
            .take()?;
        self.free.push(id);
        self.live -= 1;
        Some(conn)
    }

    /// Open connections
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}
