//! Blocking Client
//!
//! A small synchronous client for the line protocol, used by the CLI and
//! the end-to-end tests.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{HexError, Result};
use crate::protocol::{read_response, write_command, Command, Operation, Response};
use crate::store::EngineKind;

/// One TCP connection to a hexkv server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to `addr`
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| HexError::Network(format!("connect failed: {e}")))?;
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Bound how long a single reply may take
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        self.writer.get_ref().set_write_timeout(timeout)?;
        Ok(())
    }

    /// Send one command and wait for its reply
    pub fn request(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader, &command.op)
    }

    /// Send a free-form line and return the reply without its terminator
    pub fn request_raw(&mut self, line: &str) -> Result<String> {
        self.writer.write_all(line.trim_end_matches(&['\r', '\n'][..]).as_bytes())?;
        self.writer.write_all(b"\r\n")?;
        self.writer.flush()?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(HexError::Network("connection closed by server".to_string()));
        }
        Ok(reply.trim_end_matches(&['\r', '\n'][..]).to_string())
    }

    // =========================================================================
    // Typed helpers
    // =========================================================================

    pub fn set(&mut self, engine: EngineKind, key: &[u8], value: &[u8]) -> Result<Response> {
        let op = Operation::Set {
            key: key.to_vec(),
            value: value.to_vec(),
        };
        self.request(&Command::new(engine, op))
    }

    pub fn get(&mut self, engine: EngineKind, key: &[u8]) -> Result<Response> {
        let op = Operation::Get { key: key.to_vec() };
        self.request(&Command::new(engine, op))
    }

    pub fn delete(&mut self, engine: EngineKind, key: &[u8]) -> Result<Response> {
        let op = Operation::Delete { key: key.to_vec() };
        self.request(&Command::new(engine, op))
    }

    pub fn count(&mut self, engine: EngineKind) -> Result<Response> {
        self.request(&Command::new(engine, Operation::Count))
    }

    pub fn exist(&mut self, engine: EngineKind, key: &[u8]) -> Result<Response> {
        let op = Operation::Exist { key: key.to_vec() };
        self.request(&Command::new(engine, op))
    }
}
