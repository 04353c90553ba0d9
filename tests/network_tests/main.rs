//! Network Tests
//!
//! A real reactor on an ephemeral port, driven over TCP.

mod reactor_tests;

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hexkv::config::ConfigBuilder;
use hexkv::{Config, Reactor, ShutdownHandle, Store};

// =============================================================================
// Helper Functions
// =============================================================================

pub fn loopback() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

/// Reactor running on a background thread
pub struct TestServer {
    pub addrs: Vec<SocketAddr>,
    handle: ShutdownHandle,
    thread: Option<JoinHandle<hexkv::Result<Store>>>,
}

impl TestServer {
    pub fn start() -> Self {
        Self::with_config(Config::builder().listen_addr(loopback()))
    }

    pub fn with_config(builder: ConfigBuilder) -> Self {
        let config = builder.build();
        let store = Store::new(&config).unwrap();
        let mut reactor = Reactor::bind(&config, store).unwrap();
        let addrs = reactor.local_addrs().unwrap();
        let handle = reactor.shutdown_handle();

        let thread = thread::spawn(move || -> hexkv::Result<Store> {
            reactor.run()?;
            Ok(reactor.into_store())
        });

        Self {
            addrs,
            handle,
            thread: Some(thread),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addrs[0]
    }

    /// Stop the reactor and hand back its store
    pub fn stop(mut self) -> Store {
        self.handle.shutdown().unwrap();
        let thread = self.thread.take().unwrap();
        thread.join().unwrap().unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.handle.shutdown();
            let _ = thread.join();
        }
    }
}

/// Raw socket with a line reader on a cloned handle
pub struct RawConn {
    pub stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl RawConn {
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let reader = BufReader::new(stream.try_clone().unwrap());
        Self { stream, reader }
    }

    pub fn send(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).unwrap();
        self.stream.flush().unwrap();
    }

    /// Next reply line, terminator included
    pub fn recv(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        line
    }

    pub fn roundtrip(&mut self, line: &str) -> String {
        self.send(format!("{line}\r\n").as_bytes());
        self.recv()
    }
}
