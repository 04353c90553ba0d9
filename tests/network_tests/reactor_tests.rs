//! Reactor Tests
//!
//! Framing, pipelining, failure isolation and connection bookkeeping.

use std::net::Shutdown;
use std::thread;
use std::time::Duration;

use hexkv::{Client, Config, EngineKind};

use crate::{loopback, RawConn, TestServer};

// =============================================================================
// Framing Tests
// =============================================================================

#[test]
fn test_message_split_across_writes() {
    let server = TestServer::start();
    let mut conn = RawConn::connect(server.addr());

    conn.send(b"SE");
    thread::sleep(Duration::from_millis(50));
    conn.send(b"T a 1");
    thread::sleep(Duration::from_millis(50));
    conn.send(b"\r\n");
    assert_eq!(conn.recv(), "OK\r\n");

    assert_eq!(conn.roundtrip("GET a"), "1\r\n");
}

#[test]
fn test_pipelined_requests_answered_in_order() {
    let server = TestServer::start();
    let mut conn = RawConn::connect(server.addr());

    conn.send(b"SET a 1\r\nSET b 2\r\nSET a 3\r\nGET a\r\nCOUNT\r\nBOGUS\r\n");
    assert_eq!(conn.recv(), "OK\r\n");
    assert_eq!(conn.recv(), "OK\r\n");
    assert_eq!(conn.recv(), "ALREADY HAVE THIS KEY\r\n");
    assert_eq!(conn.recv(), "1\r\n");
    assert_eq!(conn.recv(), "2\r\n");
    assert_eq!(conn.recv(), "ERROR COMMAND\r\n");
}

#[test]
fn test_overlong_line_rejected_then_skipped() {
    let server = TestServer::with_config(
        Config::builder()
            .listen_addr(loopback())
            .max_message_len(16),
    );
    let mut conn = RawConn::connect(server.addr());

    conn.send(&[b'x'; 40]);
    assert_eq!(conn.recv(), "ERROR COMMAND\r\n");

    // Remainder of the overlong line is dropped, the next line is served
    conn.send(b"yyyy\r\nCOUNT\r\n");
    assert_eq!(conn.recv(), "0\r\n");
}

#[test]
fn test_bare_newline_terminator_accepted() {
    let server = TestServer::start();
    let mut conn = RawConn::connect(server.addr());
    conn.send(b"SKSET k v\n");
    assert_eq!(conn.recv(), "OK\r\n");
}

#[test]
fn test_line_limit_ignores_terminator_style() {
    let server = TestServer::with_config(
        Config::builder()
            .listen_addr(loopback())
            .max_message_len(16),
    );
    let mut conn = RawConn::connect(server.addr());

    // 16-byte bodies fit, 17-byte bodies do not, whatever the terminator
    conn.send(b"SET abcdef 12345\n");
    assert_eq!(conn.recv(), "OK\r\n");
    conn.send(b"SET abcdefg 12345\n");
    assert_eq!(conn.recv(), "ERROR COMMAND\r\n");
    conn.send(b"SET abcdefg 12345\r\n");
    assert_eq!(conn.recv(), "ERROR COMMAND\r\n");
    assert_eq!(conn.roundtrip("COUNT"), "1\r\n");
}

// =============================================================================
// Connection Tests
// =============================================================================

#[test]
fn test_closed_peer_does_not_disturb_others() {
    let server = TestServer::start();
    let mut keeper = RawConn::connect(server.addr());
    assert_eq!(keeper.roundtrip("RBSET k v"), "OK\r\n");

    {
        let mut leaver = RawConn::connect(server.addr());
        leaver.send(b"RBGET k\r\n");
        // Dropped without reading the reply
    }
    thread::sleep(Duration::from_millis(50));

    assert_eq!(keeper.roundtrip("RBGET k"), "v\r\n");
}

#[test]
fn test_request_before_half_close_is_answered() {
    let server = TestServer::start();
    let mut conn = RawConn::connect(server.addr());

    conn.send(b"SET halfclose 1\r\n");
    conn.stream.shutdown(Shutdown::Write).unwrap();
    assert_eq!(conn.recv(), "OK\r\n");
    // Server closes once everything is answered
    assert_eq!(conn.recv(), "");

    let mut other = RawConn::connect(server.addr());
    assert_eq!(other.roundtrip("GET halfclose"), "1\r\n");
}

#[test]
fn test_pipelined_requests_before_half_close_are_answered() {
    let server = TestServer::start();
    let mut conn = RawConn::connect(server.addr());

    conn.send(b"RBSET a 1\r\nRBSET b 2\r\nRBCOUNT\r\n");
    conn.stream.shutdown(Shutdown::Write).unwrap();
    assert_eq!(conn.recv(), "OK\r\n");
    assert_eq!(conn.recv(), "OK\r\n");
    assert_eq!(conn.recv(), "2\r\n");
    assert_eq!(conn.recv(), "");
}

#[test]
fn test_unterminated_request_at_eof_is_answered() {
    let server = TestServer::start();
    let mut conn = RawConn::connect(server.addr());

    conn.send(b"SHSET tail v");
    conn.stream.shutdown(Shutdown::Write).unwrap();
    assert_eq!(conn.recv(), "OK\r\n");
    assert_eq!(conn.recv(), "");

    let store = server.stop();
    assert_eq!(store.engine(EngineKind::ChainedHash).get(b"tail"), Some(&b"v"[..]));
}

#[test]
fn test_connection_table_grows_past_one_block() {
    let server = TestServer::with_config(
        Config::builder()
            .listen_addr(loopback())
            .connection_block_size(2),
    );

    let mut conns: Vec<RawConn> = (0..7).map(|_| RawConn::connect(server.addr())).collect();
    for (i, conn) in conns.iter_mut().enumerate() {
        assert_eq!(conn.roundtrip(&format!("BSET k{i} v{i}")), "OK\r\n");
    }
    for (i, conn) in conns.iter_mut().enumerate().rev() {
        assert_eq!(conn.roundtrip(&format!("BGET k{i}")), format!("v{i}\r\n"));
    }
    drop(conns);

    let store = server.stop();
    assert_eq!(store.engine(EngineKind::BTree).count(), 7);
}

#[test]
fn test_connection_ids_recycled() {
    let server = TestServer::with_config(
        Config::builder()
            .listen_addr(loopback())
            .connection_block_size(2),
    );
    for i in 0..20 {
        let mut conn = RawConn::connect(server.addr());
        assert_eq!(conn.roundtrip(&format!("DHSET k{i} v")), "OK\r\n");
    }
    let mut conn = RawConn::connect(server.addr());
    assert_eq!(conn.roundtrip("DHCOUNT"), "20\r\n");
}

#[test]
fn test_multiple_listeners_share_one_store() {
    let server = TestServer::with_config(
        Config::builder().listen_addrs(vec![loopback(), loopback()]),
    );
    assert_eq!(server.addrs.len(), 2);
    assert_ne!(server.addrs[0].port(), server.addrs[1].port());

    let mut first = Client::connect(server.addrs[0]).unwrap();
    let mut second = Client::connect(server.addrs[1]).unwrap();
    first.set(EngineKind::ChainedHash, b"shared", b"yes").unwrap();
    assert_eq!(
        second.get(EngineKind::ChainedHash, b"shared").unwrap(),
        hexkv::protocol::Response::Value(b"yes".to_vec())
    );
}

#[test]
fn test_shutdown_returns_store() {
    let server = TestServer::start();
    let mut client = Client::connect(server.addr()).unwrap();
    client.set(EngineKind::SkipList, b"a", b"1").unwrap();
    client.set(EngineKind::Array, b"b", b"2").unwrap();

    let store = server.stop();
    assert_eq!(store.total_count(), 2);
}

#[test]
fn test_bind_conflict_is_reported() {
    let server = TestServer::start();
    let config = Config::builder().listen_addr(server.addr()).build();
    let store = hexkv::Store::new(&config).unwrap();
    assert!(hexkv::Reactor::bind(&config, store).is_err());
}
