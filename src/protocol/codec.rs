//! Protocol codec
//!
//! Tokenizing, dispatch-table lookup and response rendering for the line
//! protocol.
//!
//! ## Framing
//! A message ends at the first `\n`; an optional `\r` before it is dropped.
//! TCP may deliver a message across several reads, so receive buffers are
//! drained with `split_line`, which leaves any unterminated tail in place.

use std::io::{BufRead, Write};

use bytes::BytesMut;

use super::command::SUFFIXES;
use super::{Command, Operation, Response};
use crate::error::{HexError, Result};
use crate::store::EngineKind;

/// Terminator appended to every response and emitted command
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

const OK: &[u8] = b"OK";
const ALREADY_EXISTS: &[u8] = b"ALREADY HAVE THIS KEY";
const NO_SUCH_KEY: &[u8] = b"NO SUCH KEY";
const TRUE: &[u8] = b"TRUE";
const FALSE: &[u8] = b"FALSE";
const ERROR: &[u8] = b"ERROR COMMAND";

// =============================================================================
// Framing
// =============================================================================

/// Detach one complete line (terminator included) from the front of `buf`
pub fn split_line(buf: &mut BytesMut) -> Option<BytesMut> {
    let end = buf.iter().position(|&b| b == b'\n')?;
    Some(buf.split_to(end + 1))
}

/// Strip a trailing `\n` or `\r\n`
pub(crate) fn trim_terminator(mut line: &[u8]) -> &[u8] {
    if let Some(rest) = line.strip_suffix(b"\n") {
        line = rest;
    }
    if let Some(rest) = line.strip_suffix(b"\r") {
        line = rest;
    }
    line
}

// =============================================================================
// Command Parsing/Encoding
// =============================================================================

/// Parse one request line
///
/// The verb is matched against every prefix/suffix pair; the argument count
/// must match the operation exactly.
pub fn parse_command(line: &[u8]) -> Result<Command> {
    let line = trim_terminator(line);
    let mut tokens = line.split(|&b| b == b' ').filter(|t| !t.is_empty());

    let verb = tokens
        .next()
        .ok_or_else(|| HexError::Protocol("empty command".to_string()))?;
    let (engine, suffix) = split_verb(verb)?;
    let args: Vec<&[u8]> = tokens.collect();

    let op = match (suffix, args.as_slice()) {
        ("SET", [key, value]) => Operation::Set {
            key: key.to_vec(),
            value: value.to_vec(),
        },
        ("GET", [key]) => Operation::Get { key: key.to_vec() },
        ("DELETE", [key]) => Operation::Delete { key: key.to_vec() },
        ("COUNT", []) => Operation::Count,
        ("EXIST", [key]) => Operation::Exist { key: key.to_vec() },
        _ => {
            return Err(HexError::Protocol(format!(
                "{}: wrong number of arguments ({})",
                String::from_utf8_lossy(verb),
                args.len()
            )))
        }
    };

    Ok(Command { engine, op })
}

/// Resolve a verb into its engine and operation suffix
fn split_verb(verb: &[u8]) -> Result<(EngineKind, &'static str)> {
    for kind in EngineKind::ALL {
        let Some(rest) = verb.strip_prefix(kind.prefix().as_bytes()) else {
            continue;
        };
        if let Some(suffix) = SUFFIXES.iter().find(|s| s.as_bytes() == rest) {
            return Ok((kind, *suffix));
        }
    }
    Err(HexError::Protocol(format!(
        "unknown command: {}",
        String::from_utf8_lossy(verb)
    )))
}

/// Render a command as a request line
///
/// Fails if an argument is empty or would break tokenization.
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    let mut line = command.verb().into_bytes();
    for arg in command.op.args() {
        if arg.is_empty() || arg.iter().any(|&b| b == b' ' || b == b'\r' || b == b'\n') {
            return Err(HexError::InvalidArgument(format!(
                "argument {:?} cannot be sent on the line protocol",
                String::from_utf8_lossy(arg)
            )));
        }
        line.push(b' ');
        line.extend_from_slice(arg);
    }
    line.extend_from_slice(LINE_TERMINATOR);
    Ok(line)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Render a response line
pub fn encode_response(response: &Response) -> Vec<u8> {
    let mut line = match response {
        Response::Ok => OK.to_vec(),
        Response::AlreadyExists => ALREADY_EXISTS.to_vec(),
        Response::Value(value) => value.clone(),
        Response::NoSuchKey => NO_SUCH_KEY.to_vec(),
        Response::Count(n) => n.to_string().into_bytes(),
        Response::True => TRUE.to_vec(),
        Response::False => FALSE.to_vec(),
        Response::Error => ERROR.to_vec(),
    };
    line.extend_from_slice(LINE_TERMINATOR);
    line
}

/// Parse a response line in the context of the operation that produced it
///
/// The operation disambiguates a GET value from the fixed reply strings.
pub fn decode_response(line: &[u8], op: &Operation) -> Result<Response> {
    let body = trim_terminator(line);
    if body == ERROR {
        return Ok(Response::Error);
    }

    let response = match op {
        Operation::Set { .. } if body == OK => Response::Ok,
        Operation::Set { .. } if body == ALREADY_EXISTS => Response::AlreadyExists,
        Operation::Delete { .. } if body == OK => Response::Ok,
        Operation::Get { .. } | Operation::Delete { .. } if body == NO_SUCH_KEY => {
            Response::NoSuchKey
        }
        Operation::Get { .. } => Response::Value(body.to_vec()),
        Operation::Count => std::str::from_utf8(body)
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Response::Count)
            .ok_or_else(|| unexpected(body, op))?,
        Operation::Exist { .. } if body == TRUE => Response::True,
        Operation::Exist { .. } if body == FALSE => Response::False,
        _ => return Err(unexpected(body, op)),
    };
    Ok(response)
}

fn unexpected(body: &[u8], op: &Operation) -> HexError {
    HexError::Protocol(format!(
        "unexpected {} response: {:?}",
        op.suffix(),
        String::from_utf8_lossy(body)
    ))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a command line to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let line = encode_command(command)?;
    writer.write_all(&line)?;
    writer.flush()?;
    Ok(())
}

/// Read one response line for `op` from a stream
///
/// Blocks until a full line arrives.
pub fn read_response<R: BufRead>(reader: &mut R, op: &Operation) -> Result<Response> {
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line)?;
    if n == 0 || line.last() != Some(&b'\n') {
        return Err(HexError::Network(
            "connection closed before a full response arrived".to_string(),
        ));
    }
    decode_response(&line, op)
}
