//! Protocol Module
//!
//! Defines the text line protocol spoken between clients and the server.
//!
//! ## Request Format
//! ```text
//! <PREFIX><VERB> [arg] [arg]\r\n
//! ```
//! Tokens are separated by spaces; runs of spaces collapse. Verbs are
//! case-sensitive.
//!
//! ### Engine Prefixes
//! - (none): array
//! - `RB`: red-black tree
//! - `B`: B-tree
//! - `SH`: chained hash
//! - `DH`: dynamic hash
//! - `SK`: skiplist
//!
//! ### Verbs
//! - `SET key value`
//! - `GET key`
//! - `DELETE key`
//! - `COUNT`
//! - `EXIST key`
//!
//! ## Response Format
//! One line per request, terminated by `\r\n`:
//! - `OK`
//! - `ALREADY HAVE THIS KEY`
//! - `<value>` (GET hit)
//! - `NO SUCH KEY`
//! - `<decimal count>`
//! - `TRUE` / `FALSE`
//! - `ERROR COMMAND`

mod codec;
mod command;
mod response;

pub use codec::{
    decode_response, encode_command, encode_response, parse_command, read_response, split_line,
    write_command, LINE_TERMINATOR,
};
pub(crate) use codec::trim_terminator;
pub use command::{Command, Operation};
pub use response::Response;
