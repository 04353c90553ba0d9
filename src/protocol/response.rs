//! Response definitions
//!
//! Represents replies sent back to clients.

/// A reply to one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// SET or DELETE succeeded
    Ok,

    /// SET on a key that is already present
    AlreadyExists,

    /// GET hit
    Value(Vec<u8>),

    /// GET or DELETE miss
    NoSuchKey,

    /// COUNT result
    Count(usize),

    /// EXIST hit
    True,

    /// EXIST miss
    False,

    /// Unparseable command or unmapped engine failure
    Error,
}

impl Response {
    pub fn from_bool(present: bool) -> Self {
        if present {
            Response::True
        } else {
            Response::False
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error)
    }
}
