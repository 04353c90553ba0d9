//! Command definitions
//!
//! Represents parsed client requests.

use crate::store::EngineKind;

/// Operation suffixes, in command table order
pub(crate) const SUFFIXES: [&str; 5] = ["SET", "GET", "DELETE", "COUNT", "EXIST"];

/// What to do against the selected engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Insert a new key
    Set { key: Vec<u8>, value: Vec<u8> },

    /// Look up a key
    Get { key: Vec<u8> },

    /// Remove a key
    Delete { key: Vec<u8> },

    /// Number of keys in the engine
    Count,

    /// Membership test
    Exist { key: Vec<u8> },
}

impl Operation {
    /// Verb suffix for this operation
    pub fn suffix(&self) -> &'static str {
        match self {
            Operation::Set { .. } => "SET",
            Operation::Get { .. } => "GET",
            Operation::Delete { .. } => "DELETE",
            Operation::Count => "COUNT",
            Operation::Exist { .. } => "EXIST",
        }
    }

    /// Arguments in wire order
    pub fn args(&self) -> Vec<&[u8]> {
        match self {
            Operation::Set { key, value } => vec![key.as_slice(), value.as_slice()],
            Operation::Get { key } | Operation::Delete { key } | Operation::Exist { key } => {
                vec![key.as_slice()]
            }
            Operation::Count => Vec::new(),
        }
    }
}

/// A parsed command: engine selector plus operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub engine: EngineKind,
    pub op: Operation,
}

impl Command {
    pub fn new(engine: EngineKind, op: Operation) -> Self {
        Self { engine, op }
    }

    /// Full verb, e.g. `RBSET`
    pub fn verb(&self) -> String {
        format!("{}{}", self.engine.prefix(), self.op.suffix())
    }
}
