use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a connection pair inside a session.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct PairIndex(pub usize);

impl PairIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for PairIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pair-{}", self.0)
    }
}

/// Side of a connection pair. Every pair has exactly one of each.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Creates the control channel and the offer; carries the local media.
    Offerer,
    /// Answers the offer and receives the remote media.
    Answerer,
}

impl Role {
    pub const BOTH: [Role; 2] = [Role::Offerer, Role::Answerer];

    pub fn sibling(self) -> Self {
        match self {
            Role::Offerer => Role::Answerer,
            Role::Answerer => Role::Offerer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Offerer => f.write_str("offerer"),
            Role::Answerer => f.write_str("answerer"),
        }
    }
}
