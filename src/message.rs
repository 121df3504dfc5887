//! Broadcast line definitions
//!
//! Lines the registry synthesizes and fans out to every live connection.

use std::fmt;

use crate::connection::Connection;

/// Registry → all peers announcement
///
/// Rendered with `Display` into the exact text sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    /// A peer became ready: `peer joined: <addr>`
    Joined { peer: String },
    /// A peer sent a line: `<addr> says: <text>`
    Said { peer: String, text: String },
    /// A peer went away: `peer left: <addr>`
    Left { peer: String },
}

impl Announcement {
    pub fn joined(connection: &Connection) -> Self {
        Self::Joined {
            peer: connection.to_string(),
        }
    }

    pub fn said(connection: &Connection, text: String) -> Self {
        Self::Said {
            peer: connection.to_string(),
            text,
        }
    }

    pub fn left(connection: &Connection) -> Self {
        Self::Left {
            peer: connection.to_string(),
        }
    }
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Joined { peer } => write!(f, "peer joined: {peer}"),
            Self::Said { peer, text } => write!(f, "{peer} says: {text}"),
            Self::Left { peer } => write!(f, "peer left: {peer}"),
        }
    }
}
