//! Error types for the lattice engine

use crate::{BlockKind, Point};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LazorError {
    /// Misuse of the lattice mutation primitives. Never retried.
    #[error("Invalid placement at {position}: {reason}")]
    InvalidPlacement { position: Point, reason: String },

    /// A trace ran past its step ceiling (a ray trapped between blocks).
    #[error("Trace overrun: exceeded {limit} steps")]
    TraceOverrun { limit: usize },

    #[error("Invalid lattice: {0}")]
    InvalidLattice(String),

    #[error("Invalid direction ({dx}, {dy}): both components must be -1 or +1")]
    InvalidDirection { dx: i32, dy: i32 },

    /// Taking a block the inventory no longer holds.
    #[error("No {kind} blocks left")]
    InventoryExhausted { kind: BlockKind },

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LazorError {
    pub(crate) fn invalid_placement(position: Point, reason: impl Into<String>) -> Self {
        Self::InvalidPlacement {
            position,
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LazorError>;
