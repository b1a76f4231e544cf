//! A `Cell` is one instance of a column, used to track a distinct context in which the column's
//! symbol occurred. Each cell owns at most one outgoing `Connection` pointing back at the cell that
//! was learning when this one was created (its temporal predecessor).
//!
//! If the connection's permanence is at or above the connect threshold, the connection is considered
//! "live": whenever its destination becomes the learning cell, this cell is predicted.
//! During learning, permanence is increased on correct predictions and decreased on incorrect ones.
//! All permanence arithmetic saturates at `MAX_PERMANENCE` and floors at zero.
//!
//! Cells are stored in an arena of columns and addressed by `CellAddress` (column ID + depth),
//! so connections hold plain addresses instead of references.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a column (one input symbol). `0` is the reset/separator symbol and never stored.
pub type ColumnId = u32;

/// Synaptic strength of a connection.
pub type Permanence = u16;

/// Upper bound of every permanence value.
pub const MAX_PERMANENCE: Permanence = Permanence::MAX;

/// Represents an address that uniquely identifies a cell by its column ID and depth within the column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    pub column: ColumnId,
    pub depth: usize,
}

impl CellAddress {
    pub fn new(column: ColumnId, depth: usize) -> Self {
        Self { column, depth }
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.column, self.depth)
    }
}

/// Bitmask of a cell's current and previous-step states.
///
/// The `WAS_*` bits are shadow copies for the prior time step and drive the
/// transition logic of the current step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellState(u8);

impl CellState {
    pub const ACTIVE: u8 = 0x01;
    pub const PREDICTING: u8 = 0x02;
    pub const LEARNING: u8 = 0x04;
    pub const WAS_ACTIVE: u8 = 0x10;
    pub const WAS_PREDICTING: u8 = 0x20;
    pub const WAS_LEARNING: u8 = 0x40;

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    #[inline]
    pub fn set(&mut self, flag: u8, value: bool) {
        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

/// A directed, weighted link from a cell to its temporal predecessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// The predecessor cell.
    pub destination: CellAddress,

    /// Represents the strength of the link. Zero means the link is forgotten.
    pub permanence: Permanence,
}

impl Connection {
    pub fn new(destination: CellAddress, permanence: Permanence) -> Self {
        Self {
            destination,
            permanence,
        }
    }

    /// A connection is live once it reaches the threshold. A forgotten (zero) connection never is,
    /// whatever the threshold.
    #[inline]
    pub fn is_live(&self, connect_threshold: Permanence) -> bool {
        self.permanence > 0 && self.permanence >= connect_threshold
    }

    /// Raises permanence by `amount`, saturating at `MAX_PERMANENCE`.
    #[inline]
    pub fn reinforce(&mut self, amount: Permanence) {
        self.permanence = self.permanence.saturating_add(amount);
    }

    /// Lowers permanence by `amount`, flooring at zero.
    /// Returns true if this call drove the connection to zero.
    #[inline]
    pub fn weaken(&mut self, amount: Permanence) -> bool {
        if amount == 0 || self.permanence == 0 {
            return false;
        }
        self.permanence = self.permanence.saturating_sub(amount);
        self.permanence == 0
    }
}

/// A single cell of a column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub state: CellState,
    pub connection: Option<Connection>,
}

impl Cell {
    /// A cell with no outgoing connection, as created for the first pattern after a reset.
    pub fn unconnected() -> Self {
        Self::default()
    }

    pub fn connected(destination: CellAddress, permanence: Permanence) -> Self {
        Self {
            state: CellState::default(),
            connection: Some(Connection::new(destination, permanence)),
        }
    }

    #[inline]
    pub fn was_predicting(&self) -> bool {
        self.state.contains(CellState::WAS_PREDICTING)
    }

    #[inline]
    pub fn set_was_predicting(&mut self, value: bool) {
        self.state.set(CellState::WAS_PREDICTING, value);
    }

    /// Returns the permanence of the outgoing connection, or zero if there is none.
    #[inline]
    pub fn permanence(&self) -> Permanence {
        self.connection.map_or(0, |c| c.permanence)
    }

    /// True if this cell's connection is live and points at `target`.
    #[inline]
    pub fn predicts_from(&self, target: CellAddress, connect_threshold: Permanence) -> bool {
        self.connection
            .is_some_and(|c| c.destination == target && c.is_live(connect_threshold))
    }
}
