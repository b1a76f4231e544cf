//! A `Column` represents one input symbol. It holds an ordered, growable sequence of cells,
//! each tracking a distinct context in which the symbol was seen.
//!
//! Biological inspiration:
//! Columns are inspired by cortical mini-columns. All cells of a column share the same
//! feed-forward input (the symbol), while their distal connections encode temporal context.
//!
//! The `ColumnStore` is the arena that owns every column, keyed by column ID (ID `0` is reserved
//! and never stored). Only touched columns take memory. The logical table size is the highest ID
//! ever reserved; IDs below it that were skipped over stay unallocated. The table never shrinks.

use super::cell::{Cell, CellAddress, ColumnId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Represents a column, which is a group of cells in depth order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

/// Lazily growing, sparse table of columns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnStore {
    columns: BTreeMap<ColumnId, Column>,
    table_size: usize,
}

impl ColumnStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of column slots, allocated or not.
    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Grows the table so that `id` has a slot. Skipped slots stay unallocated.
    pub fn reserve_id(&mut self, id: ColumnId) {
        self.table_size = self.table_size.max(id as usize);
    }

    /// Returns the column for `id` if it has been allocated.
    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(&id)
    }

    pub fn column_mut(&mut self, id: ColumnId) -> Option<&mut Column> {
        self.columns.get_mut(&id)
    }

    /// True if `id` has an allocated column holding at least one cell.
    pub fn has_cells(&self, id: ColumnId) -> bool {
        self.column(id).is_some_and(|c| !c.is_empty())
    }

    /// Returns the column for `id`, growing the table and allocating the column on first touch.
    /// Callers must never pass the reserved ID `0`.
    pub fn allocate(&mut self, id: ColumnId) -> &mut Column {
        debug_assert!(id != 0, "column 0 is the reset symbol and is never stored");
        self.reserve_id(id);
        self.columns.entry(id).or_insert_with(|| {
            tracing::debug!(column = id, "allocating column");
            Column::default()
        })
    }

    /// Places `column` at `id`, growing the table if needed, and returns the column it replaced.
    pub fn insert(&mut self, id: ColumnId, column: Column) -> Option<Column> {
        debug_assert!(id != 0, "column 0 is the reset symbol and is never stored");
        self.reserve_id(id);
        self.columns.insert(id, column)
    }

    /// Appends `cell` to column `id` (allocating it if needed) and returns the new cell's address.
    pub fn push_cell(&mut self, id: ColumnId, cell: Cell) -> CellAddress {
        let column = self.allocate(id);
        column.cells.push(cell);
        CellAddress::new(id, column.cells.len() - 1)
    }

    pub fn cell(&self, addr: CellAddress) -> Option<&Cell> {
        self.column(addr.column)?.cells.get(addr.depth)
    }

    pub fn cell_mut(&mut self, addr: CellAddress) -> Option<&mut Cell> {
        self.column_mut(addr.column)?.cells.get_mut(addr.depth)
    }

    pub fn contains(&self, addr: CellAddress) -> bool {
        self.cell(addr).is_some()
    }

    /// Iterates over allocated columns in ascending ID order.
    pub fn columns(&self) -> impl Iterator<Item = (ColumnId, &Column)> {
        self.columns.iter().map(|(&id, column)| (id, column))
    }

    /// Iterates over every cell in store order: ascending column ID, then depth.
    pub fn cells(&self) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.columns().flat_map(|(id, column)| {
            column
                .cells
                .iter()
                .enumerate()
                .map(move |(depth, cell)| (CellAddress::new(id, depth), cell))
        })
    }

    /// Visits every cell mutably in store order.
    pub fn for_each_cell_mut(&mut self, mut f: impl FnMut(CellAddress, &mut Cell)) {
        for (&id, column) in self.columns.iter_mut() {
            for (depth, cell) in column.cells.iter_mut().enumerate() {
                f(CellAddress::new(id, depth), cell);
            }
        }
    }

    /// Total number of cells across all columns.
    pub fn cell_count(&self) -> usize {
        self.columns.values().map(Column::len).sum()
    }

    /// Returns the first connection whose destination is not an existing cell, as
    /// `(owner, destination)`.
    pub fn find_dangling(&self) -> Option<(CellAddress, CellAddress)> {
        self.cells().find_map(|(addr, cell)| {
            cell.connection
                .filter(|conn| !self.contains(conn.destination))
                .map(|conn| (addr, conn.destination))
        })
    }
}
