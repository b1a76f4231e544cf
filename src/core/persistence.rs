//! Persistence of a `SequenceMemory`: the learned store plus its learning parameters.
//!
//! Two encodings are supported:
//! - **Text** - a line-oriented format meant to be inspected and diffed:
//!
//! ```text
//! ICP:<initial permanence>
//! MPC:<connect threshold>
//! PDV:<permanence decrement>
//! PIV:<permanence increment>
//! MCS:<column table size>
//! **********
//! <column ID>:[<state>:<dest column>:<dest depth>:<permanence>][...]
//! ```
//!
//!   One line per non-empty column, one bracketed record per cell in depth order. The destination
//!   fields are empty for a cell without a connection.
//! - **Binary** - a compact bincode snapshot of the same data.
//!
//! Restoring either encoding replaces the whole store and finishes with a frozen reset, so no
//! session state survives a load. A snapshot is decoded completely before it replaces anything.

use super::cell::{Cell, CellAddress, CellState, ColumnId, Connection, Permanence};
use super::column::{Column, ColumnStore};
use super::sequence_memory::{LearningLevel, SequenceMemory, SequenceMemoryParams};
use crate::error::{AsmError, Result};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{error, info, warn};

/// Line that closes the header block.
pub const HEADER_SEPARATOR: &str = "**********";

const KEY_INITIAL_PERMANENCE: &str = "ICP";
const KEY_CONNECT_THRESHOLD: &str = "MPC";
const KEY_PERMANENCE_DECREMENT: &str = "PDV";
const KEY_PERMANENCE_INCREMENT: &str = "PIV";
const KEY_COLUMN_TABLE_SIZE: &str = "MCS";

#[derive(Serialize)]
struct SnapshotRef<'a> {
    params: &'a SequenceMemoryParams,
    store: &'a ColumnStore,
}

#[derive(Deserialize)]
struct Snapshot {
    params: SequenceMemoryParams,
    store: ColumnStore,
}

impl SequenceMemory {
    /// Writes the text encoding of the store and parameters.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let params = &self.params;
        writeln!(writer, "{KEY_INITIAL_PERMANENCE}:{}", params.initial_permanence)?;
        writeln!(writer, "{KEY_CONNECT_THRESHOLD}:{}", params.connect_threshold)?;
        writeln!(writer, "{KEY_PERMANENCE_DECREMENT}:{}", params.permanence_decrement)?;
        writeln!(writer, "{KEY_PERMANENCE_INCREMENT}:{}", params.permanence_increment)?;
        writeln!(writer, "{KEY_COLUMN_TABLE_SIZE}:{}", self.store.table_size())?;
        writeln!(writer, "{HEADER_SEPARATOR}")?;

        for (id, column) in self.store.columns().filter(|(_, c)| !c.is_empty()) {
            write!(writer, "{id}:")?;
            for cell in &column.cells {
                let state = cell.state.bits();
                match cell.connection {
                    Some(conn) => write!(
                        writer,
                        "[{state}:{}:{}:{}]",
                        conn.destination.column, conn.destination.depth, conn.permanence
                    )?,
                    None => write!(writer, "[{state}:::0]")?,
                }
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Replaces the store and parameters with the text encoding read from `reader`.
    ///
    /// On error the memorizer is left exactly as it was.
    pub fn read_from<R: BufRead>(&mut self, reader: R) -> Result<()> {
        let (params, store) = decode_text(reader)?;
        self.install(params, store);
        Ok(())
    }

    /// Writes the text encoding to `path`, replacing any existing file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    /// Saves to `path` and reports success. A failed save may leave a partial file behind.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = path.as_ref();
        match self.save_to_file(path) {
            Ok(()) => {
                info!(path = %path.display(), cells = self.store.cell_count(), "saved memory");
                true
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to save memory");
                false
            }
        }
    }

    /// Loads the text encoding from `path`.
    ///
    /// - A file that cannot be opened means there is nothing to load yet: `Ok(false)`.
    /// - A malformed file is an error if `throw_on_error` is set; otherwise it is logged and
    ///   reported as `Ok(false)`.
    /// - `Ok(true)` once the store has been replaced.
    pub fn load<P: AsRef<Path>>(&mut self, path: P, throw_on_error: bool) -> Result<bool> {
        let path = path.as_ref();

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "no memory to load");
                return Ok(false);
            }
        };

        match self.read_from(BufReader::new(file)) {
            Ok(()) => {
                info!(path = %path.display(), cells = self.store.cell_count(), "loaded memory");
                Ok(true)
            }
            Err(e) if throw_on_error => Err(e),
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load memory");
                Ok(false)
            }
        }
    }

    /// Encodes the store and parameters as a bincode snapshot.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let snapshot = SnapshotRef {
            params: &self.params,
            store: &self.store,
        };
        Ok(bincode::serialize(&snapshot)?)
    }

    /// Restores a memorizer from a bincode snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = bincode::deserialize(bytes)?;

        if let Some((from, to)) = snapshot.store.find_dangling() {
            return Err(AsmError::DanglingConnection { from, to });
        }

        let mut memory = SequenceMemory::new(snapshot.params);
        memory.install(snapshot.params, snapshot.store);
        Ok(memory)
    }

    fn install(&mut self, params: SequenceMemoryParams, store: ColumnStore) {
        self.params = params;
        self.store = store;
        self.step(0, LearningLevel::Frozen);
    }
}

/// Parses a whole text snapshot.
fn decode_text<R: BufRead>(reader: R) -> Result<(SequenceMemoryParams, ColumnStore)> {
    let mut params = SequenceMemoryParams::default();
    let mut table_size = 0usize;
    let mut store = ColumnStore::new();
    let mut column_lines: FxHashMap<ColumnId, usize> = FxHashMap::default();
    let mut in_header = true;
    let mut last_line = 0;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        last_line = line_no;
        let line = line?;
        let line = line.trim_end();

        if in_header {
            if line == HEADER_SEPARATOR {
                in_header = false;
            } else {
                parse_header_line(line_no, line, &mut params, &mut table_size)?;
            }
            continue;
        }

        if line.is_empty() {
            continue;
        }

        let (id, column) = parse_column_line(line_no, line)?;
        if let Some(&first) = column_lines.get(&id) {
            return Err(AsmError::malformed(
                line_no,
                format!("column {id} already defined at line {first}"),
            ));
        }
        column_lines.insert(id, line_no);
        store.insert(id, column);
    }

    if in_header {
        return Err(AsmError::malformed(
            last_line + 1,
            format!("missing header separator '{HEADER_SEPARATOR}'"),
        ));
    }

    if table_size > 0 {
        store.reserve_id(table_size as ColumnId);
    }

    if let Some((from, to)) = store.find_dangling() {
        let line_no = column_lines.get(&from.column).copied().unwrap_or(last_line);
        return Err(AsmError::malformed(
            line_no,
            format!("cell {from} connects to missing cell {to}"),
        ));
    }

    Ok((params, store))
}

fn parse_header_line(
    line_no: usize,
    line: &str,
    params: &mut SequenceMemoryParams,
    table_size: &mut usize,
) -> Result<()> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| AsmError::malformed(line_no, format!("missing ':' in header line '{line}'")))?;

    match key.trim() {
        KEY_INITIAL_PERMANENCE => params.initial_permanence = parse_field(line_no, key, value)?,
        KEY_CONNECT_THRESHOLD => params.connect_threshold = parse_field(line_no, key, value)?,
        KEY_PERMANENCE_DECREMENT => params.permanence_decrement = parse_field(line_no, key, value)?,
        KEY_PERMANENCE_INCREMENT => params.permanence_increment = parse_field(line_no, key, value)?,
        KEY_COLUMN_TABLE_SIZE => {
            *table_size = parse_field(line_no, key, value)?;
            if *table_size > ColumnId::MAX as usize {
                return Err(AsmError::malformed(
                    line_no,
                    format!("column table size {table_size} is out of range"),
                ));
            }
        }
        other => {
            return Err(AsmError::malformed(
                line_no,
                format!("unknown header key '{other}'"),
            ))
        }
    }

    Ok(())
}

/// Parses `<id>:[record][record]...`.
fn parse_column_line(line_no: usize, line: &str) -> Result<(ColumnId, Column)> {
    let (id, mut rest) = line
        .split_once(':')
        .ok_or_else(|| AsmError::malformed(line_no, "missing ':' after column ID"))?;

    let id: ColumnId = parse_field(line_no, "column ID", id)?;
    if id == 0 {
        return Err(AsmError::malformed(line_no, "column 0 is reserved"));
    }

    let mut column = Column::default();

    while !rest.is_empty() {
        let body = rest
            .strip_prefix('[')
            .ok_or_else(|| AsmError::malformed(line_no, "expected '[' to open a cell record"))?;
        let (record, tail) = body
            .split_once(']')
            .ok_or_else(|| AsmError::malformed(line_no, "missing ']' to close a cell record"))?;
        column.cells.push(parse_cell_record(line_no, record)?);
        rest = tail;
    }

    if column.is_empty() {
        return Err(AsmError::malformed(
            line_no,
            format!("column {id} has no cell records"),
        ));
    }

    Ok((id, column))
}

/// Parses `state:destColumn:destDepth:permanence`.
fn parse_cell_record(line_no: usize, record: &str) -> Result<Cell> {
    let fields: Vec<&str> = record.split(':').collect();
    let [state, dest_column, dest_depth, permanence] = fields.as_slice() else {
        return Err(AsmError::malformed(
            line_no,
            format!("expected 4 fields in cell record '[{record}]'"),
        ));
    };

    let state: u8 = parse_field(line_no, "state", state)?;
    let permanence: Permanence = parse_field(line_no, "permanence", permanence)?;

    let connection = match (dest_column.is_empty(), dest_depth.is_empty()) {
        (true, true) => None,
        (false, false) => {
            let destination = CellAddress::new(
                parse_field(line_no, "destination column", dest_column)?,
                parse_field(line_no, "destination depth", dest_depth)?,
            );
            Some(Connection::new(destination, permanence))
        }
        _ => {
            return Err(AsmError::malformed(
                line_no,
                format!("incomplete destination in cell record '[{record}]'"),
            ))
        }
    };

    Ok(Cell {
        state: CellState::from_bits(state),
        connection,
    })
}

fn parse_field<T: FromStr>(line_no: usize, name: &str, value: &str) -> Result<T> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AsmError::malformed(line_no, format!("missing value for {name}")));
    }
    value
        .parse()
        .map_err(|_| AsmError::malformed(line_no, format!("invalid {name} '{value}'")))
}
