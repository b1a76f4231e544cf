//! Session state carried by the memorizer from one step to the next.
//!
//! Everything here is transient: it is rebuilt from scratch by a reset (symbol `0`) and
//! never persisted. The learned structure itself lives in the `ColumnStore`.

use super::cell::{CellAddress, ColumnId, Permanence};
use fxhash::FxHashMap;

/// A predicted column together with the average permanence of the path that led to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub column: ColumnId,
    pub score: f64,
}

/// Collapses a prediction list to one entry per column, keeping the best score and the
/// order in which columns were first seen.
pub fn unique_columns(predictions: &[Prediction]) -> Vec<Prediction> {
    let mut index: FxHashMap<ColumnId, usize> = FxHashMap::default();
    let mut unique: Vec<Prediction> = Vec::with_capacity(predictions.len());

    for prediction in predictions {
        match index.get(&prediction.column) {
            Some(&i) => {
                if prediction.score > unique[i].score {
                    unique[i].score = prediction.score;
                }
            }
            None => {
                index.insert(prediction.column, unique.len());
                unique.push(*prediction);
            }
        }
    }

    unique
}

#[derive(Clone, Debug)]
pub struct ExecutionContext {
    /// The cell predictions propagate from; `None` right after a reset.
    pub last_learning_cell: Option<CellAddress>,

    /// The most recent symbol, `0` after a reset.
    pub last_active_column: ColumnId,

    /// True until the first non-zero symbol after a reset has been consumed.
    pub first_pattern: bool,

    /// Cells whose prediction shadow bit is currently set, in store order.
    pub predicted_cells: Vec<CellAddress>,

    /// Output of the latest step.
    pub predictions: Vec<Prediction>,

    /// Non-reset steps consumed since the last reset.
    pub steps_since_reset: u32,

    /// Running sum of the permanences traversed along the matched path.
    pub path_permanence: u64,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            last_learning_cell: None,
            last_active_column: 0,
            first_pattern: true,
            predicted_cells: Vec::new(),
            predictions: Vec::new(),
            steps_since_reset: 0,
            path_permanence: 0,
        }
    }
}

impl ExecutionContext {
    /// Returns the context to its post-reset values.
    pub fn reset(&mut self) {
        self.last_learning_cell = None;
        self.last_active_column = 0;
        self.first_pattern = true;
        self.predicted_cells.clear();
        self.predictions.clear();
        self.steps_since_reset = 0;
        self.path_permanence = 0;
    }

    /// Score of a candidate reached through a connection of `permanence`.
    pub fn path_score(&self, permanence: Permanence) -> f64 {
        let steps = self.steps_since_reset.max(1) as f64;
        (self.path_permanence + permanence as u64) as f64 / steps
    }
}
