//! The `SequenceMemory` module implements the adaptive sequence memorizer: it learns which symbol
//! follows which context and predicts the symbols likely to come next.
//!
//! Column:
//! - The set of cells representing one input symbol ID.
//! - Columns are created lazily the first time their symbol is learned.
//!
//! Cell:
//! - One instance of a column, tracking a distinct context in which the symbol occurred.
//! - Each cell owns at most one connection to its temporal predecessor.
//!
//! Connection:
//! - A directed link from a cell to the cell that was learning when it was created.
//! - Its permanence grows on correct predictions and shrinks on incorrect ones.
//!
//! Learning cell:
//! - The cell that represents the current symbol in the current context.
//! - Every cell whose live connection points at the learning cell is predicted for the next step.
//!
//! Bursting:
//! - When a symbol arrives that no cell predicted, the column bursts.
//! - Under full learning a new cell is grown, connected to the current learning cell.
//! - The learning cell only moves on a correct prediction, so a chain of novel symbols all attach to
//!   the same predecessor and the sequence is refined over repeated replays.
//!
//! How It Works:
//! - The memorizer processes one symbol per step. Symbol `0` separates sequences and resets the session.
//! - The first symbol after a reset selects the column's first cell as the learning cell.
//! - Every later symbol either matches a cell predicted by the previous step (activate) or bursts.
//! - On activation the matched connection is rewarded and every other pending prediction is punished.
//! - Predictions are scored with the average permanence of the path walked since the last reset.

use super::cell::{Cell, CellAddress, ColumnId, Permanence};
use super::column::ColumnStore;
use super::context::{ExecutionContext, Prediction};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::mem;
use tracing::{debug, trace, warn};

/// Controls how much a step is allowed to change the store, ordered by permissiveness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LearningLevel {
    /// Pure prediction. No structural or weight changes.
    Frozen,
    /// Weight changes only. No new cells or connections.
    AwardAndPunish,
    /// Weight changes plus growth of new cells and connections.
    Full,
}

impl LearningLevel {
    #[inline]
    pub fn adapts_weights(self) -> bool {
        self >= LearningLevel::AwardAndPunish
    }

    #[inline]
    pub fn grows(self) -> bool {
        self == LearningLevel::Full
    }
}

/// Holds the parameters governing connection creation and permanence learning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceMemoryParams {
    /// Permanence of a freshly grown connection.
    pub initial_permanence: Permanence,
    /// Minimum permanence for a connection to take part in prediction.
    pub connect_threshold: Permanence,
    /// Reward applied to a correctly predicting connection.
    pub permanence_increment: Permanence,
    /// Punishment applied to incorrectly predicting connections. Zero disables punishment.
    pub permanence_decrement: Permanence,
}

impl Default for SequenceMemoryParams {
    fn default() -> Self {
        Self {
            initial_permanence: 500,
            connect_threshold: 499,
            permanence_increment: 100,
            permanence_decrement: 1,
        }
    }
}

/// What a non-reset step does with its column.
enum Action {
    FirstPattern,
    Activate(CellAddress),
    Burst,
}

/// Implements the adaptive sequence memorizer.
///
/// The memorizer owns the learned `ColumnStore` and the transient `ExecutionContext`.
/// It is single-threaded and synchronous; every call runs to completion.
#[derive(Clone, Debug)]
pub struct SequenceMemory {
    pub(crate) store: ColumnStore,
    pub(crate) params: SequenceMemoryParams,
    pub(crate) context: ExecutionContext,
}

impl Default for SequenceMemory {
    fn default() -> Self {
        Self::new(SequenceMemoryParams::default())
    }
}

impl SequenceMemory {
    /// Constructs an empty memorizer.
    pub fn new(params: SequenceMemoryParams) -> Self {
        if params.initial_permanence < params.connect_threshold {
            warn!(
                initial = params.initial_permanence,
                threshold = params.connect_threshold,
                "new connections start below the connect threshold"
            );
        }

        Self {
            store: ColumnStore::new(),
            params,
            context: ExecutionContext::default(),
        }
    }

    /// Executes one step of the memorizer and returns the predictions for the next symbol.
    ///
    /// - Symbol `0` resets the session and yields no predictions.
    /// - Under `Frozen`, a symbol whose column holds no cells yields no predictions and touches no state;
    ///   the previous step's predictions stay available through `predictions`.
    /// - Otherwise the column is allocated if needed and one of the following happens:
    ///   - **FirstPattern:** the first symbol after a reset propagates predictions from its column's cells.
    ///   - **Activate:** a cell of the column was predicted by the previous step; it is rewarded and becomes the learning cell.
    ///   - **Burst:** nothing predicted the column; under `Full` a new cell is grown.
    #[inline]
    pub fn step(&mut self, symbol: ColumnId, level: LearningLevel) -> &[Prediction] {
        if symbol == 0 {
            self.reset();
            return &self.context.predictions;
        }

        if level == LearningLevel::Frozen && !self.store.has_cells(symbol) {
            trace!(symbol, "frozen step on unseen column");
            return &[];
        }

        self.context.predictions.clear();

        if level != LearningLevel::Frozen {
            self.store.allocate(symbol);
        }

        self.context.steps_since_reset += 1;

        let action = if self.context.first_pattern {
            Action::FirstPattern
        } else {
            match self.find_predicted_cell(symbol) {
                Some(addr) => Action::Activate(addr),
                None => Action::Burst,
            }
        };

        match action {
            Action::FirstPattern => self.enter_first_pattern(symbol, level),
            Action::Activate(addr) => self.activate_predicted_cell(addr, level),
            Action::Burst => self.burst_column(symbol, level),
        }

        self.context.last_active_column = symbol;

        trace!(
            symbol,
            ?level,
            predicted = self.context.predictions.len(),
            "step"
        );

        &self.context.predictions
    }

    /// Drives the memorizer from a producer of symbols and returns the last prediction set.
    ///
    /// A reset step is issued first. The loop ends when the producer is exhausted or after
    /// `max_steps` symbols, whichever comes first; `None` means no step limit.
    pub fn run<I>(
        &mut self,
        producer: I,
        max_steps: Option<usize>,
        level: LearningLevel,
    ) -> Vec<Prediction>
    where
        I: IntoIterator<Item = ColumnId>,
    {
        self.step(0, level);

        let limit = max_steps.unwrap_or(usize::MAX);
        let mut consumed = 0usize;
        let mut last = Vec::new();

        for symbol in producer.into_iter().take(limit) {
            let predictions = self.step(symbol, level);
            last.clear();
            last.extend_from_slice(predictions);
            consumed += 1;
        }

        debug!(steps = consumed, cells = self.store.cell_count(), "run finished");

        last
    }

    /// Applies an external reward or punishment to the cells predicted by the last step.
    ///
    /// - `score == 0`: rewards `column`'s predicted cell and punishes every other predicted cell.
    /// - `score > 0`: rewards only `column`'s predicted cell, scaled by `min(score, 2)`.
    /// - `score < 0`: punishes every predicted cell except `column`'s, scaled by `min(-score, 2)`.
    ///
    /// Scaled amounts are truncated toward zero, so a factor that scales a step below one unit
    /// leaves permanences unchanged.
    ///
    /// Column `0` names no target: a positive score does nothing and a non-positive one punishes
    /// every predicted cell. A non-zero column with no predicted cell is ignored.
    pub fn feedback(&mut self, column: ColumnId, score: f32) {
        let has_target = self
            .context
            .predicted_cells
            .iter()
            .any(|addr| addr.column == column);

        if column != 0 && !has_target {
            trace!(column, "feedback target is not predicted");
            return;
        }

        let increment = self.params.permanence_increment;
        let decrement = self.params.permanence_decrement;
        let predicted = mem::take(&mut self.context.predicted_cells);

        match score.partial_cmp(&0.0) {
            Some(Ordering::Equal) => {
                for &addr in &predicted {
                    if addr.column == column {
                        self.reinforce_cell(addr, increment);
                    } else {
                        self.weaken_cell(addr, decrement);
                    }
                }
            }
            Some(Ordering::Greater) => {
                let amount = scale(increment, score);
                for &addr in predicted.iter().filter(|addr| addr.column == column) {
                    self.reinforce_cell(addr, amount);
                }
            }
            Some(Ordering::Less) => {
                let amount = scale(decrement, -score);
                for &addr in predicted.iter().filter(|addr| addr.column != column) {
                    self.weaken_cell(addr, amount);
                }
            }
            None => warn!(column, "ignoring feedback with a NaN score"),
        }

        self.context.predicted_cells = predicted;
    }

    /// Clears the session: learning cell, pending predictions and path statistics.
    /// Prediction shadow bits are cleared across the whole store, so no stale prediction survives.
    pub fn reset(&mut self) {
        self.store
            .for_each_cell_mut(|_, cell| cell.set_was_predicting(false));
        self.context.reset();
    }

    /// Returns the first cell of the column whose prediction shadow bit is set.
    fn find_predicted_cell(&self, symbol: ColumnId) -> Option<CellAddress> {
        self.store
            .column(symbol)?
            .cells
            .iter()
            .position(Cell::was_predicting)
            .map(|depth| CellAddress::new(symbol, depth))
    }

    /// Handles the first symbol after a reset:
    /// - Grows a first cell if the column is empty and growth is allowed.
    /// - Propagates predictions from every cell of the column.
    /// - Selects the column's first cell as the learning cell.
    fn enter_first_pattern(&mut self, symbol: ColumnId, level: LearningLevel) {
        if !self.store.has_cells(symbol) && level.grows() {
            let addr = self.store.push_cell(symbol, Cell::unconnected());
            debug!(cell = %addr, "grew first cell");
        }

        let depth = self.store.column(symbol).map_or(0, |c| c.len());

        for d in 0..depth {
            self.set_prediction_state(CellAddress::new(symbol, d));
        }

        self.context.last_learning_cell = (depth > 0).then(|| CellAddress::new(symbol, 0));
        self.context.first_pattern = false;
    }

    /// Activates a cell that was correctly predicted by the previous step.
    ///
    /// If weights may adapt:
    /// - Rewards the matched connection.
    /// - Punishes every other pending prediction.
    #[inline]
    fn activate_predicted_cell(&mut self, addr: CellAddress, level: LearningLevel) {
        self.context.last_learning_cell = Some(addr);
        let permanence = self.store.cell(addr).map_or(0, Cell::permanence);
        self.context.path_permanence += u64::from(permanence);

        if level.adapts_weights() {
            self.reinforce_cell(addr, self.params.permanence_increment);

            let decrement = self.params.permanence_decrement;
            if decrement > 0 {
                let predicted = mem::take(&mut self.context.predicted_cells);
                for &other in predicted.iter().filter(|&&other| other != addr) {
                    self.weaken_cell(other, decrement);
                }
                self.context.predicted_cells = predicted;
            }
        }

        self.remove_old_predictions();
        self.set_prediction_state(addr);
    }

    /// Bursts a column that no cell predicted:
    /// - Under `Full`, grows a cell connected to the current learning cell.
    /// - Drops every pending prediction. The learning cell stays where it is.
    #[inline]
    fn burst_column(&mut self, symbol: ColumnId, level: LearningLevel) {
        if level.grows() {
            let cell = match self.context.last_learning_cell {
                Some(prev) => Cell::connected(prev, self.params.initial_permanence),
                None => Cell::unconnected(),
            };
            let addr = self.store.push_cell(symbol, cell);
            debug!(cell = %addr, predecessor = ?self.context.last_learning_cell, "grew cell");
        }

        self.remove_old_predictions();
    }

    /// Marks every cell with a live connection to `active` as predicted and records a scored
    /// prediction for its column. Cells are visited in store order.
    fn set_prediction_state(&mut self, active: CellAddress) {
        let threshold = self.params.connect_threshold;
        let context = &mut self.context;

        self.store.for_each_cell_mut(|addr, cell| {
            if cell.predicts_from(active, threshold) {
                cell.set_was_predicting(true);
                context.predicted_cells.push(addr);
                let score = context.path_score(cell.permanence());
                context.predictions.push(Prediction {
                    column: addr.column,
                    score,
                });
            }
        });
    }

    /// Clears the shadow bit of every pending prediction and forgets the pending list.
    fn remove_old_predictions(&mut self) {
        for addr in self.context.predicted_cells.drain(..) {
            if let Some(cell) = self.store.cell_mut(addr) {
                cell.set_was_predicting(false);
            }
        }
    }

    fn reinforce_cell(&mut self, addr: CellAddress, amount: Permanence) {
        if let Some(conn) = self
            .store
            .cell_mut(addr)
            .and_then(|cell| cell.connection.as_mut())
        {
            conn.reinforce(amount);
        }
    }

    fn weaken_cell(&mut self, addr: CellAddress, amount: Permanence) {
        if let Some(conn) = self
            .store
            .cell_mut(addr)
            .and_then(|cell| cell.connection.as_mut())
        {
            if conn.weaken(amount) {
                debug!(cell = %addr, "connection reached zero permanence and is forgotten");
            }
        }
    }

    pub fn params(&self) -> &SequenceMemoryParams {
        &self.params
    }

    pub fn store(&self) -> &ColumnStore {
        &self.store
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Predictions produced by the latest step.
    pub fn predictions(&self) -> &[Prediction] {
        &self.context.predictions
    }

    /// Cells currently marked as predicted; the targets of `feedback`.
    pub fn predicted_cells(&self) -> &[CellAddress] {
        &self.context.predicted_cells
    }

    pub fn column_table_size(&self) -> usize {
        self.store.table_size()
    }

    pub fn cell(&self, addr: CellAddress) -> Option<&Cell> {
        self.store.cell(addr)
    }
}

/// Scales a permanence step by a feedback factor clamped to at most 2, truncating toward zero.
fn scale(amount: Permanence, factor: f32) -> Permanence {
    (f32::from(amount) * factor.min(2.0)) as Permanence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cell::MAX_PERMANENCE;

    fn feed(memory: &mut SequenceMemory, symbols: &[ColumnId], level: LearningLevel) {
        for &symbol in symbols {
            memory.step(symbol, level);
        }
    }

    fn columns(predictions: &[Prediction]) -> Vec<ColumnId> {
        predictions.iter().map(|p| p.column).collect()
    }

    fn permanence(memory: &SequenceMemory, column: ColumnId, depth: usize) -> Permanence {
        memory
            .cell(CellAddress::new(column, depth))
            .map_or(0, Cell::permanence)
    }

    /// Learns `1 -> 2` and `1 -> 3`, then stops right after `1` so both are predicted.
    fn branching_memory(params: SequenceMemoryParams) -> SequenceMemory {
        let mut memory = SequenceMemory::new(params);
        feed(&mut memory, &[0, 1, 2, 0, 1, 3, 0, 1], LearningLevel::Full);
        memory
    }

    #[test]
    fn learns_a_transition_in_one_pass() {
        let mut memory = SequenceMemory::default();

        assert!(memory.step(0, LearningLevel::Full).is_empty());
        assert!(memory.step(1, LearningLevel::Full).is_empty());
        assert!(memory.step(2, LearningLevel::Full).is_empty());
        assert_eq!(permanence(&memory, 2, 0), 500);
        assert_eq!(
            memory.cell(CellAddress::new(2, 0)).and_then(|c| c.connection).map(|c| c.destination),
            Some(CellAddress::new(1, 0))
        );

        memory.step(0, LearningLevel::Full);
        assert_eq!(columns(memory.step(1, LearningLevel::Full)), vec![2]);
        assert!(memory.step(2, LearningLevel::Full).is_empty());
        assert_eq!(permanence(&memory, 2, 0), 600);
    }

    #[test]
    fn reset_clears_session_from_any_state() {
        for level in [
            LearningLevel::Frozen,
            LearningLevel::AwardAndPunish,
            LearningLevel::Full,
        ] {
            let mut memory = branching_memory(SequenceMemoryParams::default());
            assert!(!memory.predictions().is_empty());

            assert!(memory.step(0, level).is_empty());
            let context = memory.context();
            assert!(context.first_pattern);
            assert!(context.last_learning_cell.is_none());
            assert!(context.predicted_cells.is_empty());
            assert_eq!(context.steps_since_reset, 0);
            assert_eq!(context.path_permanence, 0);
            assert_eq!(context.last_active_column, 0);
            assert!(memory.store().cells().all(|(_, cell)| !cell.was_predicting()));
        }
    }

    #[test]
    fn frozen_step_on_unseen_column_returns_without_mutation() {
        let mut memory = SequenceMemory::default();
        memory.step(0, LearningLevel::Frozen);
        assert!(memory.step(5, LearningLevel::Frozen).is_empty());
        assert_eq!(memory.column_table_size(), 0);
        assert!(memory.context().first_pattern);
        assert_eq!(memory.context().steps_since_reset, 0);
    }

    #[test]
    fn frozen_step_on_unseen_column_keeps_pending_predictions() {
        let mut memory = branching_memory(SequenceMemoryParams::default());
        assert_eq!(columns(memory.predictions()), vec![2, 3]);

        assert!(memory.step(9, LearningLevel::Frozen).is_empty());
        assert_eq!(columns(memory.predictions()), vec![2, 3]);
        assert_eq!(memory.predicted_cells().len(), 2);

        memory.feedback(2, 0.0);
        assert_eq!(permanence(&memory, 2, 0), 600);
        assert_eq!(permanence(&memory, 3, 0), 499);
    }

    #[test]
    fn column_seen_under_full_is_no_longer_skipped_when_frozen() {
        let mut memory = SequenceMemory::default();
        feed(&mut memory, &[0, 3], LearningLevel::Full);
        assert_eq!(memory.column_table_size(), 3);

        memory.step(0, LearningLevel::Frozen);
        memory.step(3, LearningLevel::Frozen);
        assert!(!memory.context().first_pattern);
        assert_eq!(memory.context().last_active_column, 3);
    }

    #[test]
    fn frozen_steps_leave_the_store_untouched() {
        let mut memory = branching_memory(SequenceMemoryParams::default());
        let before = memory.store().clone();

        feed(&mut memory, &[2, 0, 1, 3, 2, 7, 0, 1, 1], LearningLevel::Frozen);

        let strip = |store: &ColumnStore| {
            store
                .cells()
                .map(|(addr, cell)| (addr, cell.connection))
                .collect::<Vec<_>>()
        };
        assert_eq!(strip(memory.store()), strip(&before));
        assert_eq!(memory.column_table_size(), before.table_size());
    }

    #[test]
    fn award_and_punish_never_grows_cells() {
        let mut memory = SequenceMemory::default();
        feed(&mut memory, &[0, 1, 2, 0, 1], LearningLevel::Full);
        let cells = memory.store().cell_count();

        feed(&mut memory, &[3, 4, 0, 5, 1, 2], LearningLevel::AwardAndPunish);
        assert_eq!(memory.store().cell_count(), cells);
        assert_eq!(permanence(&memory, 2, 0), 500);

        feed(&mut memory, &[0, 1, 2], LearningLevel::AwardAndPunish);
        assert_eq!(memory.store().cell_count(), cells);
        assert_eq!(permanence(&memory, 2, 0), 600);
    }

    #[test]
    fn correct_prediction_punishes_competitors() {
        let mut memory = branching_memory(SequenceMemoryParams::default());
        assert_eq!(columns(memory.predictions()), vec![2, 3]);

        memory.step(2, LearningLevel::Full);
        assert_eq!(permanence(&memory, 2, 0), 600);
        assert_eq!(permanence(&memory, 3, 0), 499);

        memory.step(0, LearningLevel::Full);
        let predictions = memory.step(1, LearningLevel::Full).to_vec();
        assert_eq!(
            predictions,
            vec![
                Prediction { column: 2, score: 600.0 },
                Prediction { column: 3, score: 499.0 },
            ]
        );
    }

    #[test]
    fn zero_decrement_disables_punishment() {
        let params = SequenceMemoryParams {
            permanence_decrement: 0,
            ..Default::default()
        };
        let mut memory = branching_memory(params);
        memory.step(2, LearningLevel::Full);
        assert_eq!(permanence(&memory, 3, 0), 500);
    }

    #[test]
    fn forgotten_connection_no_longer_predicts() {
        let params = SequenceMemoryParams {
            initial_permanence: 2,
            connect_threshold: 0,
            permanence_increment: 1,
            permanence_decrement: 2,
        };
        let mut memory = branching_memory(params);
        assert_eq!(columns(memory.predictions()), vec![2, 3]);

        memory.step(2, LearningLevel::Full);
        assert_eq!(permanence(&memory, 3, 0), 0);

        memory.step(0, LearningLevel::Full);
        assert_eq!(columns(memory.step(1, LearningLevel::Full)), vec![2]);
    }

    #[test]
    fn novel_symbols_attach_to_the_learning_cell() {
        let mut memory = SequenceMemory::default();
        feed(&mut memory, &[0, 1, 2, 3], LearningLevel::Full);

        assert_eq!(memory.context().last_learning_cell, Some(CellAddress::new(1, 0)));
        for column in [2, 3] {
            assert_eq!(
                memory
                    .cell(CellAddress::new(column, 0))
                    .and_then(|c| c.connection)
                    .map(|c| c.destination),
                Some(CellAddress::new(1, 0))
            );
        }

        memory.step(0, LearningLevel::Frozen);
        assert_eq!(columns(memory.step(1, LearningLevel::Frozen)), vec![2, 3]);
        assert!(memory.step(2, LearningLevel::Frozen).is_empty());
    }

    #[test]
    fn sequence_is_refined_over_replays() {
        let mut memory = SequenceMemory::default();
        feed(&mut memory, &[0, 1, 2, 3, 0, 1, 2, 3], LearningLevel::Full);
        assert_eq!(
            memory
                .cell(CellAddress::new(3, 1))
                .and_then(|c| c.connection)
                .map(|c| c.destination),
            Some(CellAddress::new(2, 0))
        );

        memory.step(0, LearningLevel::Frozen);
        memory.step(1, LearningLevel::Frozen);
        assert_eq!(columns(memory.step(2, LearningLevel::Frozen)), vec![3]);
    }

    #[test]
    fn predictions_are_scored_by_average_path_permanence() {
        let mut memory = SequenceMemory::default();
        feed(&mut memory, &[0, 1, 2, 3, 0, 1, 2, 3], LearningLevel::Full);

        memory.step(0, LearningLevel::Full);
        assert_eq!(
            memory.step(1, LearningLevel::Full).to_vec(),
            vec![
                Prediction { column: 2, score: 600.0 },
                Prediction { column: 3, score: 499.0 },
            ]
        );
        assert_eq!(
            memory.step(2, LearningLevel::Full).to_vec(),
            vec![Prediction { column: 3, score: 550.0 }]
        );
        assert_eq!(memory.context().path_permanence, 600);
    }

    #[test]
    fn repeated_symbols_grow_distinct_cells() {
        let mut memory = SequenceMemory::default();
        feed(&mut memory, &[0, 1, 2, 2, 3], LearningLevel::Full);
        assert_eq!(memory.store().column(2).map(|c| c.len()), Some(2));

        memory.step(0, LearningLevel::Frozen);
        assert_eq!(columns(memory.step(1, LearningLevel::Frozen)), vec![2, 2, 3]);
    }

    #[test]
    fn permanence_saturates_on_long_training() {
        let params = SequenceMemoryParams {
            permanence_increment: MAX_PERMANENCE / 3,
            ..Default::default()
        };
        let mut memory = SequenceMemory::new(params);
        for _ in 0..10 {
            feed(&mut memory, &[0, 1, 2], LearningLevel::Full);
        }
        assert_eq!(permanence(&memory, 2, 0), MAX_PERMANENCE);
    }

    #[test]
    fn feedback_neutral_rewards_target_and_punishes_others() {
        let mut memory = branching_memory(SequenceMemoryParams::default());
        memory.feedback(2, 0.0);
        assert_eq!(permanence(&memory, 2, 0), 600);
        assert_eq!(permanence(&memory, 3, 0), 499);
    }

    #[test]
    fn feedback_positive_scales_reward_with_clamp() {
        let mut memory = branching_memory(SequenceMemoryParams::default());
        memory.feedback(2, 1.5);
        assert_eq!(permanence(&memory, 2, 0), 650);
        assert_eq!(permanence(&memory, 3, 0), 500);

        memory.feedback(2, 5.0);
        assert_eq!(permanence(&memory, 2, 0), 850);
    }

    #[test]
    fn feedback_scaling_truncates_fractional_steps() {
        let mut memory = branching_memory(SequenceMemoryParams::default());
        memory.feedback(2, 1.999);
        assert_eq!(permanence(&memory, 2, 0), 699);

        memory.feedback(2, -0.6);
        assert_eq!(permanence(&memory, 3, 0), 500);
        memory.feedback(2, -1.6);
        assert_eq!(permanence(&memory, 3, 0), 499);
    }

    #[test]
    fn feedback_negative_punishes_all_but_target() {
        let mut memory = branching_memory(SequenceMemoryParams::default());
        memory.feedback(2, -3.0);
        assert_eq!(permanence(&memory, 2, 0), 500);
        assert_eq!(permanence(&memory, 3, 0), 498);
    }

    #[test]
    fn feedback_on_column_zero() {
        let mut memory = branching_memory(SequenceMemoryParams::default());
        memory.feedback(0, 1.0);
        assert_eq!(permanence(&memory, 2, 0), 500);
        assert_eq!(permanence(&memory, 3, 0), 500);

        memory.feedback(0, -1.0);
        assert_eq!(permanence(&memory, 2, 0), 499);
        assert_eq!(permanence(&memory, 3, 0), 499);
    }

    #[test]
    fn feedback_for_unpredicted_column_is_ignored() {
        let mut memory = branching_memory(SequenceMemoryParams::default());
        memory.feedback(9, 0.0);
        memory.feedback(9, -2.0);
        memory.feedback(9, f32::NAN);
        assert_eq!(permanence(&memory, 2, 0), 500);
        assert_eq!(permanence(&memory, 3, 0), 500);
        assert_eq!(memory.predicted_cells().len(), 2);
    }

    #[test]
    fn run_resets_first_and_honours_step_budget() {
        let mut memory = SequenceMemory::default();
        memory.run([1, 2, 0, 1, 2], None, LearningLevel::Full);

        let predictions = memory.run([1, 2, 3], Some(1), LearningLevel::Frozen);
        assert_eq!(columns(&predictions), vec![2]);
        assert_eq!(memory.context().last_active_column, 1);

        assert!(memory.run(std::iter::empty(), None, LearningLevel::Frozen).is_empty());
        assert!(memory.context().first_pattern);
    }
}
