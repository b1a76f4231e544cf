//! Symbol producers that feed a `SequenceMemory`.
//!
//! A producer is any `Iterator<Item = ColumnId>`; returning `None` signals that no more data is
//! available. Two replay strategies are provided:
//! - `FlashCardGenerator` shows each symbol of a fixed list several times before moving on and
//!   wraps around at the end of the list. It never runs out.
//! - `IncrementalSequenceGenerator` replays a growing prefix of its list, one symbol longer on each
//!   cycle, and ends once the whole list has been replayed.

use super::cell::ColumnId;

/// Rotates through a series of symbols, repeating each one a fixed number of times.
#[derive(Clone, Debug)]
pub struct FlashCardGenerator {
    inputs: Vec<ColumnId>,
    repetition: usize,
    shown: usize,
    position: usize,
}

impl FlashCardGenerator {
    /// Creates a generator that yields every input `repetition` times in a row.
    /// A repetition of zero is treated as one.
    pub fn new(inputs: Vec<ColumnId>, repetition: usize) -> Self {
        Self {
            inputs,
            repetition: repetition.max(1),
            shown: 0,
            position: 0,
        }
    }

    /// Restarts from the first input.
    pub fn reset(&mut self) {
        self.shown = 0;
        self.position = 0;
    }
}

impl Iterator for FlashCardGenerator {
    type Item = ColumnId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.inputs.is_empty() {
            return None;
        }

        if self.shown >= self.repetition {
            self.shown = 0;
            self.position = (self.position + 1) % self.inputs.len();
        }

        self.shown += 1;
        Some(self.inputs[self.position])
    }
}

/// Replays ever longer prefixes of a sequence: `[a]`, `[a, b]`, `[a, b, c]`, ...
#[derive(Clone, Debug)]
pub struct IncrementalSequenceGenerator {
    inputs: Vec<ColumnId>,
    prefix_len: usize,
    position: usize,
}

impl IncrementalSequenceGenerator {
    pub fn new(inputs: Vec<ColumnId>) -> Self {
        Self {
            inputs,
            prefix_len: 0,
            position: 0,
        }
    }

    /// Restarts from the one-symbol prefix.
    pub fn reset(&mut self) {
        self.prefix_len = 0;
        self.position = 0;
    }
}

impl Iterator for IncrementalSequenceGenerator {
    type Item = ColumnId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position == self.prefix_len {
            if self.prefix_len >= self.inputs.len() {
                return None;
            }
            self.prefix_len += 1;
            self.position = 0;
        }

        let symbol = self.inputs[self.position];
        self.position += 1;
        Some(symbol)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = |n: usize| n * (n + 1) / 2;
        let remaining =
            total(self.inputs.len()) - total(self.prefix_len) + (self.prefix_len - self.position);
        (remaining, Some(remaining))
    }
}
