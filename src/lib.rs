//! Adaptive Sequence Memorizer (ASM).
//!
//! An online, incremental sequence learner modeled on the column/cell structure of HTM.
//! It consumes a stream of discrete symbol IDs, learns which symbol follows which context,
//! and predicts the set of symbols likely to come next. Predictions can be steered with
//! external reward and punishment signals, and the learned store can be saved to (and
//! restored from) a line-oriented text file or a compact binary snapshot.
//!
//! ```
//! use asm_rs::core::sequence_memory::{LearningLevel, SequenceMemory};
//!
//! let mut memory = SequenceMemory::default();
//! for _ in 0..2 {
//!     for symbol in [0, 1, 2] {
//!         memory.step(symbol, LearningLevel::Full);
//!     }
//! }
//!
//! memory.step(0, LearningLevel::Frozen);
//! let predictions = memory.step(1, LearningLevel::Frozen);
//! assert_eq!(predictions[0].column, 2);
//! ```

pub mod core;
pub mod error;

pub use error::{AsmError, Result};
