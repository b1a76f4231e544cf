pub mod cell;
pub mod column;
pub mod context;
pub mod generators;
pub mod persistence;
pub mod sequence_memory;
