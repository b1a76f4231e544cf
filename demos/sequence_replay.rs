//! This demo teaches the memorizer a handful of overlapping sequences, then freezes it and
//! asks for predictions. It mirrors the classic replay scenario: sequences are separated by
//! the reset symbol `0`, learning runs with full growth, and recall runs frozen.
//!
//! Afterwards a seeded, noisy flash-card stream is learned, the memory is saved to a text
//! snapshot, and a fresh memorizer is restored from it.
//!
//! Run with: `RUST_LOG=debug cargo run --example sequence_replay`

use anyhow::{bail, Context};
use asm_rs::core::cell::ColumnId;
use asm_rs::core::context::unique_columns;
use asm_rs::core::generators::FlashCardGenerator;
use asm_rs::core::sequence_memory::{LearningLevel, SequenceMemory, SequenceMemoryParams};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

fn print_prediction(memory: &mut SequenceMemory, symbol: ColumnId, level: LearningLevel) {
    let predictions = unique_columns(memory.step(symbol, level));
    let rendered: Vec<String> = predictions
        .iter()
        .map(|p| format!("{}({:.0})", p.column, p.score))
        .collect();
    println!("({symbol}): {}", rendered.join(","));
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut memory = SequenceMemory::new(SequenceMemoryParams::default());

    let lessons: [&[ColumnId]; 5] = [
        &[0, 1],
        &[0, 1, 2],
        &[0, 1, 2, 2],
        &[0, 1, 2, 2, 3],
        &[0, 1, 2, 2, 3, 2, 4],
    ];

    for lesson in lessons {
        for &symbol in lesson {
            print_prediction(&mut memory, symbol, LearningLevel::Full);
        }
    }

    println!("************ LEARNING Finished **********");

    for symbol in [0, 1, 2, 2, 3] {
        print_prediction(&mut memory, symbol, LearningLevel::Frozen);
    }

    println!("Learning a noisy flash-card stream...");

    let mut rng = StdRng::from_seed([42u8; 32]);
    let cards = FlashCardGenerator::new(vec![0, 5, 6, 7, 8], 1);
    let noisy = cards.map(|symbol| {
        if symbol != 0 && rng.random::<f32>() < 0.05 {
            rng.random_range(5..=8)
        } else {
            symbol
        }
    });
    memory.run(noisy, Some(500), LearningLevel::Full);

    let predictions = memory.run([5, 6], None, LearningLevel::Frozen);
    println!(
        "After 5, 6: {:?}",
        unique_columns(&predictions)
            .iter()
            .map(|p| p.column)
            .collect::<Vec<_>>()
    );

    let path = std::env::temp_dir().join("asm_sequence_replay.asm");
    memory
        .save_to_file(&path)
        .with_context(|| format!("saving to {}", path.display()))?;

    let mut restored = SequenceMemory::default();
    if !restored.load(&path, true)? {
        bail!("snapshot {} disappeared before it could be loaded", path.display());
    }

    let replayed = restored.run([5, 6], None, LearningLevel::Frozen);
    println!(
        "Restored {} cells from {}; predictions match: {}",
        restored.store().cell_count(),
        path.display(),
        replayed == predictions
    );

    Ok(())
}
