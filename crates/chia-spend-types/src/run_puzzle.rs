use chia_spend_program::Program;
use clvmr::{reduction::EvalErr, run_program, Allocator, ChiaDialect};
use thiserror::Error;

use crate::MAX_BLOCK_COST;

#[derive(Debug, Error)]
pub enum RunPuzzleError {
    #[error("eval error: {0}")]
    Eval(#[from] EvalErr),
}

/// Runs a puzzle with its solution under the Chia dialect, bounded by the
/// block cost limit.
pub fn run_puzzle(puzzle: &Program, solution: &Program) -> Result<Program, RunPuzzleError> {
    let mut allocator = Allocator::new();
    let puzzle = puzzle.to_node(&mut allocator)?;
    let solution = solution.to_node(&mut allocator)?;

    let reduction = run_program(
        &mut allocator,
        &ChiaDialect::new(0),
        puzzle,
        solution,
        MAX_BLOCK_COST,
    )?;

    Ok(Program::from_node(&allocator, reduction.1))
}
