mod condition;
mod constants;
mod run_puzzle;

pub use condition::*;
pub use constants::*;
pub use run_puzzle::*;
