mod assembler;
mod coin_selection;
mod conditions;
mod config;
mod driver_error;
mod funding;
mod locator;
mod puzzles;
mod spend;
mod spend_engine;
mod unused_indices;

pub use assembler::*;
pub use coin_selection::*;
pub use conditions::*;
pub use config::*;
pub use driver_error::*;
pub use funding::*;
pub use locator::*;
pub use puzzles::*;
pub use spend::*;
pub use spend_engine::*;
pub use unused_indices::*;

pub use chia_spend_coinset::{Ledger, LedgerError, RpcLedger};
