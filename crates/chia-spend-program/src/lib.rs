mod assemble;
mod curry;
mod error;
mod node;
mod program;
mod serialize;
mod tree_hash;

pub use error::*;
pub use program::*;
