mod error;
mod key_store;
mod required_signature;
mod signing;

pub use error::*;
pub use key_store::*;
pub use required_signature::*;
pub use signing::*;
