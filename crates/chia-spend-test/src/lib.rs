mod consensus_constants;
mod error;
mod key_pairs;
mod simulator;
mod validate_clvm_and_signature;

pub use consensus_constants::*;
pub use error::*;
pub use key_pairs::*;
pub use simulator::*;
pub use validate_clvm_and_signature::*;

pub fn expect_spend<T>(result: Result<T, SimulatorError>, to_pass: bool) {
    if let Err(error) = result {
        assert!(!to_pass, "Expected spend to pass, but got {error}");
    } else if !to_pass {
        panic!("Expected spend to fail");
    }
}
