pub use chia_spend_coinset as coinset;
pub use chia_spend_driver::*;
pub use chia_spend_program::*;
pub use chia_spend_signer::*;
pub use chia_spend_types::*;
