use chia_bls::PublicKey;
use chia_spend_program::ProgramError;
use chia_spend_types::{ConditionError, RunPuzzleError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("program error: {0}")]
    Program(#[from] ProgramError),

    #[error("failed to run puzzle: {0}")]
    Run(#[from] RunPuzzleError),

    #[error("{0}")]
    Condition(#[from] ConditionError),

    #[error("invalid key: {0}")]
    InvalidKey(#[from] chia_bls::Error),

    #[error("invalid mnemonic: {0}")]
    Mnemonic(#[from] bip39::Error),

    #[error("missing secret key for public key {}", hex::encode(.0.to_bytes()))]
    MissingKey(PublicKey),

    #[error("expected {expected} signatures, but got {actual}")]
    SignatureCount { expected: usize, actual: usize },
}
