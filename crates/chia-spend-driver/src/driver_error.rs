use chia_protocol::Bytes32;
use chia_spend_coinset::LedgerError;
use chia_spend_program::ProgramError;
use chia_spend_signer::SignerError;
use chia_spend_types::ConditionError;
use thiserror::Error;

use crate::CoinSelectionError;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no spendable coin for puzzle hash {0}")]
    NoSpendableCoin(Bytes32),

    #[error("selected coin has puzzle hash {0}, which is not derived from the key store")]
    UnknownPuzzleHash(Bytes32),

    #[error("fee {fee} exceeds coin amount {amount}")]
    InsufficientFunds { amount: u64, fee: u64 },

    #[error("amount overflow")]
    AmountOverflow,

    #[error("signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("program error: {0}")]
    Program(#[from] ProgramError),

    #[error("condition error: {0}")]
    Condition(#[from] ConditionError),

    #[error("coin selection error: {0}")]
    CoinSelection(#[from] CoinSelectionError),

    #[error("spend bundle rejected: {0}")]
    SubmissionRejected(String),

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error("no unused derivation index within the first {scanned}")]
    NoUnusedIndex { scanned: u32 },

    #[error("coin {0} is spent more than once")]
    DuplicateCoin(Bytes32),

    #[error("spend bundle has no coin spends")]
    EmptyBundle,

    #[error("aggregate signature does not verify")]
    SignatureVerification,

    #[error("ledger genesis challenge {actual} does not match configured {expected}")]
    NetworkMismatch { expected: Bytes32, actual: Bytes32 },
}

impl From<LedgerError> for DriverError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::Rejected(reason) => Self::SubmissionRejected(reason),
            LedgerError::Request(message) | LedgerError::Node(message) => Self::Ledger(message),
        }
    }
}
