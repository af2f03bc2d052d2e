use chia_consensus::validation_error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("validation error: {0:?}")]
    Validation(ErrorCode),
}

impl From<ErrorCode> for SimulatorError {
    fn from(value: ErrorCode) -> Self {
        Self::Validation(value)
    }
}
