use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProgramError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("{0} trailing bytes after program")]
    TrailingBytes(usize),

    #[error("back references are not supported")]
    BackReference,

    #[error("invalid atom length prefix {0:#04x}")]
    InvalidLengthPrefix(u8),

    #[error("invalid hex encoding")]
    InvalidHex,
}
