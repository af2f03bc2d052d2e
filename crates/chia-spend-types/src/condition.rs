use chia_bls::PublicKey;
use chia_protocol::{Bytes, Bytes32};
use chia_sha2::Sha256;
use chia_spend_program::Program;
use clvm_traits::{apply_constants, FromClvm, FromClvmError, ToClvm, ToClvmError};
use clvmr::Allocator;
use thiserror::Error;

pub const REMARK: u64 = 1;
pub const AGG_SIG_ME: u64 = 50;
pub const CREATE_COIN: u64 = 51;
pub const RESERVE_FEE: u64 = 52;
pub const CREATE_COIN_ANNOUNCEMENT: u64 = 60;
pub const ASSERT_COIN_ANNOUNCEMENT: u64 = 61;

#[derive(Debug, Error)]
pub enum ConditionError {
    #[error("conditions are not a proper list")]
    NotAList,

    #[error("condition {0} has no opcode")]
    MissingOpcode(String),

    #[error("malformed condition: {0}")]
    Malformed(String),

    #[error("infinity public key in condition")]
    InfinityPublicKey,

    #[error("to clvm error: {0}")]
    ToClvm(#[from] ToClvmError),

    #[error("from clvm error: {0}")]
    FromClvm(#[from] FromClvmError),
}

#[derive(ToClvm, FromClvm)]
#[apply_constants]
#[derive(Debug, Clone, PartialEq, Eq)]
#[clvm(list)]
pub struct Remark<T = Program> {
    #[clvm(constant = 1)]
    pub opcode: u8,
    #[clvm(rest)]
    pub rest: T,
}

impl<T> Remark<T> {
    pub fn new(rest: T) -> Self {
        Self { rest }
    }
}

#[derive(ToClvm, FromClvm)]
#[apply_constants]
#[derive(Debug, Clone, PartialEq, Eq)]
#[clvm(list)]
pub struct AggSigMe {
    #[clvm(constant = 50)]
    pub opcode: u8,
    pub public_key: PublicKey,
    pub message: Bytes,
}

impl AggSigMe {
    pub fn new(public_key: PublicKey, message: Bytes) -> Self {
        Self {
            public_key,
            message,
        }
    }
}

#[derive(ToClvm, FromClvm)]
#[apply_constants]
#[derive(Debug, Clone, PartialEq, Eq)]
#[clvm(list)]
pub struct CreateCoin {
    #[clvm(constant = 51)]
    pub opcode: u8,
    pub puzzle_hash: Bytes32,
    pub amount: u64,
    #[clvm(default)]
    pub memos: Vec<Bytes>,
}

impl CreateCoin {
    pub fn new(puzzle_hash: Bytes32, amount: u64) -> Self {
        Self::with_memos(puzzle_hash, amount, Vec::new())
    }

    pub fn with_memos(puzzle_hash: Bytes32, amount: u64, memos: Vec<Bytes>) -> Self {
        Self {
            puzzle_hash,
            amount,
            memos,
        }
    }
}

#[derive(ToClvm, FromClvm)]
#[apply_constants]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[clvm(list)]
pub struct ReserveFee {
    #[clvm(constant = 52)]
    pub opcode: u8,
    pub amount: u64,
}

impl ReserveFee {
    pub fn new(amount: u64) -> Self {
        Self { amount }
    }
}

#[derive(ToClvm, FromClvm)]
#[apply_constants]
#[derive(Debug, Clone, PartialEq, Eq)]
#[clvm(list)]
pub struct CreateCoinAnnouncement {
    #[clvm(constant = 60)]
    pub opcode: u8,
    pub message: Bytes,
}

impl CreateCoinAnnouncement {
    pub fn new(message: Bytes) -> Self {
        Self { message }
    }
}

#[derive(ToClvm, FromClvm)]
#[apply_constants]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[clvm(list)]
pub struct AssertCoinAnnouncement {
    #[clvm(constant = 61)]
    pub opcode: u8,
    pub announcement_id: Bytes32,
}

impl AssertCoinAnnouncement {
    pub fn new(announcement_id: Bytes32) -> Self {
        Self { announcement_id }
    }
}

/// A condition output by a puzzle. Opcodes this crate doesn't model are kept
/// verbatim as [`Condition::Other`].
#[derive(Debug, Clone, PartialEq, Eq, ToClvm, FromClvm)]
#[clvm(transparent)]
pub enum Condition<T = Program> {
    Remark(Remark<T>),
    AggSigMe(AggSigMe),
    CreateCoin(CreateCoin),
    ReserveFee(ReserveFee),
    CreateCoinAnnouncement(CreateCoinAnnouncement),
    AssertCoinAnnouncement(AssertCoinAnnouncement),
    Other(T),
}

impl Condition {
    pub fn create_coin(puzzle_hash: Bytes32, amount: u64) -> Self {
        Self::CreateCoin(CreateCoin::new(puzzle_hash, amount))
    }

    pub fn reserve_fee(amount: u64) -> Self {
        Self::ReserveFee(ReserveFee::new(amount))
    }

    pub fn agg_sig_me(public_key: PublicKey, message: Bytes) -> Self {
        Self::AggSigMe(AggSigMe::new(public_key, message))
    }

    pub fn create_coin_announcement(message: Bytes) -> Self {
        Self::CreateCoinAnnouncement(CreateCoinAnnouncement::new(message))
    }

    pub fn assert_coin_announcement(announcement_id: Bytes32) -> Self {
        Self::AssertCoinAnnouncement(AssertCoinAnnouncement::new(announcement_id))
    }

    pub fn to_program(&self) -> Result<Program, ConditionError> {
        let mut allocator = Allocator::new();
        let ptr = self.to_clvm(&mut allocator)?;
        Ok(Program::from_clvm(&allocator, ptr)?)
    }

    /// Decodes a single condition. A modeled opcode whose arguments don't
    /// decode is rejected rather than passed through as [`Condition::Other`].
    pub fn parse(program: &Program) -> Result<Self, ConditionError> {
        let Some(opcode) = program.first() else {
            return Err(ConditionError::MissingOpcode(program.to_string()));
        };

        let mut allocator = Allocator::new();
        let ptr = program.to_clvm(&mut allocator)?;

        match Self::from_clvm(&allocator, ptr)? {
            Self::AggSigMe(agg_sig) if agg_sig.public_key.is_inf() => {
                Err(ConditionError::InfinityPublicKey)
            }
            Self::Other(_) if opcode.as_u64().is_some_and(is_modeled_opcode) => {
                Err(ConditionError::Malformed(program.to_string()))
            }
            condition => Ok(condition),
        }
    }
}

fn is_modeled_opcode(opcode: u64) -> bool {
    matches!(
        opcode,
        AGG_SIG_ME | CREATE_COIN | RESERVE_FEE | CREATE_COIN_ANNOUNCEMENT | ASSERT_COIN_ANNOUNCEMENT
    )
}

/// Serializes conditions into the list a puzzle outputs.
pub fn conditions_program(conditions: &[Condition]) -> Result<Program, ConditionError> {
    Ok(Program::list(
        conditions
            .iter()
            .map(Condition::to_program)
            .collect::<Result<Vec<_>, _>>()?,
    ))
}

/// Parses the output of a puzzle into conditions.
pub fn parse_conditions(output: &Program) -> Result<Vec<Condition>, ConditionError> {
    output
        .as_list()
        .ok_or(ConditionError::NotAList)?
        .iter()
        .map(Condition::parse)
        .collect()
}

pub fn announcement_id(coin_id: Bytes32, message: impl AsRef<[u8]>) -> Bytes32 {
    let mut hasher = Sha256::new();
    hasher.update(coin_id);
    hasher.update(message);
    Bytes32::new(hasher.finalize())
}
