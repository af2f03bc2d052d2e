use chia_protocol::Bytes32;
use chia_spend_program::Program;
use chia_spend_types::{conditions_program, Condition};

use crate::DriverError;

/// Builds `((51 recipient (amount - fee)))`, leaving `fee` to the farmer.
pub fn build_send_conditions(
    amount: u64,
    recipient: Bytes32,
    fee: u64,
) -> Result<Program, DriverError> {
    let output = amount
        .checked_sub(fee)
        .ok_or(DriverError::InsufficientFunds { amount, fee })?;

    Ok(conditions_program(&[Condition::create_coin(
        recipient, output,
    )])?)
}
