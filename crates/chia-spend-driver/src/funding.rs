use chia_bls::PublicKey;
use chia_protocol::{Bytes32, Coin, CoinSpend};
use chia_sha2::Sha256;
use chia_spend_signer::RequiredSignature;
use chia_spend_types::{announcement_id, conditions_program, Condition};

use crate::{CoinSelectionError, DriverError, StandardPuzzle};

/// A standard wallet coin and the synthetic key its puzzle is curried with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingInput {
    pub coin: Coin,
    pub synthetic_key: PublicKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment {
    pub puzzle_hash: Bytes32,
    pub amount: u64,
    pub fee: u64,
    pub change_puzzle_hash: Bytes32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingSpends {
    pub coin_spends: Vec<CoinSpend>,
    pub required_signatures: Vec<RequiredSignature>,
}

/// Spends standard wallet coins to pay `payment`, returning change to the
/// wallet.
///
/// The first coin creates every output and reserves the fee. It also
/// announces a digest of all the input coin ids, which every input asserts,
/// so no coin can be spent apart from the others.
pub fn build_funding_spends(
    inputs: &[FundingInput],
    payment: &Payment,
    genesis_challenge: Bytes32,
) -> Result<FundingSpends, DriverError> {
    let Some(primary) = inputs.first() else {
        return Err(CoinSelectionError::NoSpendableCoins.into());
    };

    let required = payment
        .amount
        .checked_add(payment.fee)
        .ok_or(DriverError::AmountOverflow)?;

    let selected: u128 = inputs
        .iter()
        .map(|input| u128::from(input.coin.amount))
        .sum();

    let change = selected
        .checked_sub(u128::from(required))
        .ok_or(CoinSelectionError::InsufficientBalance { selected, required })?;
    let change = u64::try_from(change).map_err(|_| DriverError::AmountOverflow)?;

    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input.coin.coin_id());
    }
    let message = hasher.finalize().to_vec();
    let assertion =
        Condition::assert_coin_announcement(announcement_id(primary.coin.coin_id(), &message));

    let mut primary_conditions = vec![Condition::create_coin(
        payment.puzzle_hash,
        payment.amount,
    )];
    if change > 0 {
        primary_conditions.push(Condition::create_coin(payment.change_puzzle_hash, change));
    }
    if payment.fee > 0 {
        primary_conditions.push(Condition::reserve_fee(payment.fee));
    }
    primary_conditions.push(Condition::create_coin_announcement(message.into()));
    primary_conditions.push(assertion.clone());

    let secondary_conditions = conditions_program(&[assertion])?;
    let primary_conditions = conditions_program(&primary_conditions)?;

    let mut coin_spends = Vec::with_capacity(inputs.len());
    let mut required_signatures = Vec::with_capacity(inputs.len());

    for (i, input) in inputs.iter().enumerate() {
        let puzzle = StandardPuzzle::new(input.synthetic_key);
        let conditions = if i == 0 {
            &primary_conditions
        } else {
            &secondary_conditions
        };

        coin_spends.push(puzzle.spend(input.coin, conditions));
        required_signatures.push(puzzle.required_signature(
            &input.coin,
            conditions,
            genesis_challenge,
        ));
    }

    Ok(FundingSpends {
        coin_spends,
        required_signatures,
    })
}
