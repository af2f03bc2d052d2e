use chia_protocol::Coin;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinSelectionMode {
    Largest,
    Smallest,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoinSelectionError {
    #[error("no spendable coins")]
    NoSpendableCoins,

    #[error("insufficient balance {selected}, need {required}")]
    InsufficientBalance { selected: u128, required: u64 },
}

/// Picks coins in the given order until their total covers `amount`.
pub fn select_coins(
    mut coins: Vec<Coin>,
    amount: u64,
    mode: CoinSelectionMode,
) -> Result<Vec<Coin>, CoinSelectionError> {
    if coins.is_empty() {
        return Err(CoinSelectionError::NoSpendableCoins);
    }

    match mode {
        CoinSelectionMode::Largest => {
            coins.sort_by(|a, b| b.amount.cmp(&a.amount));
        }
        CoinSelectionMode::Smallest => {
            coins.sort_by(|a, b| a.amount.cmp(&b.amount));
        }
    }

    let mut selected_amount: u128 = 0;
    let mut selected_coins = Vec::new();

    for coin in coins {
        if selected_amount >= u128::from(amount) {
            break;
        }

        selected_amount += u128::from(coin.amount);
        selected_coins.push(coin);
    }

    if selected_amount < u128::from(amount) {
        return Err(CoinSelectionError::InsufficientBalance {
            selected: selected_amount,
            required: amount,
        });
    }

    Ok(selected_coins)
}

#[cfg(test)]
mod tests {
    use chia_protocol::Bytes32;
    use rstest::rstest;

    use super::*;

    fn coins(amounts: &[u64]) -> Vec<Coin> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| Coin::new(Bytes32::new([i as u8; 32]), Bytes32::default(), amount))
            .collect()
    }

    #[rstest]
    #[case(CoinSelectionMode::Largest, 150, &[100, 50])]
    #[case(CoinSelectionMode::Largest, 100, &[100])]
    #[case(CoinSelectionMode::Smallest, 15, &[5, 10])]
    #[case(CoinSelectionMode::Smallest, 0, &[])]
    fn test_select(
        #[case] mode: CoinSelectionMode,
        #[case] amount: u64,
        #[case] expected: &[u64],
    ) -> anyhow::Result<()> {
        let selected = select_coins(coins(&[10, 100, 5, 50]), amount, mode)?;
        assert_eq!(
            selected.iter().map(|coin| coin.amount).collect::<Vec<_>>(),
            expected
        );
        Ok(())
    }

    #[test]
    fn test_insufficient_balance() {
        assert_eq!(
            select_coins(coins(&[10, 20]), 31, CoinSelectionMode::Largest),
            Err(CoinSelectionError::InsufficientBalance {
                selected: 30,
                required: 31
            })
        );
    }

    #[test]
    fn test_no_coins() {
        assert_eq!(
            select_coins(Vec::new(), 1, CoinSelectionMode::Smallest),
            Err(CoinSelectionError::NoSpendableCoins)
        );
    }

    #[test]
    fn test_no_overflow() -> anyhow::Result<()> {
        let selected = select_coins(coins(&[u64::MAX, u64::MAX]), u64::MAX, CoinSelectionMode::Largest)?;
        assert_eq!(selected.len(), 1);
        Ok(())
    }
}
