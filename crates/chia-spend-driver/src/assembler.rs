use std::collections::HashSet;

use chia_bls::Signature;
use chia_protocol::{CoinSpend, SpendBundle};

use crate::DriverError;

/// Packages coin spends with their aggregate signature.
///
/// Only the shape is checked here. Amounts and signatures are established
/// before assembly.
pub fn assemble(
    coin_spends: Vec<CoinSpend>,
    aggregated_signature: Signature,
) -> Result<SpendBundle, DriverError> {
    if coin_spends.is_empty() {
        return Err(DriverError::EmptyBundle);
    }

    let mut coin_ids = HashSet::with_capacity(coin_spends.len());
    for coin_spend in &coin_spends {
        let coin_id = coin_spend.coin.coin_id();
        if !coin_ids.insert(coin_id) {
            return Err(DriverError::DuplicateCoin(coin_id));
        }
    }

    Ok(SpendBundle::new(coin_spends, aggregated_signature))
}
