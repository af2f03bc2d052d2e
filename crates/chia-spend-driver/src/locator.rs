use chia_protocol::Bytes32;
use chia_spend_coinset::{CoinRecord, Ledger};
use tracing::debug;

use crate::DriverError;

/// Finds the first confirmed, unspent coin locked by `puzzle_hash`.
///
/// A single query is made. Failures are returned as is for the caller to
/// retry once the ledger has changed.
pub async fn find_spendable_coin<L>(
    ledger: &L,
    puzzle_hash: Bytes32,
) -> Result<CoinRecord, DriverError>
where
    L: Ledger,
{
    let records = ledger.coin_records_by_puzzle_hash(puzzle_hash).await?;
    debug!(%puzzle_hash, count = records.len(), "queried coin records");

    records
        .into_iter()
        .find(CoinRecord::is_spendable)
        .ok_or(DriverError::NoSpendableCoin(puzzle_hash))
}

/// Every confirmed, unspent coin locked by any of `puzzle_hashes`.
pub async fn find_spendable_coins<L>(
    ledger: &L,
    puzzle_hashes: &[Bytes32],
) -> Result<Vec<CoinRecord>, DriverError>
where
    L: Ledger,
{
    if puzzle_hashes.is_empty() {
        return Ok(Vec::new());
    }

    let records = ledger
        .coin_records_by_puzzle_hashes(puzzle_hashes, false)
        .await?;

    Ok(records
        .into_iter()
        .filter(CoinRecord::is_spendable)
        .collect())
}
