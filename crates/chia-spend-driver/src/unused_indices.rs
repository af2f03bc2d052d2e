use std::collections::HashSet;

use chia_protocol::Bytes32;
use chia_spend_coinset::Ledger;
use chia_spend_signer::KeyStore;
use tracing::debug;

use crate::{DriverError, StandardPuzzle};

const BATCH_SIZE: u32 = 50;

/// The standard puzzle hash of every index in `indices`, paired with the index.
pub fn standard_puzzle_hashes<K>(
    key_store: &K,
    indices: impl IntoIterator<Item = u32>,
) -> Vec<(u32, Bytes32)>
where
    K: KeyStore,
{
    indices
        .into_iter()
        .map(|index| {
            (
                index,
                StandardPuzzle::puzzle_hash_for(key_store.public_key(index)),
            )
        })
        .collect()
}

/// Finds the first `count` derivation indices whose standard puzzle hash has
/// never held a coin, scanning at most `scan_limit` indices from zero.
///
/// Indices in `excluded` are treated as used, so repeated calls can hand out
/// distinct addresses before any coins arrive.
pub async fn find_unused_indices<L, K>(
    ledger: &L,
    key_store: &K,
    count: usize,
    scan_limit: u32,
    excluded: &[u32],
) -> Result<Vec<u32>, DriverError>
where
    L: Ledger,
    K: KeyStore,
{
    let excluded = excluded.iter().copied().collect::<HashSet<u32>>();
    let mut unused = Vec::with_capacity(count);
    let mut start = 0;

    while unused.len() < count && start < scan_limit {
        let end = start.saturating_add(BATCH_SIZE).min(scan_limit);
        let derivations = standard_puzzle_hashes(
            key_store,
            (start..end).filter(|index| !excluded.contains(index)),
        );

        let puzzle_hashes = derivations
            .iter()
            .map(|(_, puzzle_hash)| *puzzle_hash)
            .collect::<Vec<_>>();

        let used = if puzzle_hashes.is_empty() {
            HashSet::new()
        } else {
            ledger
                .coin_records_by_puzzle_hashes(&puzzle_hashes, true)
                .await?
                .into_iter()
                .map(|record| record.coin.puzzle_hash)
                .collect::<HashSet<_>>()
        };

        unused.extend(
            derivations
                .into_iter()
                .filter(|(_, puzzle_hash)| !used.contains(puzzle_hash))
                .map(|(index, _)| index)
                .take(count - unused.len()),
        );

        start = end;
    }

    if unused.len() < count {
        return Err(DriverError::NoUnusedIndex {
            scanned: scan_limit,
        });
    }

    debug!(?unused, "found unused derivation indices");
    Ok(unused)
}

#[cfg(test)]
mod tests {
    use chia_protocol::SpendBundle;
    use chia_spend_program::Program;
    use chia_spend_signer::{secret_key_from_mnemonic, sign_and_aggregate, SecretKeyStore};
    use chia_spend_test::Simulator;

    use super::*;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn key_store() -> anyhow::Result<SecretKeyStore> {
        Ok(SecretKeyStore::new(secret_key_from_mnemonic(PHRASE, "")?))
    }

    fn puzzle_hash(key_store: &SecretKeyStore, index: u32) -> Bytes32 {
        StandardPuzzle::puzzle_hash_for(key_store.public_key(index))
    }

    #[tokio::test]
    async fn test_first_gap() -> anyhow::Result<()> {
        let sim = Simulator::new();
        let key_store = key_store()?;

        sim.mint_coin(puzzle_hash(&key_store, 0), 1).await;
        sim.mint_coin(puzzle_hash(&key_store, 1), 1).await;
        sim.mint_coin(puzzle_hash(&key_store, 3), 1).await;

        assert_eq!(
            find_unused_indices(&sim, &key_store, 1, 10, &[]).await?,
            vec![2]
        );
        assert_eq!(
            find_unused_indices(&sim, &key_store, 3, 10, &[]).await?,
            vec![2, 4, 5]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_excluded() -> anyhow::Result<()> {
        let sim = Simulator::new();
        let key_store = key_store()?;

        assert_eq!(
            find_unused_indices(&sim, &key_store, 2, 10, &[0, 2]).await?,
            vec![1, 3]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_spent_coin_marks_used() -> anyhow::Result<()> {
        let sim = Simulator::new();
        let key_store = key_store()?;

        let puzzle = StandardPuzzle::new(key_store.public_key(0));
        let coin = sim.mint_coin(puzzle.puzzle_hash(), 0).await;
        let conditions = Program::nil();

        let required = puzzle.required_signature(&coin, &conditions, sim.genesis_challenge());
        let signature = sign_and_aggregate(
            &[required],
            &[key_store.secret_key(0).expect("secret key")],
        )?;
        sim.spend_bundle(&SpendBundle::new(
            vec![puzzle.spend(coin, &conditions)],
            signature,
        ))
        .await?;

        let record = sim.coin_record(coin.coin_id()).await.expect("coin record");
        assert!(record.spent);
        assert_eq!(
            find_unused_indices(&sim, &key_store, 1, 10, &[]).await?,
            vec![1]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_scan_limit() -> anyhow::Result<()> {
        let sim = Simulator::new();
        let key_store = key_store()?;

        for index in 0..3 {
            sim.mint_coin(puzzle_hash(&key_store, index), 1).await;
        }

        assert!(matches!(
            find_unused_indices(&sim, &key_store, 1, 3, &[]).await,
            Err(DriverError::NoUnusedIndex { scanned: 3 })
        ));
        assert!(matches!(
            find_unused_indices(&sim, &key_store, 2, 4, &[]).await,
            Err(DriverError::NoUnusedIndex { scanned: 4 })
        ));
        assert!(find_unused_indices(&sim, &key_store, 0, 0, &[]).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_spans_batches() -> anyhow::Result<()> {
        let sim = Simulator::new();
        let key_store = key_store()?;

        for index in 0..60 {
            sim.mint_coin(puzzle_hash(&key_store, index), 1).await;
        }

        assert_eq!(
            find_unused_indices(&sim, &key_store, 1, 100, &[]).await?,
            vec![60]
        );
        Ok(())
    }
}
