use std::collections::HashSet;

use chia_consensus::{consensus_constants::ConsensusConstants, validation_error::ErrorCode};
use chia_protocol::{Bytes32, Coin, SpendBundle};
use chia_spend_coinset::CoinRecord;
use chia_spend_types::MAX_BLOCK_COST;
use indexmap::{IndexMap, IndexSet};

use crate::{validate_clvm_and_signature, SimulatorError};

const BLOCK_TIME: u64 = 18;

#[derive(Debug, Clone)]
pub(crate) struct SimulatorData {
    height: u32,
    coin_records: IndexMap<Bytes32, CoinRecord>,
    spend_bundles: Vec<SpendBundle>,
}

impl Default for SimulatorData {
    fn default() -> Self {
        Self {
            height: 1,
            coin_records: IndexMap::new(),
            spend_bundles: Vec::new(),
        }
    }
}

impl SimulatorData {
    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn create_coin(&mut self, coin: Coin, confirmed: bool) {
        let confirmed_block_index = if confirmed { self.height } else { 0 };
        self.coin_records.insert(
            coin.coin_id(),
            CoinRecord {
                coin,
                coinbase: false,
                confirmed_block_index,
                spent: false,
                spent_block_index: 0,
                timestamp: u64::from(confirmed_block_index) * BLOCK_TIME,
            },
        );
    }

    pub(crate) fn coin_record(&self, coin_id: Bytes32) -> Option<CoinRecord> {
        self.coin_records.get(&coin_id).copied()
    }

    pub(crate) fn lookup_puzzle_hashes(
        &self,
        puzzle_hashes: &HashSet<Bytes32>,
        include_spent: bool,
    ) -> Vec<CoinRecord> {
        self.coin_records
            .values()
            .filter(|record| {
                puzzle_hashes.contains(&record.coin.puzzle_hash) && (include_spent || !record.spent)
            })
            .copied()
            .collect()
    }

    pub(crate) fn spend_bundles(&self) -> &[SpendBundle] {
        &self.spend_bundles
    }

    /// Validates a spend bundle against the current coin set and, if it is
    /// valid, applies it in a new block. Nothing changes on failure.
    pub(crate) fn new_transaction(
        &mut self,
        spend_bundle: &SpendBundle,
        constants: &ConsensusConstants,
    ) -> Result<Vec<Coin>, SimulatorError> {
        if spend_bundle.coin_spends.is_empty() {
            return Err(ErrorCode::InvalidSpendBundle.into());
        }

        let conds = validate_clvm_and_signature(spend_bundle, MAX_BLOCK_COST, constants, 0)?;

        let mut removals = IndexSet::new();
        let mut additions = Vec::new();

        for spend in &conds.spends {
            if !removals.insert(spend.coin_id) {
                return Err(ErrorCode::DoubleSpend.into());
            }

            let Some(record) = self.coin_records.get(&spend.coin_id) else {
                return Err(ErrorCode::UnknownUnspent.into());
            };

            if !record.is_confirmed() {
                return Err(ErrorCode::UnknownUnspent.into());
            }

            if record.spent {
                return Err(ErrorCode::DoubleSpend.into());
            }

            for &(puzzle_hash, amount, _) in &spend.create_coin {
                additions.push(Coin::new(spend.coin_id, puzzle_hash, amount));
            }
        }

        self.height += 1;

        for coin_id in removals {
            if let Some(record) = self.coin_records.get_mut(&coin_id) {
                record.spent = true;
                record.spent_block_index = self.height;
            }
        }

        for &coin in &additions {
            self.create_coin(coin, true);
        }

        self.spend_bundles.push(spend_bundle.clone());

        Ok(additions)
    }
}
