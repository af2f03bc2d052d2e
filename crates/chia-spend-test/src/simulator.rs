use std::collections::HashSet;

use bip39::Mnemonic;
use chia_bls::SecretKey;
use chia_consensus::consensus_constants::ConsensusConstants;
use chia_protocol::{Bytes32, Coin, SpendBundle};
use chia_spend_coinset::{CoinRecord, Ledger, LedgerError};
use chia_spend_types::TESTNET11_GENESIS_CHALLENGE;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use simulator_data::SimulatorData;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{consensus_constants, SimulatorError};

mod simulator_data;

/// An in-memory ledger that validates spend bundles with the full node's
/// consensus rules, then applies them one block at a time.
#[derive(Debug)]
pub struct Simulator {
    rng: Mutex<ChaCha8Rng>,
    data: Mutex<SimulatorData>,
    constants: ConsensusConstants,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self::with_genesis_challenge(TESTNET11_GENESIS_CHALLENGE)
    }

    pub fn with_genesis_challenge(genesis_challenge: Bytes32) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(0)),
            data: Mutex::new(SimulatorData::default()),
            constants: consensus_constants(genesis_challenge),
        }
    }

    pub fn genesis_challenge(&self) -> Bytes32 {
        self.constants.genesis_challenge
    }

    /// Creates a confirmed coin with a random parent.
    pub async fn mint_coin(&self, puzzle_hash: Bytes32, amount: u64) -> Coin {
        self.mint(puzzle_hash, amount, true).await
    }

    /// Creates a coin that is known to the ledger but not yet in a block.
    pub async fn mint_pending_coin(&self, puzzle_hash: Bytes32, amount: u64) -> Coin {
        self.mint(puzzle_hash, amount, false).await
    }

    async fn mint(&self, puzzle_hash: Bytes32, amount: u64, confirmed: bool) -> Coin {
        let coin = Coin::new(
            Bytes32::new(self.rng.lock().await.gen()),
            puzzle_hash,
            amount,
        );
        self.data.lock().await.create_coin(coin, confirmed);
        coin
    }

    pub async fn coin_record(&self, coin_id: Bytes32) -> Option<CoinRecord> {
        self.data.lock().await.coin_record(coin_id)
    }

    pub async fn height(&self) -> u32 {
        self.data.lock().await.height()
    }

    /// Every spend bundle the simulator has accepted, in order.
    pub async fn spend_bundles(&self) -> Vec<SpendBundle> {
        self.data.lock().await.spend_bundles().to_vec()
    }

    pub async fn secret_key(&self) -> Result<SecretKey, bip39::Error> {
        let entropy: [u8; 32] = self.rng.lock().await.gen();
        let mnemonic = Mnemonic::from_entropy(&entropy)?;
        let seed = mnemonic.to_seed("");
        Ok(SecretKey::from_seed(&seed))
    }

    /// Validates and applies a spend bundle, returning the coins it created.
    pub async fn spend_bundle(&self, spend_bundle: &SpendBundle) -> Result<Vec<Coin>, SimulatorError> {
        let mut data = self.data.lock().await;
        let additions = data.new_transaction(spend_bundle, &self.constants)?;
        info!(
            height = data.height(),
            spends = spend_bundle.coin_spends.len(),
            additions = additions.len(),
            "applied spend bundle"
        );
        Ok(additions)
    }
}

impl Ledger for Simulator {
    async fn coin_records_by_puzzle_hash(
        &self,
        puzzle_hash: Bytes32,
    ) -> Result<Vec<CoinRecord>, LedgerError> {
        Ok(self
            .data
            .lock()
            .await
            .lookup_puzzle_hashes(&HashSet::from([puzzle_hash]), false))
    }

    async fn coin_records_by_puzzle_hashes(
        &self,
        puzzle_hashes: &[Bytes32],
        include_spent: bool,
    ) -> Result<Vec<CoinRecord>, LedgerError> {
        let puzzle_hashes: HashSet<Bytes32> = puzzle_hashes.iter().copied().collect();
        Ok(self
            .data
            .lock()
            .await
            .lookup_puzzle_hashes(&puzzle_hashes, include_spent))
    }

    async fn push_spend_bundle(&self, spend_bundle: &SpendBundle) -> Result<(), LedgerError> {
        self.spend_bundle(spend_bundle).await.map_err(|error| {
            debug!(%error, "simulator rejected spend bundle");
            LedgerError::Rejected(error.to_string())
        })?;
        Ok(())
    }

    async fn genesis_challenge(&self) -> Result<Option<Bytes32>, LedgerError> {
        Ok(Some(self.genesis_challenge()))
    }
}
