use std::collections::HashMap;

use chia_bls::{PublicKey, SecretKey};
use chia_protocol::{Bytes32, SpendBundle};
use chia_spend_coinset::Ledger;
use chia_spend_signer::{
    sign_and_aggregate, verify_aggregate, KeyStore, RequiredSignature, SignerError,
};
use tracing::{info, instrument, warn};

use crate::{
    assemble, build_funding_spends, find_spendable_coins, find_unused_indices, select_coins,
    standard_puzzle_hashes, CoinSelectionMode, DriverError, FundingInput, Idle, NetworkConfig,
    Payment, SignaturePuzzle, Spend, SpendOptions, StandardPuzzle,
};

/// Builds, signs and submits spends against a ledger for one network.
#[derive(Debug)]
pub struct SpendEngine<L> {
    ledger: L,
    network: NetworkConfig,
    options: SpendOptions,
}

impl<L> SpendEngine<L> {
    pub fn new(ledger: L, network: NetworkConfig) -> Self {
        Self {
            ledger,
            network,
            options: SpendOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: SpendOptions) -> Self {
        self.options = options;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn options(&self) -> &SpendOptions {
        &self.options
    }

    /// Starts a spend of a coin locked by the signature puzzle for `public_key`.
    pub fn begin(&self, public_key: PublicKey) -> Spend<'_, L, Idle> {
        Spend::new(self, SignaturePuzzle::new(public_key), Idle)
    }

    /// Checks the aggregate signature against what the bundle's puzzles
    /// require, when local verification is turned on.
    pub(crate) fn verify_if_enabled(&self, spend_bundle: &SpendBundle) -> Result<(), DriverError> {
        if !self.options.verify_before_submit {
            return Ok(());
        }

        let required = RequiredSignature::from_coin_spends(
            &spend_bundle.coin_spends,
            self.network.genesis_challenge,
        )?;

        if !verify_aggregate(&required, &spend_bundle.aggregated_signature) {
            return Err(DriverError::SignatureVerification);
        }

        Ok(())
    }
}

impl<L> SpendEngine<L>
where
    L: Ledger,
{
    /// Fails if the ledger reports a genesis challenge other than the
    /// configured one. Ledgers that don't report one are accepted.
    #[instrument(skip_all, fields(network = %self.network.network_id))]
    pub async fn check_network(&self) -> Result<(), DriverError> {
        let Some(actual) = self.ledger.genesis_challenge().await? else {
            return Ok(());
        };

        let expected = self.network.genesis_challenge;
        if actual != expected {
            warn!(%expected, %actual, "genesis challenge mismatch");
            return Err(DriverError::NetworkMismatch { expected, actual });
        }

        Ok(())
    }

    /// Spends the first spendable coin locked by the signature puzzle of
    /// `secret_key` to `recipient`, paying the configured fee.
    #[instrument(skip_all, fields(%recipient))]
    pub async fn spend_signature_coin(
        &self,
        secret_key: &SecretKey,
        recipient: Bytes32,
    ) -> Result<SpendBundle, DriverError> {
        let spend = self
            .begin(secret_key.public_key())
            .locate()
            .await?
            .build_conditions(recipient, self.options.fee)?
            .sign(secret_key)?
            .assemble()?
            .submit()
            .await?;

        Ok(spend.into_spend_bundle())
    }

    /// Spends the signature puzzle coin to the first unused standard address
    /// of the wallet.
    #[instrument(skip_all)]
    pub async fn spend_to_unused_address<K>(
        &self,
        secret_key: &SecretKey,
        key_store: &K,
    ) -> Result<SpendBundle, DriverError>
    where
        K: KeyStore,
    {
        let index = self.first_unused_index(key_store).await?;
        let recipient = StandardPuzzle::puzzle_hash_for(key_store.public_key(index));
        info!(index, %recipient, "sending to unused address");
        self.spend_signature_coin(secret_key, recipient).await
    }

    /// Sends `amount` from the standard wallet coins of `key_store` to
    /// `puzzle_hash`, with change returned to the first unused address.
    #[instrument(skip_all, fields(%puzzle_hash, amount = amount))]
    pub async fn fund<K>(
        &self,
        key_store: &K,
        puzzle_hash: Bytes32,
        amount: u64,
    ) -> Result<SpendBundle, DriverError>
    where
        K: KeyStore,
    {
        let fee = self.options.fee;
        let required = amount.checked_add(fee).ok_or(DriverError::AmountOverflow)?;

        let derivations = standard_puzzle_hashes(key_store, 0..self.options.scan_limit);
        let indices = derivations
            .iter()
            .map(|&(index, puzzle_hash)| (puzzle_hash, index))
            .collect::<HashMap<Bytes32, u32>>();
        let puzzle_hashes = derivations
            .iter()
            .map(|(_, puzzle_hash)| *puzzle_hash)
            .collect::<Vec<_>>();

        let records = find_spendable_coins(&self.ledger, &puzzle_hashes).await?;
        let coins = select_coins(
            records.into_iter().map(|record| record.coin).collect(),
            required,
            CoinSelectionMode::Largest,
        )?;

        let mut inputs = Vec::with_capacity(coins.len());
        let mut secret_keys = Vec::with_capacity(coins.len());

        for coin in coins {
            let &index = indices
                .get(&coin.puzzle_hash)
                .ok_or(DriverError::UnknownPuzzleHash(coin.puzzle_hash))?;
            let synthetic_key = key_store.public_key(index);
            let secret_key = key_store
                .secret_key(index)
                .ok_or(SignerError::MissingKey(synthetic_key))?;

            inputs.push(FundingInput {
                coin,
                synthetic_key,
            });
            secret_keys.push(secret_key);
        }

        let change_index = self.first_unused_index(key_store).await?;
        let payment = Payment {
            puzzle_hash,
            amount,
            fee,
            change_puzzle_hash: StandardPuzzle::puzzle_hash_for(key_store.public_key(change_index)),
        };

        let spends = build_funding_spends(&inputs, &payment, self.network.genesis_challenge)?;
        let signature = sign_and_aggregate(&spends.required_signatures, &secret_keys)?;
        let spend_bundle = assemble(spends.coin_spends, signature)?;
        self.verify_if_enabled(&spend_bundle)?;

        self.ledger.push_spend_bundle(&spend_bundle).await?;

        info!(
            inputs = inputs.len(),
            change_index,
            spend_bundle_id = %spend_bundle.name(),
            "submitted funding spend"
        );

        Ok(spend_bundle)
    }

    async fn first_unused_index<K>(&self, key_store: &K) -> Result<u32, DriverError>
    where
        K: KeyStore,
    {
        let scan_limit = self.options.scan_limit;
        find_unused_indices(&self.ledger, key_store, 1, scan_limit, &[])
            .await?
            .first()
            .copied()
            .ok_or(DriverError::NoUnusedIndex {
                scanned: scan_limit,
            })
    }
}

#[cfg(test)]
mod tests {
    use chia_bls::verify;
    use chia_protocol::Coin;
    use chia_spend_coinset::{CoinRecord, LedgerError};
    use chia_spend_program::Program;
    use chia_spend_signer::{secret_key_from_mnemonic, SecretKeyStore};
    use chia_spend_test::{BlsPair, Simulator};
    use chia_spend_types::{MAINNET_GENESIS_CHALLENGE, TESTNET11_GENESIS_CHALLENGE};
    use hex_literal::hex;

    use crate::SpendStage;

    use super::*;

    const RECIPIENT: Bytes32 = Bytes32::new(hex!(
        "4bc6435b409bcbabe53870dae0f03755f6aabb4594c5915ec983acf12a5d1fba"
    ));

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn engine(fee: u64) -> SpendEngine<Simulator> {
        SpendEngine::new(Simulator::new(), NetworkConfig::testnet11()).with_options(SpendOptions {
            fee,
            ..SpendOptions::default()
        })
    }

    #[tokio::test]
    async fn test_spend_scenario() -> anyhow::Result<()> {
        let engine = engine(50_000);
        let pair = BlsPair::new(0);
        let puzzle = SignaturePuzzle::new(pair.pk);

        let coin = engine
            .ledger()
            .mint_coin(puzzle.puzzle_hash(), 1_000_000_000)
            .await;

        let spend_bundle = engine.spend_signature_coin(&pair.sk, RECIPIENT).await?;

        let conditions = Program::from_source(&format!("((51 0x{} 999950000))", hex::encode(RECIPIENT)))?;
        let coin_spend = &spend_bundle.coin_spends[0];
        assert_eq!(coin_spend.coin, coin);
        assert_eq!(
            Program::try_from(&coin_spend.solution)?,
            Program::list([conditions.clone()])
        );
        assert_eq!(Program::try_from(&coin_spend.puzzle_reveal)?.hash(), coin.puzzle_hash);

        let mut message = conditions.hash().to_vec();
        message.extend(coin.coin_id().to_bytes());
        message.extend(TESTNET11_GENESIS_CHALLENGE.to_bytes());
        assert!(verify(&spend_bundle.aggregated_signature, &pair.pk, message));

        let spent = engine
            .ledger()
            .coin_record(coin.coin_id())
            .await
            .expect("coin record");
        assert!(spent.spent);

        let child = Coin::new(coin.coin_id(), RECIPIENT, 999_950_000);
        let record = engine
            .ledger()
            .coin_record(child.coin_id())
            .await
            .expect("child record");
        assert!(record.is_spendable());

        Ok(())
    }

    #[tokio::test]
    async fn test_insufficient_funds() -> anyhow::Result<()> {
        let engine = engine(1000);
        let pair = BlsPair::new(0);
        let puzzle = SignaturePuzzle::new(pair.pk);
        engine.ledger().mint_coin(puzzle.puzzle_hash(), 100).await;

        assert!(matches!(
            engine.spend_signature_coin(&pair.sk, RECIPIENT).await,
            Err(DriverError::InsufficientFunds {
                amount: 100,
                fee: 1000
            })
        ));
        assert!(engine.ledger().spend_bundles().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_no_spendable_coin() {
        let engine = engine(0);
        let pair = BlsPair::new(0);

        assert!(matches!(
            engine.spend_signature_coin(&pair.sk, RECIPIENT).await,
            Err(DriverError::NoSpendableCoin(puzzle_hash))
                if puzzle_hash == SignaturePuzzle::new(pair.pk).puzzle_hash()
        ));
        assert!(engine.ledger().spend_bundles().await.is_empty());
    }

    #[tokio::test]
    async fn test_stages() -> anyhow::Result<()> {
        let engine = engine(10);
        let pair = BlsPair::new(0);
        let coin = engine
            .ledger()
            .mint_coin(SignaturePuzzle::new(pair.pk).puzzle_hash(), 100)
            .await;

        let spend = engine.begin(pair.pk);
        assert_eq!(spend.stage(), SpendStage::Idle);

        let spend = spend.locate().await?;
        assert_eq!(spend.stage(), SpendStage::CoinLocated);
        assert_eq!(spend.coin_record().coin, coin);

        let spend = spend.build_conditions(RECIPIENT, 10)?;
        assert_eq!(spend.stage(), SpendStage::ConditionsBuilt);
        assert_eq!(spend.solution(), Program::list([spend.conditions().clone()]));

        let spend = spend.sign(&pair.sk)?;
        assert_eq!(spend.stage(), SpendStage::Signed);
        assert_eq!(spend.coin_spend().coin, coin);

        let spend = spend.assemble()?;
        assert_eq!(spend.stage(), SpendStage::Assembled);
        assert_eq!(spend.spend_bundle().coin_spends.len(), 1);

        let spend = spend.submit().await?;
        assert_eq!(spend.stage(), SpendStage::Submitted);
        assert_eq!(SpendStage::Submitted.to_string(), "submitted");

        Ok(())
    }

    #[tokio::test]
    async fn test_deterministic_signature() -> anyhow::Result<()> {
        let engine = engine(10);
        let pair = BlsPair::new(0);
        engine
            .ledger()
            .mint_coin(SignaturePuzzle::new(pair.pk).puzzle_hash(), 100)
            .await;

        let first = engine
            .begin(pair.pk)
            .locate()
            .await?
            .build_conditions(RECIPIENT, 10)?
            .sign(&pair.sk)?;
        let second = engine
            .begin(pair.pk)
            .locate()
            .await?
            .build_conditions(RECIPIENT, 10)?
            .sign(&pair.sk)?;

        assert_eq!(first.signature(), second.signature());
        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_key() -> anyhow::Result<()> {
        let engine = engine(0);
        let [owner, other] = BlsPair::range::<2>();
        engine
            .ledger()
            .mint_coin(SignaturePuzzle::new(owner.pk).puzzle_hash(), 100)
            .await;

        let result = engine
            .begin(owner.pk)
            .locate()
            .await?
            .build_conditions(RECIPIENT, 0)?
            .sign(&other.sk);

        assert!(matches!(
            result,
            Err(DriverError::Signer(SignerError::MissingKey(public_key))) if public_key == owner.pk
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_coin_rejected() -> anyhow::Result<()> {
        let engine = engine(0);
        let pair = BlsPair::new(0);
        engine
            .ledger()
            .mint_coin(SignaturePuzzle::new(pair.pk).puzzle_hash(), 100)
            .await;

        let first = engine.begin(pair.pk).locate().await?;
        let second = engine.begin(pair.pk).locate().await?;

        first
            .build_conditions(RECIPIENT, 0)?
            .sign(&pair.sk)?
            .assemble()?
            .submit()
            .await?;

        let result = second
            .build_conditions(RECIPIENT, 0)?
            .sign(&pair.sk)?
            .assemble()?
            .submit()
            .await;

        assert!(matches!(
            result,
            Err(DriverError::SubmissionRejected(reason)) if reason.contains("DoubleSpend")
        ));

        assert!(matches!(
            engine.spend_signature_coin(&pair.sk, RECIPIENT).await,
            Err(DriverError::NoSpendableCoin(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_network_rejected() -> anyhow::Result<()> {
        let engine = SpendEngine::new(Simulator::new(), NetworkConfig::mainnet());
        let pair = BlsPair::new(0);
        engine
            .ledger()
            .mint_coin(SignaturePuzzle::new(pair.pk).puzzle_hash(), 100_000_000)
            .await;

        assert!(matches!(
            engine.check_network().await,
            Err(DriverError::NetworkMismatch { expected, actual })
                if expected == MAINNET_GENESIS_CHALLENGE && actual == TESTNET11_GENESIS_CHALLENGE
        ));
        assert!(matches!(
            engine.spend_signature_coin(&pair.sk, RECIPIENT).await,
            Err(DriverError::SubmissionRejected(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_verify_before_submit() -> anyhow::Result<()> {
        let engine = SpendEngine::new(Simulator::new(), NetworkConfig::testnet11()).with_options(
            SpendOptions {
                fee: 0,
                verify_before_submit: true,
                ..SpendOptions::default()
            },
        );
        engine.check_network().await?;

        let pair = BlsPair::new(0);
        engine
            .ledger()
            .mint_coin(SignaturePuzzle::new(pair.pk).puzzle_hash(), 1)
            .await;

        engine.spend_signature_coin(&pair.sk, RECIPIENT).await?;
        assert_eq!(engine.ledger().spend_bundles().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_spend_to_unused_address() -> anyhow::Result<()> {
        let engine = engine(50_000_000);
        let root_key = secret_key_from_mnemonic(PHRASE, "")?;
        let key_store = SecretKeyStore::new(root_key.clone());

        let used = StandardPuzzle::puzzle_hash_for(key_store.public_key(0));
        engine.ledger().mint_coin(used, 1).await;

        let coin = engine
            .ledger()
            .mint_coin(SignaturePuzzle::new(root_key.public_key()).puzzle_hash(), 1_000_000_000)
            .await;

        engine.spend_to_unused_address(&root_key, &key_store).await?;

        let target = StandardPuzzle::puzzle_hash_for(key_store.public_key(1));
        let child = Coin::new(coin.coin_id(), target, 950_000_000);
        assert!(engine.ledger().coin_record(child.coin_id()).await.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_fund_then_spend() -> anyhow::Result<()> {
        let engine = engine(50_000_000);
        let root_key = secret_key_from_mnemonic(PHRASE, "")?;
        let key_store = SecretKeyStore::new(root_key.clone());
        let signature_puzzle = SignaturePuzzle::new(root_key.public_key());

        for (index, amount) in [(0, 6_000_000_000), (1, 5_000_000_000)] {
            let puzzle_hash = StandardPuzzle::puzzle_hash_for(key_store.public_key(index));
            engine.ledger().mint_coin(puzzle_hash, amount).await;
        }

        let spend_bundle = engine
            .fund(&key_store, signature_puzzle.puzzle_hash(), 10_000_000_000)
            .await?;
        assert_eq!(spend_bundle.coin_spends.len(), 2);

        let funded = find_spendable_coins(engine.ledger(), &[signature_puzzle.puzzle_hash()]).await?;
        assert_eq!(funded.len(), 1);
        assert_eq!(funded[0].coin.amount, 10_000_000_000);

        let change_puzzle_hash = StandardPuzzle::puzzle_hash_for(key_store.public_key(2));
        let change = find_spendable_coins(engine.ledger(), &[change_puzzle_hash]).await?;
        assert_eq!(change.len(), 1);
        assert_eq!(change[0].coin.amount, 950_000_000);

        engine
            .spend_to_unused_address(&root_key, &key_store)
            .await?;

        let target = StandardPuzzle::puzzle_hash_for(key_store.public_key(3));
        let received = find_spendable_coins(engine.ledger(), &[target]).await?;
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].coin.amount, 9_950_000_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_fund_insufficient_balance() -> anyhow::Result<()> {
        let engine = engine(0);
        let key_store = SecretKeyStore::new(secret_key_from_mnemonic(PHRASE, "")?);
        let puzzle_hash = StandardPuzzle::puzzle_hash_for(key_store.public_key(0));
        engine.ledger().mint_coin(puzzle_hash, 10).await;

        assert!(matches!(
            engine.fund(&key_store, Bytes32::default(), 11).await,
            Err(DriverError::CoinSelection(_))
        ));
        Ok(())
    }

    /// Returns records for one puzzle hash the wallet never asked about, on
    /// top of the ones it did.
    struct ForeignCoinLedger {
        sim: Simulator,
        foreign: Bytes32,
    }

    impl Ledger for ForeignCoinLedger {
        async fn coin_records_by_puzzle_hash(
            &self,
            puzzle_hash: Bytes32,
        ) -> Result<Vec<CoinRecord>, LedgerError> {
            self.sim.coin_records_by_puzzle_hash(puzzle_hash).await
        }

        async fn coin_records_by_puzzle_hashes(
            &self,
            puzzle_hashes: &[Bytes32],
            include_spent: bool,
        ) -> Result<Vec<CoinRecord>, LedgerError> {
            let mut puzzle_hashes = puzzle_hashes.to_vec();
            puzzle_hashes.push(self.foreign);
            self.sim
                .coin_records_by_puzzle_hashes(&puzzle_hashes, include_spent)
                .await
        }

        async fn push_spend_bundle(&self, spend_bundle: &SpendBundle) -> Result<(), LedgerError> {
            self.sim.push_spend_bundle(spend_bundle).await
        }

        async fn genesis_challenge(&self) -> Result<Option<Bytes32>, LedgerError> {
            Ledger::genesis_challenge(&self.sim).await
        }
    }

    #[tokio::test]
    async fn test_fund_rejects_coin_outside_wallet() -> anyhow::Result<()> {
        let key_store = SecretKeyStore::new(secret_key_from_mnemonic(PHRASE, "")?);
        let foreign = Bytes32::new([3; 32]);

        let sim = Simulator::new();
        sim.mint_coin(foreign, 1_000).await;
        sim.mint_coin(StandardPuzzle::puzzle_hash_for(key_store.public_key(0)), 10)
            .await;

        let engine = SpendEngine::new(ForeignCoinLedger { sim, foreign }, NetworkConfig::testnet11());
        assert!(matches!(
            engine.fund(&key_store, Bytes32::default(), 500).await,
            Err(DriverError::UnknownPuzzleHash(puzzle_hash)) if puzzle_hash == foreign
        ));
        assert!(engine.ledger().sim.spend_bundles().await.is_empty());
        Ok(())
    }
}
