use std::{fmt, future::Future};

use chia_protocol::{Bytes32, SpendBundle};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{ChiaRpcClient, CoinRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("full node returned an error: {0}")]
    Node(String),

    #[error("spend bundle rejected: {0}")]
    Rejected(String),
}

/// The view of the chain needed to locate coins and submit spends.
///
/// Implemented over any [`ChiaRpcClient`] by [`RpcLedger`], and by in-memory
/// simulators for tests.
pub trait Ledger {
    /// Unspent coin records locked by a puzzle hash.
    fn coin_records_by_puzzle_hash(
        &self,
        puzzle_hash: Bytes32,
    ) -> impl Future<Output = Result<Vec<CoinRecord>, LedgerError>>;

    /// Coin records for several puzzle hashes at once, optionally including
    /// coins that have already been spent.
    fn coin_records_by_puzzle_hashes(
        &self,
        puzzle_hashes: &[Bytes32],
        include_spent: bool,
    ) -> impl Future<Output = Result<Vec<CoinRecord>, LedgerError>>;

    fn push_spend_bundle(
        &self,
        spend_bundle: &SpendBundle,
    ) -> impl Future<Output = Result<(), LedgerError>>;

    /// The genesis challenge the ledger reports, if it reports one.
    fn genesis_challenge(&self) -> impl Future<Output = Result<Option<Bytes32>, LedgerError>>;
}

/// A [`Ledger`] backed by full node RPC calls.
#[derive(Debug, Clone)]
pub struct RpcLedger<C> {
    client: C,
}

impl<C> RpcLedger<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

fn request_error(error: impl fmt::Display) -> LedgerError {
    LedgerError::Request(error.to_string())
}

fn node_error(error: Option<String>) -> LedgerError {
    LedgerError::Node(error.unwrap_or_else(|| "unknown error".to_string()))
}

impl<C> Ledger for RpcLedger<C>
where
    C: ChiaRpcClient,
    C::Error: fmt::Display,
{
    async fn coin_records_by_puzzle_hash(
        &self,
        puzzle_hash: Bytes32,
    ) -> Result<Vec<CoinRecord>, LedgerError> {
        let response = self
            .client
            .get_coin_records_by_puzzle_hash(puzzle_hash, None, None, Some(false))
            .await
            .map_err(request_error)?;

        if !response.success {
            return Err(node_error(response.error));
        }

        let records = response.coin_records.unwrap_or_default();
        debug!(%puzzle_hash, count = records.len(), "fetched coin records");
        Ok(records)
    }

    async fn coin_records_by_puzzle_hashes(
        &self,
        puzzle_hashes: &[Bytes32],
        include_spent: bool,
    ) -> Result<Vec<CoinRecord>, LedgerError> {
        let response = self
            .client
            .get_coin_records_by_puzzle_hashes(
                puzzle_hashes.to_vec(),
                None,
                None,
                Some(include_spent),
            )
            .await
            .map_err(request_error)?;

        if !response.success {
            return Err(node_error(response.error));
        }

        Ok(response.coin_records.unwrap_or_default())
    }

    async fn push_spend_bundle(&self, spend_bundle: &SpendBundle) -> Result<(), LedgerError> {
        let response = self
            .client
            .push_tx(spend_bundle)
            .await
            .map_err(request_error)?;

        if response.success {
            debug!(status = %response.status, "spend bundle accepted");
            return Ok(());
        }

        let reason = response.error.unwrap_or(response.status);
        warn!(%reason, "spend bundle rejected");
        Err(LedgerError::Rejected(reason))
    }

    async fn genesis_challenge(&self) -> Result<Option<Bytes32>, LedgerError> {
        let response = self
            .client
            .get_network_info()
            .await
            .map_err(request_error)?;

        if !response.success {
            return Err(node_error(response.error));
        }

        Ok(response.genesis_challenge)
    }
}
