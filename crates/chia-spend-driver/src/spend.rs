use std::{fmt, slice};

use chia_bls::{SecretKey, Signature};
use chia_protocol::{Bytes32, Coin, CoinSpend, SpendBundle};
use chia_spend_coinset::{CoinRecord, Ledger};
use chia_spend_program::Program;
use chia_spend_signer::sign_and_aggregate;
use tracing::{debug, info, warn};

use crate::{
    assemble, build_send_conditions, find_spendable_coin, DriverError, SignaturePuzzle, SpendEngine,
};

/// The stages a single spend passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpendStage {
    Idle,
    CoinLocated,
    ConditionsBuilt,
    Signed,
    Assembled,
    Submitted,
}

impl fmt::Display for SpendStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::CoinLocated => "coin_located",
            Self::ConditionsBuilt => "conditions_built",
            Self::Signed => "signed",
            Self::Assembled => "assembled",
            Self::Submitted => "submitted",
        };
        f.write_str(name)
    }
}

mod sealed {
    pub trait Sealed {}
}

pub trait SpendState: sealed::Sealed {
    const STAGE: SpendStage;
}

#[derive(Debug, Clone, Copy)]
pub struct Idle;

#[derive(Debug, Clone, Copy)]
pub struct CoinLocated {
    record: CoinRecord,
}

#[derive(Debug, Clone)]
pub struct ConditionsBuilt {
    coin: Coin,
    conditions: Program,
}

#[derive(Debug, Clone)]
pub struct Signed {
    coin_spend: CoinSpend,
    signature: Signature,
}

#[derive(Debug, Clone)]
pub struct Assembled {
    spend_bundle: SpendBundle,
}

#[derive(Debug, Clone)]
pub struct Submitted {
    spend_bundle: SpendBundle,
}

macro_rules! spend_states {
    ( $( $state:ident ),* ) => {
        $(
            impl sealed::Sealed for $state {}

            impl SpendState for $state {
                const STAGE: SpendStage = SpendStage::$state;
            }
        )*
    };
}

spend_states!(Idle, CoinLocated, ConditionsBuilt, Signed, Assembled, Submitted);

/// A spend of a signature puzzle coin, typed by the stage it has reached.
///
/// Every transition consumes the value, so a failed step leaves nothing to
/// resume from. A new attempt starts again from [`SpendEngine::begin`] and
/// locates a fresh coin.
#[derive(Debug)]
pub struct Spend<'a, L, S> {
    engine: &'a SpendEngine<L>,
    puzzle: SignaturePuzzle,
    state: S,
}

impl<'a, L, S> Spend<'a, L, S>
where
    S: SpendState,
{
    pub(crate) fn new(engine: &'a SpendEngine<L>, puzzle: SignaturePuzzle, state: S) -> Self {
        Self {
            engine,
            puzzle,
            state,
        }
    }

    pub fn stage(&self) -> SpendStage {
        S::STAGE
    }

    pub fn puzzle(&self) -> &SignaturePuzzle {
        &self.puzzle
    }

    fn advance<T>(self, state: T) -> Spend<'a, L, T>
    where
        T: SpendState,
    {
        debug!(from = %S::STAGE, to = %T::STAGE, "spend stage transition");
        Spend {
            engine: self.engine,
            puzzle: self.puzzle,
            state,
        }
    }
}

impl<'a, L> Spend<'a, L, Idle>
where
    L: Ledger,
{
    pub async fn locate(self) -> Result<Spend<'a, L, CoinLocated>, DriverError> {
        let record = find_spendable_coin(self.engine.ledger(), self.puzzle.puzzle_hash()).await?;

        info!(
            stage = %SpendStage::CoinLocated,
            coin_id = %record.coin.coin_id(),
            amount = record.coin.amount,
            "located coin"
        );

        Ok(self.advance(CoinLocated { record }))
    }
}

impl<'a, L> Spend<'a, L, CoinLocated> {
    pub fn coin_record(&self) -> &CoinRecord {
        &self.state.record
    }

    /// Sends the whole coin to `recipient`, minus `fee`.
    pub fn build_conditions(
        self,
        recipient: Bytes32,
        fee: u64,
    ) -> Result<Spend<'a, L, ConditionsBuilt>, DriverError> {
        let coin = self.state.record.coin;
        let conditions = build_send_conditions(coin.amount, recipient, fee)?;

        info!(
            stage = %SpendStage::ConditionsBuilt,
            %recipient,
            amount = coin.amount - fee,
            fee,
            "built conditions"
        );

        Ok(self.advance(ConditionsBuilt { coin, conditions }))
    }
}

impl<'a, L> Spend<'a, L, ConditionsBuilt> {
    pub fn conditions(&self) -> &Program {
        &self.state.conditions
    }

    pub fn solution(&self) -> Program {
        SignaturePuzzle::solution(&self.state.conditions)
    }

    /// Signs the conditions for this coin on the configured network.
    pub fn sign(self, secret_key: &SecretKey) -> Result<Spend<'a, L, Signed>, DriverError> {
        let ConditionsBuilt { coin, conditions } = &self.state;

        let required = self.puzzle.required_signature(
            coin,
            conditions,
            self.engine.network().genesis_challenge,
        );
        let signature =
            sign_and_aggregate(slice::from_ref(&required), slice::from_ref(secret_key))?;
        let coin_spend = self.puzzle.spend(*coin, conditions);

        info!(
            stage = %SpendStage::Signed,
            coin_id = %coin.coin_id(),
            "signed spend"
        );

        Ok(self.advance(Signed {
            coin_spend,
            signature,
        }))
    }
}

impl<'a, L> Spend<'a, L, Signed> {
    pub fn coin_spend(&self) -> &CoinSpend {
        &self.state.coin_spend
    }

    pub fn signature(&self) -> &Signature {
        &self.state.signature
    }

    pub fn assemble(self) -> Result<Spend<'a, L, Assembled>, DriverError> {
        let Signed {
            coin_spend,
            signature,
        } = self.state.clone();

        let spend_bundle = assemble(vec![coin_spend], signature)?;
        self.engine.verify_if_enabled(&spend_bundle)?;

        info!(
            stage = %SpendStage::Assembled,
            spend_bundle_id = %spend_bundle.name(),
            "assembled spend bundle"
        );

        Ok(self.advance(Assembled { spend_bundle }))
    }
}

impl<'a, L> Spend<'a, L, Assembled>
where
    L: Ledger,
{
    pub fn spend_bundle(&self) -> &SpendBundle {
        &self.state.spend_bundle
    }

    pub async fn submit(self) -> Result<Spend<'a, L, Submitted>, DriverError> {
        let spend_bundle = self.state.spend_bundle.clone();

        if let Err(error) = self.engine.ledger().push_spend_bundle(&spend_bundle).await {
            warn!(spend_bundle_id = %spend_bundle.name(), %error, "submission failed");
            return Err(error.into());
        }

        info!(
            stage = %SpendStage::Submitted,
            spend_bundle_id = %spend_bundle.name(),
            "submitted spend bundle"
        );

        Ok(self.advance(Submitted { spend_bundle }))
    }
}

impl<L> Spend<'_, L, Submitted> {
    pub fn spend_bundle(&self) -> &SpendBundle {
        &self.state.spend_bundle
    }

    pub fn into_spend_bundle(self) -> SpendBundle {
        self.state.spend_bundle
    }
}
