use chia_bls::PublicKey;
use chia_protocol::{Bytes, Bytes32, Coin, CoinSpend};
use chia_spend_program::Program;
use chia_spend_types::{parse_conditions, run_puzzle, AggSigMe, Condition};

use crate::SignerError;

/// A signature the ledger will check for a coin spend, as requested by an
/// `AGG_SIG_ME` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredSignature {
    pub public_key: PublicKey,
    pub raw_message: Bytes,
    pub appended_info: Vec<u8>,
    pub domain_string: Option<Bytes32>,
}

impl RequiredSignature {
    /// The `AGG_SIG_ME` requirement for `raw_message` on a given coin. The
    /// genesis challenge binds the signature to one network.
    pub fn agg_sig_me(
        coin: &Coin,
        public_key: PublicKey,
        raw_message: Bytes,
        genesis_challenge: Bytes32,
    ) -> Self {
        Self {
            public_key,
            raw_message,
            appended_info: coin.coin_id().to_vec(),
            domain_string: Some(genesis_challenge),
        }
    }

    /// The requirement produced by a puzzle that asserts `AGG_SIG_ME` over the
    /// tree hash of the conditions it was given.
    pub fn for_conditions(
        coin: &Coin,
        public_key: PublicKey,
        conditions: &Program,
        genesis_challenge: Bytes32,
    ) -> Self {
        Self::agg_sig_me(
            coin,
            public_key,
            conditions.hash().to_vec().into(),
            genesis_challenge,
        )
    }

    /// Runs the coin spend and collects a requirement for every `AGG_SIG_ME`
    /// condition in its output.
    pub fn from_coin_spend(
        coin_spend: &CoinSpend,
        genesis_challenge: Bytes32,
    ) -> Result<Vec<Self>, SignerError> {
        let puzzle = Program::try_from(&coin_spend.puzzle_reveal)?;
        let solution = Program::try_from(&coin_spend.solution)?;
        let conditions = parse_conditions(&run_puzzle(&puzzle, &solution)?)?;

        let result = conditions
            .into_iter()
            .filter_map(|condition| match condition {
                Condition::AggSigMe(AggSigMe {
                    public_key,
                    message,
                }) => Some(Self::agg_sig_me(
                    &coin_spend.coin,
                    public_key,
                    message,
                    genesis_challenge,
                )),
                _ => None,
            })
            .collect();

        Ok(result)
    }

    pub fn from_coin_spends(
        coin_spends: &[CoinSpend],
        genesis_challenge: Bytes32,
    ) -> Result<Vec<Self>, SignerError> {
        let mut required_signatures = Vec::new();
        for coin_spend in coin_spends {
            required_signatures.extend(Self::from_coin_spend(coin_spend, genesis_challenge)?);
        }
        Ok(required_signatures)
    }

    /// Computes the message that needs to be signed.
    pub fn message(&self) -> Vec<u8> {
        let mut message = Vec::from(self.raw_message.as_ref());
        message.extend(&self.appended_info);
        if let Some(domain_string) = self.domain_string {
            message.extend(domain_string.to_bytes());
        }
        message
    }
}
