use chia_protocol::Bytes32;
use chia_spend_types::{MAINNET_GENESIS_CHALLENGE, TESTNET11_GENESIS_CHALLENGE};
use serde::{Deserialize, Serialize};

/// Identifies the network spends are signed for. The genesis challenge is
/// appended to every `AGG_SIG_ME` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network_id: String,
    pub genesis_challenge: Bytes32,
}

impl NetworkConfig {
    pub fn mainnet() -> Self {
        Self {
            network_id: "mainnet".to_string(),
            genesis_challenge: MAINNET_GENESIS_CHALLENGE,
        }
    }

    pub fn testnet11() -> Self {
        Self {
            network_id: "testnet11".to_string(),
            genesis_challenge: TESTNET11_GENESIS_CHALLENGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpendOptions {
    /// Fee in mojos left for the farmer by each spend.
    pub fee: u64,
    /// Upper bound on derivation indices examined when scanning a wallet.
    pub scan_limit: u32,
    /// Verify the aggregate signature locally before submitting.
    pub verify_before_submit: bool,
}

impl Default for SpendOptions {
    fn default() -> Self {
        Self {
            fee: 50_000_000,
            scan_limit: 100,
            verify_before_submit: false,
        }
    }
}
