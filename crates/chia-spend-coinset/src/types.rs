use chia_protocol::Coin;
use serde::Deserialize;

/// A coin as tracked by the full node, with its confirmation and spend state.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinRecord {
    pub coin: Coin,
    pub coinbase: bool,
    pub confirmed_block_index: u32,
    pub spent: bool,
    pub spent_block_index: u32,
    pub timestamp: u64,
}

impl CoinRecord {
    /// Whether the coin has been included in a block. Mempool-only records
    /// report a confirmed block index of zero.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_block_index > 0
    }

    pub fn is_spendable(&self) -> bool {
        self.is_confirmed() && !self.spent
    }
}
