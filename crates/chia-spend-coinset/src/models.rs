use chia_protocol::Bytes32;
use serde::Deserialize;

use crate::CoinRecord;

#[derive(Deserialize, Debug, Clone)]
pub struct GetCoinRecordsResponse {
    pub coin_records: Option<Vec<CoinRecord>>,
    pub error: Option<String>,
    pub success: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PushTxResponse {
    #[serde(default)]
    pub status: String,
    pub error: Option<String>,
    pub success: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GetNetworkInfoResponse {
    pub network_name: Option<String>,
    pub network_prefix: Option<String>,
    pub genesis_challenge: Option<Bytes32>,
    pub error: Option<String>,
    pub success: bool,
}
