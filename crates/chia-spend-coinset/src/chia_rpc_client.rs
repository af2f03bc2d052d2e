use chia_protocol::{Bytes32, SpendBundle};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;

use super::{GetCoinRecordsResponse, GetNetworkInfoResponse, PushTxResponse};

/// The subset of the full node JSON RPC needed to find and spend coins.
pub trait ChiaRpcClient {
    type Error;

    fn base_url(&self) -> &str;

    fn make_post_request<R, B>(
        &self,
        endpoint: &str,
        body: B,
    ) -> impl Future<Output = Result<R, Self::Error>>
    where
        B: Serialize + Send,
        R: DeserializeOwned + Send;

    fn get_coin_records_by_puzzle_hash(
        &self,
        puzzle_hash: Bytes32,
        start_height: Option<u32>,
        end_height: Option<u32>,
        include_spent_coins: Option<bool>,
    ) -> impl Future<Output = Result<GetCoinRecordsResponse, Self::Error>> {
        self.make_post_request(
            "get_coin_records_by_puzzle_hash",
            serde_json::json!({
                "puzzle_hash": hex_bytes(&puzzle_hash),
                "start_height": start_height,
                "end_height": end_height,
                "include_spent_coins": include_spent_coins,
            }),
        )
    }

    fn get_coin_records_by_puzzle_hashes(
        &self,
        puzzle_hashes: Vec<Bytes32>,
        start_height: Option<u32>,
        end_height: Option<u32>,
        include_spent_coins: Option<bool>,
    ) -> impl Future<Output = Result<GetCoinRecordsResponse, Self::Error>> {
        self.make_post_request(
            "get_coin_records_by_puzzle_hashes",
            serde_json::json!({
                "puzzle_hashes": puzzle_hashes.iter().map(hex_bytes).collect::<Vec<String>>(),
                "start_height": start_height,
                "end_height": end_height,
                "include_spent_coins": include_spent_coins,
            }),
        )
    }

    fn push_tx(
        &self,
        spend_bundle: &SpendBundle,
    ) -> impl Future<Output = Result<PushTxResponse, Self::Error>> {
        self.make_post_request(
            "push_tx",
            serde_json::json!({
                "spend_bundle": {
                    "coin_spends": spend_bundle.coin_spends.iter().map(|coin_spend| {
                        serde_json::json!({
                            "coin": {
                                "amount": coin_spend.coin.amount,
                                "parent_coin_info": hex_bytes(&coin_spend.coin.parent_coin_info),
                                "puzzle_hash": hex_bytes(&coin_spend.coin.puzzle_hash),
                            },
                            "puzzle_reveal": hex_bytes(&coin_spend.puzzle_reveal),
                            "solution": hex_bytes(&coin_spend.solution),
                        })
                    }).collect::<Vec<serde_json::Value>>(),
                    "aggregated_signature": hex_bytes(&spend_bundle.aggregated_signature.to_bytes()),
                }
            }),
        )
    }

    fn get_network_info(
        &self,
    ) -> impl Future<Output = Result<GetNetworkInfoResponse, Self::Error>> {
        self.make_post_request("get_network_info", serde_json::json!({}))
    }
}

fn hex_bytes(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}
