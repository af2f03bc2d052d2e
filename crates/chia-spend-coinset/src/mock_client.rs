use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use crate::ChiaRpcClient;

#[derive(Debug, Error)]
pub enum MockClientError {
    #[error("no mock response configured for {0}")]
    NoResponse(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An RPC client that answers from canned JSON responses keyed by URL, and
/// records every request it receives.
#[derive(Debug)]
pub struct MockRpcClient {
    requests: Mutex<Vec<(String, Value)>>,
    responses: HashMap<String, String>,
}

impl MockRpcClient {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responses: HashMap::new(),
        }
    }

    pub fn mock_response(&mut self, url: &str, response: &str) {
        self.responses.insert(url.to_string(), response.to_string());
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockRpcClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ChiaRpcClient for MockRpcClient {
    type Error = MockClientError;

    fn base_url(&self) -> &str {
        "http://api.example.com"
    }

    async fn make_post_request<R, B>(&self, endpoint: &str, body: B) -> Result<R, Self::Error>
    where
        B: Serialize + Send,
        R: DeserializeOwned + Send,
    {
        let url = format!("{}/{}", self.base_url(), endpoint);
        let body = serde_json::to_value(body)?;

        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((url.clone(), body));

        let response = self
            .responses
            .get(&url)
            .ok_or(MockClientError::NoResponse(url))?;

        Ok(serde_json::from_str(response)?)
    }
}
