//! JSON-RPC client for the ledger fullnode.

use reelvault_common::LedgerError;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

/// Connection timeout for ledger RPC requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A single move-call invocation on the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct MoveCall {
    /// Fully qualified target: `package::module::function`.
    pub target: String,
    /// Positional arguments: object ids and pure values.
    pub arguments: Vec<Value>,
}

impl MoveCall {
    pub fn new(package: &str, module: &str, function: &str, arguments: Vec<Value>) -> Self {
        Self {
            target: format!("{}::{}::{}", package, module, function),
            arguments,
        }
    }
}

/// JSON-RPC client for the ledger fullnode.
///
/// A process-wide resource: constructed once, cheap to clone, and never
/// mutated after construction.
#[derive(Clone)]
pub struct LedgerClient {
    http: Client,
    rpc_url: String,
}

impl LedgerClient {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            http,
            rpc_url: rpc_url.into(),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": Uuid::new_v4().to_string(),
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Submission(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LedgerError::Submission(format!(
                "RPC endpoint returned status {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::Decode(e.to_string()))?;

        if let Some(error) = body.get("error") {
            return Err(LedgerError::Submission(format!("RPC error: {}", error)));
        }

        body.get("result")
            .cloned()
            .ok_or_else(|| LedgerError::Decode("RPC response missing result".into()))
    }

    /// Submit a signed transaction envelope for execution.
    pub async fn execute_transaction(&self, envelope: &Value) -> Result<Value, LedgerError> {
        self.call("ledger_executeTransaction", json!([envelope]))
            .await
    }

    /// Run a zero-gas dev-inspect call.
    ///
    /// Returns the first return value's raw bytes, or `None` when the call
    /// produced no return values.
    pub async fn dev_inspect(
        &self,
        sender: &str,
        call: &MoveCall,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        let result = self.call("ledger_devInspect", json!([sender, call])).await?;

        let Some(raw) = result
            .pointer("/results/0/returnValues/0/0")
            .and_then(Value::as_array)
        else {
            return Ok(None);
        };

        raw.iter()
            .map(|v| {
                v.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| LedgerError::Decode("return value byte out of range".into()))
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Some)
    }
}
