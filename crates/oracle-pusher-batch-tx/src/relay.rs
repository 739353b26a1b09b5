use crate::error::RelayError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::Deserialize;
use solana_sdk::{pubkey::Pubkey, transaction::VersionedTransaction};
use std::fmt;

/// Opaque identifier the relay assigns to an accepted bundle submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BundleId(pub String);

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the relay's accept/reject contract currently stands for a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleState {
    Pending,
    Landed { slot: u64 },
    Rejected { reason: String },
}

#[derive(Debug, Clone)]
pub struct BundleStatus {
    pub bundle_id: BundleId,
    pub state: BundleState,
}

/// External relay that auctions bundles for all-or-nothing inclusion.
///
/// The atomicity guarantee lives entirely on the other side of this trait:
/// either every transaction of a submitted bundle lands in one slot, or none
/// does. This crate only relies on that contract, it does not enforce it.
#[async_trait]
pub trait BundleRelay: Send + Sync {
    async fn send_bundle(
        &self,
        transactions: &[VersionedTransaction],
    ) -> Result<BundleId, RelayError>;

    async fn bundle_statuses(&self, ids: &[BundleId]) -> Result<Vec<BundleStatus>, RelayError>;

    /// Account the tip transfer must pay to make the auction bid valid.
    fn tip_account(&self) -> Pubkey;
}

/// JSON-RPC relay client speaking the block-engine bundle API.
pub struct JsonRpcRelay {
    http: reqwest::Client,
    endpoint: String,
    tip_account: Pubkey,
}

impl JsonRpcRelay {
    pub fn new(endpoint: String, tip_account: Pubkey) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            tip_account,
        }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, RelayError> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: RpcEnvelope<T> = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(RelayError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        response
            .result
            .ok_or_else(|| RelayError::InvalidResponse("missing result".to_string()))
    }
}

#[async_trait]
impl BundleRelay for JsonRpcRelay {
    async fn send_bundle(
        &self,
        transactions: &[VersionedTransaction],
    ) -> Result<BundleId, RelayError> {
        let encoded: Vec<String> = transactions
            .iter()
            .map(encode_transaction_base64)
            .collect::<Result<_, _>>()?;

        let id: String = self
            .call(
                "sendBundle",
                serde_json::json!([encoded, { "encoding": "base64" }]),
            )
            .await?;
        Ok(BundleId(id))
    }

    async fn bundle_statuses(&self, ids: &[BundleId]) -> Result<Vec<BundleStatus>, RelayError> {
        let requested: Vec<&str> = ids.iter().map(|id| id.0.as_str()).collect();
        let result: StatusesResult = self
            .call("getBundleStatuses", serde_json::json!([requested]))
            .await?;

        if result.value.len() != ids.len() {
            return Err(RelayError::InvalidResponse(format!(
                "asked for {} bundle statuses, got {}",
                ids.len(),
                result.value.len()
            )));
        }

        Ok(ids
            .iter()
            .zip(result.value)
            .map(|(id, entry)| BundleStatus {
                bundle_id: id.clone(),
                state: entry.map(StatusEntry::into_state).unwrap_or(BundleState::Pending),
            })
            .collect())
    }

    fn tip_account(&self) -> Pubkey {
        self.tip_account
    }
}

fn encode_transaction_base64(transaction: &VersionedTransaction) -> Result<String, RelayError> {
    let bytes = bincode::serde::encode_to_vec(transaction, bincode::config::legacy())
        .map_err(|e| RelayError::Encode(e.to_string()))?;
    Ok(BASE64_STANDARD.encode(bytes))
}

#[derive(Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct StatusesResult {
    value: Vec<Option<StatusEntry>>,
}

#[derive(Deserialize)]
struct StatusEntry {
    #[serde(default)]
    slot: Option<u64>,
    #[serde(default)]
    confirmation_status: Option<String>,
    #[serde(default)]
    err: Option<serde_json::Value>,
}

impl StatusEntry {
    fn into_state(self) -> BundleState {
        if let Some(err) = &self.err {
            let benign = err.get("Ok").map(|v| v.is_null()).unwrap_or(false);
            if !benign {
                return BundleState::Rejected {
                    reason: err.to_string(),
                };
            }
        }

        match self.confirmation_status.as_deref() {
            Some("confirmed") | Some("finalized") => BundleState::Landed {
                slot: self.slot.unwrap_or_default(),
            },
            _ => BundleState::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(json: serde_json::Value) -> StatusEntry {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_confirmed_entry_is_landed() {
        let state = entry(serde_json::json!({
            "bundle_id": "abc",
            "slot": 1234,
            "confirmation_status": "confirmed",
            "err": { "Ok": null }
        }))
        .into_state();

        assert_eq!(state, BundleState::Landed { slot: 1234 });
    }

    #[test]
    fn test_error_entry_is_rejected() {
        let state = entry(serde_json::json!({
            "bundle_id": "abc",
            "slot": 1234,
            "confirmation_status": "processed",
            "err": { "BundleRejected": "tip too low" }
        }))
        .into_state();

        assert!(matches!(state, BundleState::Rejected { reason } if reason.contains("tip too low")));
    }

    #[test]
    fn test_unconfirmed_entry_is_pending() {
        let state = entry(serde_json::json!({
            "bundle_id": "abc",
            "slot": 1234,
            "confirmation_status": "processed"
        }))
        .into_state();

        assert_eq!(state, BundleState::Pending);
    }
}
