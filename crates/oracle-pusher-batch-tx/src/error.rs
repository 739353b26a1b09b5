use solana_sdk::signature::Signature;
use thiserror::Error;

pub type SubmitResult<T> = Result<T, SubmitError>;

/// Errors that can occur while building and submitting update transactions.
///
/// Every variant is scoped to one submission unit; no submit error aborts the
/// surrounding push cycle.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("RPC client error: {0}")]
    RpcClient(#[from] solana_client::client_error::ClientError),

    #[error("Recent blockhash unavailable: {0}")]
    BlockhashUnavailable(String),

    #[error("Transaction compile failed: {0}")]
    Compile(String),

    #[error("Transaction signing failed: {0}")]
    Signing(String),

    #[error("Transaction too large: {size} bytes (max: {max})")]
    TransactionTooLarge { size: usize, max: usize },

    #[error("Transaction {signature} unconfirmed after {attempts} broadcasts")]
    ConfirmationTimeout {
        signature: Signature,
        attempts: usize,
    },

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),
}

/// Errors from the bundle relay's submit side. Rejections of an accepted
/// bundle are not errors; they arrive through the async status stream and are
/// logged there.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Relay transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Relay rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid relay response: {0}")]
    InvalidResponse(String),

    #[error("Transaction wire encoding failed: {0}")]
    Encode(String),
}
