use crate::FeedId;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

/// Errors from parsing a feed identifier out of configuration input
#[derive(Error, Debug)]
pub enum FeedIdError {
    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Invalid feed id length: {0} bytes (expected 32)")]
    InvalidLength(usize),
}

/// Errors from decoding an on-chain price update account
#[derive(Error, Debug)]
pub enum AccountDecodeError {
    #[error("Account data too small: {0} bytes")]
    AccountTooSmall(usize),

    #[error("Unexpected account discriminator")]
    UnexpectedDiscriminator,

    #[error("Deserialization failed: {0}")]
    Deserialize(String),
}

/// Errors from turning feed ids and an attestation payload into update
/// operations. These abort the whole push cycle: the input is malformed and
/// retrying it unchanged cannot succeed.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("No attestation range for feed {0}")]
    MissingAttestation(FeedId),

    #[error("Empty attestation range for feed {0}")]
    EmptyAttestation(FeedId),
}
