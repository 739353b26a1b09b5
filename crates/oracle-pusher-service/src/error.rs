use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from the attestation service.
///
/// Any of these aborts the whole push cycle: the blob mixes multiple feeds
/// under the service's own slicing contract, so partial use is never safe.
/// The next scheduled cycle retries implicitly.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Attestation transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Attestation service returned status {0}")]
    Status(u16),

    #[error("Attestation payload decode failed: {0}")]
    Decode(String),

    #[error("Invalid attestation response: {0}")]
    InvalidResponse(String),
}

/// Errors from loading and validating service configuration
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
