use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid distinguished name {dn:?}: {reason}")]
    InvalidDn { dn: String, reason: String },

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("certificate encoding is empty")]
    EmptyCertificate,

    #[error("private key encoding is empty")]
    EmptyPrivateKey,
}

/// Result alias for type operations.
pub type TypeResult<T> = Result<T, TypeError>;
