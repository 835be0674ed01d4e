use thiserror::Error;

/// Errors from tenant secret encryption.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// The tenant key is empty.
    #[error("tenant key must not be empty")]
    EmptyKey,

    /// The ciphertext encoding could not be parsed.
    #[error("malformed ciphertext: {0}")]
    Malformed(String),

    /// The authentication tag did not verify (wrong key or tampered data).
    #[error("ciphertext authentication failed")]
    AuthenticationFailed,

    /// The decrypted bytes are not valid UTF-8.
    #[error("decrypted secret is not valid UTF-8")]
    InvalidUtf8,
}

/// Result alias for cipher operations.
pub type CipherResult<T> = Result<T, CipherError>;
