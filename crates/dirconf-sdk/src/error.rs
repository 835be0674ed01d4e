use thiserror::Error;

use dirconf_mapper::MapperError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tenant not found: {0}")]
    NoSuchTenant(String),

    #[error("tenant already exists: {0}")]
    DuplicateTenant(String),

    #[error("identity provider already exists: {0}")]
    DuplicateProvider(String),

    #[error("identity provider not found: {0}")]
    NoSuchProvider(String),

    #[error("certificate already exists: {0}")]
    DuplicateCertificate(String),

    #[error("certificate not found: {0}")]
    NoSuchCertificate(String),

    #[error("certificate {0} is part of the active signing credential")]
    CertificateInUse(String),

    #[error("relying party not found: {0}")]
    NoSuchRelyingParty(String),

    #[error("relying party already exists: {0}")]
    DuplicateRelyingParty(String),

    #[error("OIDC client not found: {0}")]
    NoSuchOidcClient(String),

    #[error("OIDC client already exists: {0}")]
    DuplicateOidcClient(String),

    #[error("redirect URI already registered by another client: {0}")]
    DuplicateRedirectUri(String),

    #[error("password expiration is not configured for tenant {0}")]
    PasswordExpirationNotConfigured(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("mapping error: {0}")]
    Mapper(#[from] MapperError),

    #[error("store error: {0}")]
    Store(#[from] dirconf_store::StoreError),

    #[error("cipher error: {0}")]
    Cipher(#[from] dirconf_crypto::CipherError),

    #[error("invalid name: {0}")]
    InvalidName(#[from] dirconf_types::TypeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Corrupt stored state or a filter bug; retrying cannot help.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Mapper(e) => e.is_fatal(),
            _ => false,
        }
    }

    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidArgument(what.into())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
