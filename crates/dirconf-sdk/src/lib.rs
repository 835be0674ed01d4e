//! Multi-tenant identity configuration over a directory.
//!
//! [`ConfigStore`] is the entry point: it sequences the mapped-object
//! operations of `dirconf-mapper` into tenant-level business operations
//! (tenants, identity providers, credentials and certificates, relying
//! parties, OIDC clients, policies). Every operation borrows one pooled
//! connection for its whole duration.
//!
//! Operations are grouped by concern, one module each, all implemented on
//! [`ConfigStore`].

pub mod certificates;
pub mod config;
pub mod credentials;
pub mod error;
pub mod inspect;
pub mod oidc;
pub mod policies;
pub mod providers;
pub mod relying_parties;
pub mod store;
pub mod tenants;

#[cfg(test)]
mod testing;

pub use config::{ConfigStoreSettings, TenantDefaults, DEFAULT_ROOT_DN};
pub use error::{ConfigError, ConfigResult};
pub use inspect::{CertificateInspector, KnownCertificates, OpaqueCertificates};
pub use store::ConfigStore;

// Re-export the types callers pass through the façade
pub use dirconf_entities::{
    AssertionConsumerService, Attribute, AttributeConsumerService, AuthenticationType, AuthnTypes,
    CertificateType, ClientCertPolicy, DomainType, IdentityProvider, IdentityProviderAlias,
    IdentityStoreType, OidcClient, OidcClientBuilder, PasswordExpiration, RelyingParty,
    SignatureAlgorithm, SingleLogoutService, Tenant, TenantCredential, TrustedCertChain,
};
pub use dirconf_store::{ConnectionFactory, InMemoryDirectory};
pub use dirconf_types::{Certificate, Dn, PrivateKey};
