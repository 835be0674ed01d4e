//! Identity configuration entities and their directory descriptors.
//!
//! Every entity type here comes with a `*_descriptor()` function returning
//! its lazily built, process-wide [`Descriptor`](dirconf_mapper::Descriptor).
//! Entities are plain data; sequencing several objects into one business
//! operation is the job of `dirconf-sdk`.
//!
//! # Key Types
//!
//! - [`Tenant`], [`TenantsContainer`], [`PasswordExpiration`]: the tenant
//!   entry and its views
//! - [`TenantCredential`], [`TrustedCertChain`], [`IdmCertificate`]: signing
//!   material and trust anchors
//! - [`IdentityProvider`], [`IdentityProviderAlias`], [`AttributeMapEntry`]
//! - [`RelyingParty`] with its [`AssertionConsumerService`],
//!   [`AttributeConsumerService`], [`SingleLogoutService`] and
//!   [`SignatureAlgorithm`] collections
//! - [`OidcClient`] and [`OidcClientBuilder`]
//! - [`ClientCertPolicy`]
//!
//! # Design Rules
//!
//! - Optional attributes are `Option` or `Vec`; absence is never an error.
//! - Nested collections (attribute maps, consumer services, ...) are not
//!   part of the parent's descriptor and are loaded by the caller.
//! - Enumerated values are stored as their upper-case names.

mod value;

pub mod attribute;
pub mod certificate;
pub mod credential;
pub mod names;
pub mod oidc;
pub mod policy;
pub mod provider;
pub mod relying_party;
pub mod tenant;

#[cfg(test)]
mod testing;

pub use attribute::{
    attribute_descriptor, attribute_map_descriptor, Attribute, AttributeMapEntry, IndexedDescriptor,
};
pub use certificate::{idm_certificate_descriptor, CertificateType, IdmCertificate};
pub use credential::{
    next_generation_name, tenant_credential_descriptor, trusted_cert_chain_descriptor,
    TenantCredential, TrustedCertChain, TENANT_CREDENTIAL_PREFIX, TRUSTED_CERT_CHAIN_PREFIX,
};
pub use oidc::{oidc_client_descriptor, OidcClient, OidcClientBuilder};
pub use policy::{client_cert_policy_descriptor, ClientCertPolicy};
pub use provider::{
    identity_provider_alias_descriptor, identity_provider_descriptor, AuthenticationType,
    AuthnTypes, DomainType, IdentityProvider, IdentityProviderAlias, IdentityStoreType,
};
pub use relying_party::{
    assertion_consumer_service_descriptor, attribute_consumer_service_descriptor,
    relying_party_descriptor, signature_algorithm_descriptor, single_logout_service_descriptor,
    AssertionConsumerService, AttributeConsumerService, RelyingParty, SignatureAlgorithm,
    SingleLogoutService,
};
pub use tenant::{
    password_expiration_descriptor, tenant_descriptor, tenants_container_descriptor,
    PasswordExpiration, Tenant, TenantsContainer,
};
