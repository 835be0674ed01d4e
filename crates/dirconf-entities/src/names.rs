//! Well-known container names.
//!
//! The configuration tree is `<root> / Services / IdentityManager / Tenants /
//! <tenant>`, and each tenant groups its objects in the containers below.

pub const SERVICES: &str = "Services";
pub const IDENTITY_MANAGER: &str = "IdentityManager";
pub const TENANTS: &str = "Tenants";

pub const ATTRIBUTES: &str = "Attributes";
pub const ATTRIBUTES_MAP: &str = "AttributesMap";
pub const SCHEMA_MAPPING: &str = "SchemaMapping";
pub const IDM_CERTIFICATES: &str = "IdmCertificates";
pub const RELYING_PARTIES: &str = "RelyingParties";
pub const IDENTITY_PROVIDERS: &str = "IdentityProviders";
pub const ASSERTION_CONSUMER_SERVICES: &str = "AssertionConsumerServices";
pub const ATTRIBUTE_CONSUMER_SERVICES: &str = "AttributeConsumerServices";
pub const SINGLE_LOGOUT_SERVICES: &str = "SingleLogoutServices";
pub const SIGNATURE_ALGORITHMS: &str = "SignatureAlgorithms";
pub const TRUSTED_CERTIFICATE_CHAINS: &str = "TrustedCertificateChains";
pub const OIDC_CLIENTS: &str = "OIDCClients";
pub const CLIENT_CERT_POLICIES: &str = "ClientCertificatePolicies";
