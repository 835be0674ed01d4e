//! Tenant signing credentials and trusted certificate chains.
//!
//! Both are stored as generations named `<Prefix>-<n>`; the highest `n` is
//! the current one.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use dirconf_mapper::{index_name, parse_index, AttributeMapping, AttributeValue, Descriptor};
use dirconf_types::{Certificate, PrivateKey, CN};

pub const TENANT_CREDENTIAL_OBJECT_CLASS: &str = "vmwSTSTenantCredential";
pub const TRUSTED_CERT_CHAIN_OBJECT_CLASS: &str = "vmwSTSTenantTrustedCertificateChain";

pub const TENANT_CREDENTIAL_PREFIX: &str = "TenantCredential";
pub const TRUSTED_CERT_CHAIN_PREFIX: &str = "TrustedCertChain";

pub mod attr {
    pub const PRIVATE_KEY: &str = "vmwSTSPrivateKey";
    pub const CERTIFICATE: &str = "userCertificate";
}

/// Generation number carried by `name`, if it has the `<prefix>-<n>` form.
pub fn generation_of(prefix: &str, name: &str) -> Option<usize> {
    parse_index(prefix, name).ok()
}

/// Name of the generation following the highest one in `existing`.
pub fn next_generation_name<'a>(prefix: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let next = existing
        .into_iter()
        .filter_map(|name| generation_of(prefix, name))
        .max()
        .map_or(0, |n| n + 1);
    index_name(prefix, next)
}

/// The tenant's signing key and the chain that certifies it, leaf first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantCredential {
    pub name: String,
    #[serde(skip_serializing)]
    pub private_key: PrivateKey,
    pub certificates: Vec<Certificate>,
}

impl TenantCredential {
    pub fn leaf(&self) -> Option<&Certificate> {
        self.certificates.first()
    }

    pub fn root(&self) -> Option<&Certificate> {
        self.certificates.last()
    }
}

pub fn tenant_credential_descriptor() -> &'static Descriptor<TenantCredential> {
    static DESCRIPTOR: OnceLock<Descriptor<TenantCredential>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        Descriptor::direct(
            TENANT_CREDENTIAL_OBJECT_CLASS,
            vec![
                AttributeMapping::new(CN, |c: &TenantCredential| c.name.encode())
                    .ctor(0)
                    .create_only(),
                AttributeMapping::new(attr::PRIVATE_KEY, |c: &TenantCredential| {
                    c.private_key.encode()
                })
                .ctor(1),
                AttributeMapping::new(attr::CERTIFICATE, |c: &TenantCredential| {
                    c.certificates.encode()
                })
                .ctor(2),
            ],
            |args| {
                Ok(TenantCredential {
                    name: args.get(0)?,
                    private_key: args.get(1)?,
                    certificates: args.get(2)?,
                })
            },
        )
        .expect("tenant credential descriptor table is well-formed")
    })
}

/// A certificate chain the tenant trusts, leaf first and root last.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedCertChain {
    pub name: String,
    pub certificates: Vec<Certificate>,
}

impl TrustedCertChain {
    pub fn leaf(&self) -> Option<&Certificate> {
        self.certificates.first()
    }

    pub fn root(&self) -> Option<&Certificate> {
        self.certificates.last()
    }
}

pub fn trusted_cert_chain_descriptor() -> &'static Descriptor<TrustedCertChain> {
    static DESCRIPTOR: OnceLock<Descriptor<TrustedCertChain>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        Descriptor::direct(
            TRUSTED_CERT_CHAIN_OBJECT_CLASS,
            vec![
                AttributeMapping::new(CN, |c: &TrustedCertChain| c.name.encode())
                    .ctor(0)
                    .create_only(),
                AttributeMapping::new(attr::CERTIFICATE, |c: &TrustedCertChain| {
                    c.certificates.encode()
                })
                .ctor(1),
            ],
            |args| {
                Ok(TrustedCertChain {
                    name: args.get(0)?,
                    certificates: args.get(1)?,
                })
            },
        )
        .expect("trusted certificate chain descriptor table is well-formed")
    })
}
