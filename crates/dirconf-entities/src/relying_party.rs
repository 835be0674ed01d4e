//! SAML relying parties and their endpoint collections.
//!
//! A relying party is stored at `cn=<name>` in `RelyingParties`; its
//! assertion consumer, attribute consumer and logout services and its
//! signature algorithms are collections beneath it, loaded separately.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use dirconf_mapper::{indexed_descriptor, AttributeMapping, AttributeValue, Descriptor};
use dirconf_types::{Certificate, CN};

use crate::attribute::{Attribute, IndexedDescriptor};

pub const RELYING_PARTY_OBJECT_CLASS: &str = "vmwSTSRelyingParty";
pub const ASSERTION_CONSUMER_SERVICE_OBJECT_CLASS: &str = "vmwSTSAssertionConsumerService";
pub const ATTRIBUTE_CONSUMER_SERVICE_OBJECT_CLASS: &str = "vmwSTSAttributeConsumerService";
pub const SINGLE_LOGOUT_SERVICE_OBJECT_CLASS: &str = "vmwSTSSingleLogoutService";
pub const SIGNATURE_ALGORITHM_OBJECT_CLASS: &str = "vmwSTSSignatureAlgorithm";

pub const SIGNATURE_ALGORITHM_PREFIX: &str = "SignatureAlgorithm";

pub mod attr {
    pub const NAME: &str = "name";
    pub const URL: &str = "vmwSTSRelyingPartyURL";
    pub const CERTIFICATE: &str = "userCertificate";
    pub const DEFAULT_ASSERTION_CONSUMER_SERVICE: &str = "vmwSTSDefaultAssertionConsumerService";
    pub const DEFAULT_ATTRIBUTE_CONSUMER_SERVICE: &str = "vmwSTSDefaultAttributeConsumerService";
    pub const AUTHN_REQUESTS_SIGNED: &str = "vmwSTSAuthnRequestsSigned";
    pub const ENDPOINT: &str = "vmwSTSEndpoint";
    pub const RESPONSE_ENDPOINT: &str = "vmwSTSResponseEndpoint";
    pub const BINDING: &str = "vmwSTSBinding";
    pub const INDEX: &str = "vmwSTSIndex";
    pub const MAXIMUM_KEY_SIZE: &str = "vmwSTSMaximumKeySize";
    pub const MINIMUM_KEY_SIZE: &str = "vmwSTSMinimumKeySize";
    pub const PRIORITY: &str = "vmwSTSPriority";
}

/// A SAML service provider registered with a tenant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelyingParty {
    pub name: String,
    pub url: String,
    pub certificate: Option<Certificate>,
    pub default_assertion_consumer_service: Option<String>,
    pub default_attribute_consumer_service: Option<String>,
    pub authn_requests_signed: bool,
    pub assertion_consumer_services: Vec<AssertionConsumerService>,
    pub attribute_consumer_services: Vec<AttributeConsumerService>,
    pub single_logout_services: Vec<SingleLogoutService>,
    /// In preference order.
    pub signature_algorithms: Vec<SignatureAlgorithm>,
}

impl RelyingParty {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            certificate: None,
            default_assertion_consumer_service: None,
            default_attribute_consumer_service: None,
            authn_requests_signed: false,
            assertion_consumer_services: Vec::new(),
            attribute_consumer_services: Vec::new(),
            single_logout_services: Vec::new(),
            signature_algorithms: Vec::new(),
        }
    }
}

pub fn relying_party_descriptor() -> &'static Descriptor<RelyingParty> {
    static DESCRIPTOR: OnceLock<Descriptor<RelyingParty>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        Descriptor::direct(
            RELYING_PARTY_OBJECT_CLASS,
            vec![
                AttributeMapping::new(CN, |r: &RelyingParty| r.name.encode())
                    .ctor(0)
                    .create_only(),
                AttributeMapping::new(attr::NAME, |r: &RelyingParty| r.name.encode())
                    .create_only()
                    .setter(|_, _| Ok(())),
                AttributeMapping::new(attr::URL, |r: &RelyingParty| r.url.encode())
                    .set_with(|r: &mut RelyingParty, v: Option<String>| r.url = v.unwrap_or_default()),
                AttributeMapping::new(attr::CERTIFICATE, |r: &RelyingParty| r.certificate.encode())
                    .set_with(|r: &mut RelyingParty, v: Option<Certificate>| r.certificate = v),
                AttributeMapping::new(attr::DEFAULT_ASSERTION_CONSUMER_SERVICE, |r: &RelyingParty| {
                    r.default_assertion_consumer_service.encode()
                })
                .set_with(|r: &mut RelyingParty, v: Option<String>| {
                    r.default_assertion_consumer_service = v
                }),
                AttributeMapping::new(attr::DEFAULT_ATTRIBUTE_CONSUMER_SERVICE, |r: &RelyingParty| {
                    r.default_attribute_consumer_service.encode()
                })
                .set_with(|r: &mut RelyingParty, v: Option<String>| {
                    r.default_attribute_consumer_service = v
                }),
                // Stored as an integer, 1 for signed.
                AttributeMapping::new(attr::AUTHN_REQUESTS_SIGNED, |r: &RelyingParty| {
                    i32::from(r.authn_requests_signed).encode()
                })
                .set_with(|r: &mut RelyingParty, v: Option<i32>| {
                    r.authn_requests_signed = v.is_some_and(|v| v != 0)
                }),
            ],
            |args| Ok(RelyingParty::new(args.get::<String>(0)?, String::new())),
        )
        .expect("relying party descriptor table is well-formed")
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionConsumerService {
    pub name: String,
    pub endpoint: String,
    pub binding: String,
    pub index: Option<i32>,
}

pub fn assertion_consumer_service_descriptor() -> &'static Descriptor<AssertionConsumerService> {
    static DESCRIPTOR: OnceLock<Descriptor<AssertionConsumerService>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        Descriptor::direct(
            ASSERTION_CONSUMER_SERVICE_OBJECT_CLASS,
            vec![
                AttributeMapping::new(CN, |s: &AssertionConsumerService| s.name.encode())
                    .ctor(0)
                    .create_only(),
                AttributeMapping::new(attr::ENDPOINT, |s: &AssertionConsumerService| {
                    s.endpoint.encode()
                })
                .set_with(|s: &mut AssertionConsumerService, v: Option<String>| {
                    s.endpoint = v.unwrap_or_default()
                }),
                AttributeMapping::new(attr::BINDING, |s: &AssertionConsumerService| {
                    s.binding.encode()
                })
                .set_with(|s: &mut AssertionConsumerService, v: Option<String>| {
                    s.binding = v.unwrap_or_default()
                }),
                AttributeMapping::new(attr::INDEX, |s: &AssertionConsumerService| s.index.encode())
                    .set_with(|s: &mut AssertionConsumerService, v: Option<i32>| s.index = v),
            ],
            |args| {
                Ok(AssertionConsumerService {
                    name: args.get(0)?,
                    endpoint: String::new(),
                    binding: String::new(),
                    index: None,
                })
            },
        )
        .expect("assertion consumer service descriptor table is well-formed")
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeConsumerService {
    pub name: String,
    pub index: Option<i32>,
    /// Loaded from the `Attributes` collection beneath the service.
    pub attributes: Vec<Attribute>,
}

pub fn attribute_consumer_service_descriptor() -> &'static Descriptor<AttributeConsumerService> {
    static DESCRIPTOR: OnceLock<Descriptor<AttributeConsumerService>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        Descriptor::direct(
            ATTRIBUTE_CONSUMER_SERVICE_OBJECT_CLASS,
            vec![
                AttributeMapping::new(CN, |s: &AttributeConsumerService| s.name.encode())
                    .ctor(0)
                    .create_only(),
                AttributeMapping::new(attr::INDEX, |s: &AttributeConsumerService| s.index.encode())
                    .set_with(|s: &mut AttributeConsumerService, v: Option<i32>| s.index = v),
            ],
            |args| {
                Ok(AttributeConsumerService {
                    name: args.get(0)?,
                    index: None,
                    attributes: Vec::new(),
                })
            },
        )
        .expect("attribute consumer service descriptor table is well-formed")
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleLogoutService {
    pub name: String,
    pub endpoint: String,
    pub response_endpoint: Option<String>,
    pub binding: String,
}

pub fn single_logout_service_descriptor() -> &'static Descriptor<SingleLogoutService> {
    static DESCRIPTOR: OnceLock<Descriptor<SingleLogoutService>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        Descriptor::direct(
            SINGLE_LOGOUT_SERVICE_OBJECT_CLASS,
            vec![
                AttributeMapping::new(CN, |s: &SingleLogoutService| s.name.encode())
                    .ctor(0)
                    .create_only(),
                AttributeMapping::new(attr::ENDPOINT, |s: &SingleLogoutService| s.endpoint.encode())
                    .set_with(|s: &mut SingleLogoutService, v: Option<String>| {
                        s.endpoint = v.unwrap_or_default()
                    }),
                AttributeMapping::new(attr::RESPONSE_ENDPOINT, |s: &SingleLogoutService| {
                    s.response_endpoint.encode()
                })
                .set_with(|s: &mut SingleLogoutService, v: Option<String>| s.response_endpoint = v),
                AttributeMapping::new(attr::BINDING, |s: &SingleLogoutService| s.binding.encode())
                    .set_with(|s: &mut SingleLogoutService, v: Option<String>| {
                        s.binding = v.unwrap_or_default()
                    }),
            ],
            |args| {
                Ok(SingleLogoutService {
                    name: args.get(0)?,
                    endpoint: String::new(),
                    response_endpoint: None,
                    binding: String::new(),
                })
            },
        )
        .expect("single logout service descriptor table is well-formed")
    })
}

/// Key size bounds and priority of one accepted signature algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureAlgorithm {
    pub max_key_size: i32,
    pub min_key_size: i32,
    pub priority: i32,
}

pub fn signature_algorithm_descriptor() -> &'static IndexedDescriptor<SignatureAlgorithm> {
    static DESCRIPTOR: OnceLock<IndexedDescriptor<SignatureAlgorithm>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        indexed_descriptor(
            SIGNATURE_ALGORITHM_OBJECT_CLASS,
            SIGNATURE_ALGORITHM_PREFIX,
            vec![
                AttributeMapping::new(attr::MAXIMUM_KEY_SIZE, |s: &SignatureAlgorithm| {
                    s.max_key_size.encode()
                })
                .ctor(0),
                AttributeMapping::new(attr::MINIMUM_KEY_SIZE, |s: &SignatureAlgorithm| {
                    s.min_key_size.encode()
                })
                .ctor(1),
                AttributeMapping::new(attr::PRIORITY, |s: &SignatureAlgorithm| s.priority.encode())
                    .ctor(2),
            ],
            |args| {
                Ok(SignatureAlgorithm {
                    max_key_size: args.get(0)?,
                    min_key_size: args.get(1)?,
                    priority: args.get(2)?,
                })
            },
            Ok,
        )
        .expect("signature algorithm descriptor table is well-formed")
    })
}
