//! Identity providers (identity stores) and their aliases.
//!
//! A provider lives at `cn=<name>` in the tenant's `IdentityProviders`
//! container. Its attribute map and schema mapping are indexed
//! [`AttributeMapEntry`](crate::attribute::AttributeMapEntry) collections
//! beneath it, loaded separately. An alias is a sibling object pointing at
//! the provider's DN.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use dirconf_mapper::{AttributeMapping, AttributeValue, CodecResult, Descriptor};
use dirconf_types::{Certificate, Dn, RawValue, CN};

use crate::value::string_enum;

pub const IDENTITY_PROVIDER_OBJECT_CLASS: &str = "vmwSTSIdentityStore";
pub const IDENTITY_PROVIDER_ALIAS_OBJECT_CLASS: &str = "vmwSTSIdentityStoreAlias";

pub mod attr {
    pub const DOMAIN_TYPE: &str = "vmwSTSDomainType";
    pub const DOMAIN_NAME: &str = "vmwSTSDomainName";
    pub const ALIAS: &str = "vmwSTSAlias";
    pub const PROVIDER_TYPE: &str = "vmwSTSProviderType";
    pub const AUTHENTICATION_TYPE: &str = "vmwSTSAuthenticationType";
    pub const FRIENDLY_NAME: &str = "vmwSTSName";
    pub const SEARCH_TIMEOUT: &str = "vmwSTSTimeout";
    pub const USER_NAME: &str = "vmwSTSUserName";
    pub const USE_MACHINE_ACCOUNT: &str = "vmwSTSServiceUseMachineAccount";
    pub const SERVICE_PRINCIPAL_NAME: &str = "vmwSTSServicePrincipalName";
    pub const PASSWORD: &str = "vmwSTSPassword";
    pub const CONNECTION_STRINGS: &str = "vmwSTSConnectionStrings";
    pub const AUTHN_TYPES: &str = "vmwSTSAuthnTypes";
    pub const CERTIFICATES: &str = "userCertificate";
    pub const UPN_SUFFIXES: &str = "vmwSTSUpnSuffixes";
    pub const USER_BASE_DN: &str = "vmwSTSUserBaseDN";
    pub const GROUP_BASE_DN: &str = "vmwSTSGroupBaseDN";
    pub const FLAGS: &str = "vmwSTSIdentityStoreFlags";
    pub const USER_HINT_ATTRIBUTE: &str = "vmwSTSUserHintAttributeName";
    pub const LINK_ACCOUNT_WITH_UPN: &str = "vmwSTSCertificateAccountLinkingUseUPN";
    pub const ALIASED_OBJECT_NAME: &str = "aliasedObjectName";
}

string_enum! {
    /// Where a provider's principals live.
    pub enum DomainType {
        /// The tenant's own directory; created with the tenant.
        SystemDomain => "SYSTEM_DOMAIN",
        /// Accounts of the host operating system.
        LocalOsDomain => "LOCAL_OS_DOMAIN",
        /// Any other directory.
        ExternalDomain => "EXTERNAL_DOMAIN",
    }
}

string_enum! {
    pub enum IdentityStoreType {
        VmwareDirectory => "IDENTITY_STORE_TYPE_VMWARE_DIRECTORY",
        ActiveDirectory => "IDENTITY_STORE_TYPE_ACTIVE_DIRECTORY",
        LdapWithAdMapping => "IDENTITY_STORE_TYPE_LDAP_WITH_AD_MAPPING",
        Ldap => "IDENTITY_STORE_TYPE_LDAP",
        LocalOs => "IDENTITY_STORE_TYPE_LOCAL_OS",
    }
}

string_enum! {
    /// How the service binds to the provider.
    pub enum AuthenticationType {
        Password => "PASSWORD",
        UseKerberos => "USE_KERBEROS",
        Srp => "SRP",
    }
}

/// Authentication methods a provider accepts, stored as a set of flag
/// values. No method at all is stored as the single value `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthnTypes {
    pub password: bool,
    pub windows: bool,
    pub tls_certificate: bool,
    pub rsa_secure_id: bool,
}

impl AuthnTypes {
    pub const NONE: i32 = 0;
    pub const PASSWORD: i32 = 0x1;
    pub const WINDOWS: i32 = 0x2;
    pub const TLS_CERTIFICATE: i32 = 0x4;
    pub const RSA_SECURE_ID: i32 = 0x8;

    pub fn to_flags(&self) -> Vec<i32> {
        let flags: Vec<i32> = [
            (self.password, Self::PASSWORD),
            (self.windows, Self::WINDOWS),
            (self.tls_certificate, Self::TLS_CERTIFICATE),
            (self.rsa_secure_id, Self::RSA_SECURE_ID),
        ]
        .into_iter()
        .filter_map(|(on, flag)| on.then_some(flag))
        .collect();
        if flags.is_empty() {
            vec![Self::NONE]
        } else {
            flags
        }
    }

    pub fn from_flags(flags: &[i32]) -> Self {
        let bits = flags.iter().fold(0, |acc, f| acc | f);
        Self {
            password: bits & Self::PASSWORD != 0,
            windows: bits & Self::WINDOWS != 0,
            tls_certificate: bits & Self::TLS_CERTIFICATE != 0,
            rsa_secure_id: bits & Self::RSA_SECURE_ID != 0,
        }
    }
}

impl AttributeValue for AuthnTypes {
    fn encode(&self) -> RawValue {
        self.to_flags().encode()
    }

    fn decode(raw: &RawValue) -> CodecResult<Self> {
        Ok(Self::from_flags(&Vec::<i32>::decode(raw)?))
    }
}

/// An identity provider of a tenant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProvider {
    pub name: String,
    pub domain_type: DomainType,
    pub alias: Option<String>,
    pub provider_type: Option<IdentityStoreType>,
    pub authentication_type: Option<AuthenticationType>,
    pub friendly_name: Option<String>,
    /// Search timeout in seconds; `0` means no limit.
    pub search_timeout_secs: i32,
    pub user_name: Option<String>,
    pub use_machine_account: bool,
    pub service_principal_name: Option<String>,
    /// Bind password. In the store this holds the ciphertext.
    #[serde(skip)]
    pub password: Option<String>,
    pub connection_strings: Vec<String>,
    pub authn_types: AuthnTypes,
    pub certificates: Vec<Certificate>,
    pub upn_suffixes: Vec<String>,
    pub user_base_dn: Option<String>,
    pub group_base_dn: Option<String>,
    pub flags: i32,
    pub user_hint_attribute: Option<String>,
    pub link_account_with_upn: bool,
    /// Loaded from the `AttributesMap` collection, not from this object.
    pub attribute_map: BTreeMap<String, String>,
    /// Loaded from the `SchemaMapping` collection, not from this object.
    pub schema_mapping: BTreeMap<String, String>,
}

impl IdentityProvider {
    pub fn new(name: impl Into<String>, domain_type: DomainType) -> Self {
        Self {
            name: name.into(),
            domain_type,
            alias: None,
            provider_type: None,
            authentication_type: None,
            friendly_name: None,
            search_timeout_secs: 0,
            user_name: None,
            use_machine_account: false,
            service_principal_name: None,
            password: None,
            connection_strings: Vec::new(),
            authn_types: AuthnTypes::default(),
            certificates: Vec::new(),
            upn_suffixes: Vec::new(),
            user_base_dn: None,
            group_base_dn: None,
            flags: 0,
            user_hint_attribute: None,
            link_account_with_upn: false,
            attribute_map: BTreeMap::new(),
            schema_mapping: BTreeMap::new(),
        }
    }

    /// The alias, if it is set and differs from the name.
    pub fn distinct_alias(&self) -> Option<&str> {
        self.alias
            .as_deref()
            .filter(|a| !a.is_empty() && !a.eq_ignore_ascii_case(&self.name))
    }

    /// Whether `name` is this provider's name or alias, ignoring case.
    pub fn is_known_as(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.alias.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(name))
    }
}

type ProviderMapping = AttributeMapping<IdentityProvider, IdentityProvider>;

fn optional_text(
    name: &'static str,
    get: fn(&IdentityProvider) -> &Option<String>,
    field: fn(&mut IdentityProvider) -> &mut Option<String>,
) -> ProviderMapping {
    AttributeMapping::new(name, move |p: &IdentityProvider| get(p).encode())
        .set_with(move |p: &mut IdentityProvider, v: Option<String>| *field(p) = v)
}

fn text_list(
    name: &'static str,
    get: fn(&IdentityProvider) -> &Vec<String>,
    field: fn(&mut IdentityProvider) -> &mut Vec<String>,
) -> ProviderMapping {
    AttributeMapping::new(name, move |p: &IdentityProvider| get(p).encode())
        .set_with(move |p: &mut IdentityProvider, v: Vec<String>| *field(p) = v)
}

fn switch(
    name: &'static str,
    get: fn(&IdentityProvider) -> bool,
    field: fn(&mut IdentityProvider) -> &mut bool,
) -> ProviderMapping {
    AttributeMapping::new(name, move |p: &IdentityProvider| get(p).encode())
        .set_with(move |p: &mut IdentityProvider, v: Option<bool>| *field(p) = v.unwrap_or(false))
}

pub fn identity_provider_descriptor() -> &'static Descriptor<IdentityProvider> {
    static DESCRIPTOR: OnceLock<Descriptor<IdentityProvider>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        Descriptor::direct(
            IDENTITY_PROVIDER_OBJECT_CLASS,
            vec![
                AttributeMapping::new(attr::DOMAIN_TYPE, |p: &IdentityProvider| {
                    p.domain_type.encode()
                })
                .ctor(0),
                AttributeMapping::new(CN, |p: &IdentityProvider| p.name.encode())
                    .ctor(1)
                    .create_only(),
                AttributeMapping::new(attr::DOMAIN_NAME, |p: &IdentityProvider| p.name.encode())
                    .setter(|_, _| Ok(())),
                optional_text(attr::ALIAS, |p| &p.alias, |p| &mut p.alias),
                AttributeMapping::new(attr::PROVIDER_TYPE, |p: &IdentityProvider| {
                    p.provider_type.encode()
                })
                .set_with(|p: &mut IdentityProvider, v: Option<IdentityStoreType>| {
                    p.provider_type = v
                }),
                AttributeMapping::new(attr::AUTHENTICATION_TYPE, |p: &IdentityProvider| {
                    p.authentication_type.encode()
                })
                .set_with(|p: &mut IdentityProvider, v: Option<AuthenticationType>| {
                    p.authentication_type = v
                }),
                optional_text(attr::FRIENDLY_NAME, |p| &p.friendly_name, |p| &mut p.friendly_name),
                AttributeMapping::new(attr::SEARCH_TIMEOUT, |p: &IdentityProvider| {
                    p.search_timeout_secs.encode()
                })
                .set_with(|p: &mut IdentityProvider, v: Option<i32>| {
                    p.search_timeout_secs = v.unwrap_or(0)
                }),
                optional_text(attr::USER_NAME, |p| &p.user_name, |p| &mut p.user_name),
                switch(
                    attr::USE_MACHINE_ACCOUNT,
                    |p| p.use_machine_account,
                    |p| &mut p.use_machine_account,
                ),
                optional_text(
                    attr::SERVICE_PRINCIPAL_NAME,
                    |p| &p.service_principal_name,
                    |p| &mut p.service_principal_name,
                ),
                optional_text(attr::PASSWORD, |p| &p.password, |p| &mut p.password),
                text_list(
                    attr::CONNECTION_STRINGS,
                    |p| &p.connection_strings,
                    |p| &mut p.connection_strings,
                ),
                AttributeMapping::new(attr::AUTHN_TYPES, |p: &IdentityProvider| {
                    p.authn_types.encode()
                })
                .set_with(|p: &mut IdentityProvider, v: AuthnTypes| p.authn_types = v),
                AttributeMapping::new(attr::CERTIFICATES, |p: &IdentityProvider| {
                    p.certificates.encode()
                })
                .set_with(|p: &mut IdentityProvider, v: Vec<Certificate>| p.certificates = v),
                text_list(attr::UPN_SUFFIXES, |p| &p.upn_suffixes, |p| &mut p.upn_suffixes),
                optional_text(attr::USER_BASE_DN, |p| &p.user_base_dn, |p| &mut p.user_base_dn),
                optional_text(attr::GROUP_BASE_DN, |p| &p.group_base_dn, |p| &mut p.group_base_dn),
                AttributeMapping::new(attr::FLAGS, |p: &IdentityProvider| p.flags.encode())
                    .set_with(|p: &mut IdentityProvider, v: Option<i32>| p.flags = v.unwrap_or(0)),
                optional_text(
                    attr::USER_HINT_ATTRIBUTE,
                    |p| &p.user_hint_attribute,
                    |p| &mut p.user_hint_attribute,
                )
                .create_only(),
                switch(
                    attr::LINK_ACCOUNT_WITH_UPN,
                    |p| p.link_account_with_upn,
                    |p| &mut p.link_account_with_upn,
                ),
            ],
            |args| Ok(IdentityProvider::new(args.get::<String>(1)?, args.get(0)?)),
        )
        .expect("identity provider descriptor table is well-formed")
    })
}

/// A second name for a provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProviderAlias {
    pub alias: String,
    pub provider_dn: Dn,
}

pub fn identity_provider_alias_descriptor() -> &'static Descriptor<IdentityProviderAlias> {
    static DESCRIPTOR: OnceLock<Descriptor<IdentityProviderAlias>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        Descriptor::direct(
            IDENTITY_PROVIDER_ALIAS_OBJECT_CLASS,
            vec![
                AttributeMapping::new(attr::ALIASED_OBJECT_NAME, |a: &IdentityProviderAlias| {
                    a.provider_dn.encode()
                })
                .ctor(0),
                AttributeMapping::new(CN, |a: &IdentityProviderAlias| a.alias.encode())
                    .ctor(1)
                    .create_only(),
            ],
            |args| {
                Ok(IdentityProviderAlias {
                    provider_dn: args.get(0)?,
                    alias: args.get(1)?,
                })
            },
        )
        .expect("identity provider alias descriptor table is well-formed")
    })
}
