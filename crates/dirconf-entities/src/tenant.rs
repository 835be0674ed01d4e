//! Tenants, the container that holds them, and the password-expiration view
//! of a tenant entry.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use dirconf_mapper::{AttributeMapping, AttributeValue, Descriptor};
use dirconf_types::CN;

pub const TENANT_OBJECT_CLASS: &str = "vmwSTSTenant";
pub const TENANTS_CONTAINER_OBJECT_CLASS: &str = "vmwSTSTenantsContainer";

/// Attribute names on tenant entries.
pub mod attr {
    pub const GUID: &str = "vmwSTSGuidIdentity";
    pub const LONG_NAME: &str = "name";
    pub const TENANT_KEY: &str = "vmwSTSTenantKey";
    pub const ISSUER_NAME: &str = "vmwSTSIssuerName";

    pub const ENTITY_ID: &str = "vmwSTSEntityId";
    pub const ALIAS: &str = "vmwSTSAlias";
    pub const CLOCK_TOLERANCE: &str = "vmwSTSClockTolerance";
    pub const SIGNATURE_ALGORITHM: &str = "vmwSTSSignatureAlgorithmIdentifier";
    pub const DELEGATION_COUNT: &str = "vmwSTSDelegationCount";
    pub const RENEW_COUNT: &str = "vmwSTSRenewCount";
    pub const MAX_BEARER_TOKEN_LIFETIME: &str = "vmwSTSMaxBearerTokenLifetime";
    pub const MAX_HOK_TOKEN_LIFETIME: &str = "vmwSTSMaxHolderOfKeyTokenLifetime";
    pub const MAX_BEARER_REFRESH_TOKEN_LIFETIME: &str = "vmwSTSMaxBearerRefreshTokenLifetime";
    pub const MAX_HOK_REFRESH_TOKEN_LIFETIME: &str = "vmwSTSMaxHolderOfKeyRefreshTokenLifetime";
    pub const DEFAULT_PROVIDER: &str = "vmwSTSDefaultIdentityProvider";
    pub const BRAND_NAME: &str = "vmwSTSBrandName";
    pub const LOGON_BANNER_TITLE: &str = "vmwSTSLogonBannerTitle";
    pub const LOGON_BANNER_CONTENT: &str = "vmwSTSLogonBanner";
    pub const LOGON_BANNER_ENABLE_CHECKBOX: &str = "vmwSTSLogonBannerEnableCheckbox";
    pub const AUTHN_TYPES: &str = "vmwSTSAuthnTypes";
    pub const ENABLE_IDP_SELECTION: &str = "vmwSTSEnableIdpSelection";

    pub const PASSWORD_EXPIRATION_ENABLED: &str = "vmwSTSEnablePasswordExpirationEmailNotification";
    pub const PASSWORD_EXPIRATION_FROM: &str = "vmwSTSPasswordExpirationFromEmail";
    pub const PASSWORD_EXPIRATION_SUBJECT: &str = "vmwSTSPasswordExpirationEmailSubject";
    pub const PASSWORD_EXPIRATION_DAYS: &str = "vmwSTSPasswordExpirationNotificationDays";

    pub const DEFAULT_TENANT: &str = "vmwSTSDefaultTenant";
    pub const SYSTEM_TENANT: &str = "vmwSTSSystemTenant";
}

/// Point-access attributes of a tenant entry: read and written one at a
/// time, never as part of [`Tenant`].
const TENANT_PROPERTIES: &[&str] = &[
    attr::ENTITY_ID,
    attr::ALIAS,
    attr::CLOCK_TOLERANCE,
    attr::SIGNATURE_ALGORITHM,
    attr::DELEGATION_COUNT,
    attr::RENEW_COUNT,
    attr::MAX_BEARER_TOKEN_LIFETIME,
    attr::MAX_HOK_TOKEN_LIFETIME,
    attr::MAX_BEARER_REFRESH_TOKEN_LIFETIME,
    attr::MAX_HOK_REFRESH_TOKEN_LIFETIME,
    attr::DEFAULT_PROVIDER,
    attr::BRAND_NAME,
    attr::LOGON_BANNER_TITLE,
    attr::LOGON_BANNER_CONTENT,
    attr::LOGON_BANNER_ENABLE_CHECKBOX,
    attr::AUTHN_TYPES,
    attr::ENABLE_IDP_SELECTION,
];

/// A tenant: the root of one isolated identity configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub name: String,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub issuer_name: Option<String>,
    /// Per-tenant secret key. Generated when the tenant is created.
    #[serde(skip)]
    pub tenant_key: Option<String>,
}

impl Tenant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

pub fn tenant_descriptor() -> &'static Descriptor<Tenant> {
    static DESCRIPTOR: OnceLock<Descriptor<Tenant>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        let mut attrs = vec![
            AttributeMapping::new(CN, |t: &Tenant| t.name.encode())
                .ctor(0)
                .create_only(),
            AttributeMapping::new(attr::LONG_NAME, |t: &Tenant| t.long_name.encode())
                .ctor(1)
                .create_only(),
            AttributeMapping::new(attr::TENANT_KEY, |t: &Tenant| t.tenant_key.encode())
                .ctor(2)
                .create_only(),
            AttributeMapping::new(attr::GUID, |t: &Tenant| t.guid.encode())
                .set_with(|t: &mut Tenant, v: Option<String>| t.guid = v),
            AttributeMapping::new(attr::ISSUER_NAME, |t: &Tenant| t.issuer_name.encode())
                .set_with(|t: &mut Tenant, v: Option<String>| t.issuer_name = v),
        ];
        attrs.extend(TENANT_PROPERTIES.iter().map(|&name| AttributeMapping::property(name)));

        Descriptor::direct(TENANT_OBJECT_CLASS, attrs, |args| {
            Ok(Tenant {
                name: args.get(0)?,
                long_name: args.get(1)?,
                tenant_key: args.get(2)?,
                ..Tenant::default()
            })
        })
        .expect("tenant descriptor table is well-formed")
    })
}

/// The `cn=Tenants` node. It carries the default and system tenant names as
/// point-access attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TenantsContainer {
    pub name: String,
}

impl Default for TenantsContainer {
    fn default() -> Self {
        Self {
            name: crate::names::TENANTS.to_string(),
        }
    }
}

pub fn tenants_container_descriptor() -> &'static Descriptor<TenantsContainer> {
    static DESCRIPTOR: OnceLock<Descriptor<TenantsContainer>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        Descriptor::direct(
            TENANTS_CONTAINER_OBJECT_CLASS,
            vec![
                AttributeMapping::new(CN, |c: &TenantsContainer| c.name.encode())
                    .ctor(0)
                    .create_only(),
                AttributeMapping::property(attr::DEFAULT_TENANT),
                AttributeMapping::property(attr::SYSTEM_TENANT),
            ],
            |args| Ok(TenantsContainer { name: args.get(0)? }),
        )
        .expect("tenants container descriptor table is well-formed")
    })
}

/// Password-expiration notification settings, stored on the tenant entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordExpiration {
    pub tenant_name: String,
    pub email_notification_enabled: bool,
    pub email_from: Option<String>,
    pub email_subject: Option<String>,
    /// Days before expiry on which a notification is sent.
    pub notification_days: Vec<i32>,
}

impl PasswordExpiration {
    /// Whether sender and subject are both configured.
    pub fn is_configured(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        set(&self.email_from) && set(&self.email_subject)
    }
}

pub fn password_expiration_descriptor() -> &'static Descriptor<PasswordExpiration> {
    static DESCRIPTOR: OnceLock<Descriptor<PasswordExpiration>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        Descriptor::direct(
            TENANT_OBJECT_CLASS,
            vec![
                AttributeMapping::new(CN, |p: &PasswordExpiration| p.tenant_name.encode())
                    .ctor(0)
                    .create_only(),
                // Stored as 1 / 0.
                AttributeMapping::new(attr::PASSWORD_EXPIRATION_ENABLED, |p: &PasswordExpiration| {
                    i32::from(p.email_notification_enabled).encode()
                })
                .ctor(1),
                AttributeMapping::new(attr::PASSWORD_EXPIRATION_FROM, |p: &PasswordExpiration| {
                    p.email_from.encode()
                })
                .ctor(2),
                AttributeMapping::new(attr::PASSWORD_EXPIRATION_SUBJECT, |p: &PasswordExpiration| {
                    p.email_subject.encode()
                })
                .ctor(3),
                AttributeMapping::new(attr::PASSWORD_EXPIRATION_DAYS, |p: &PasswordExpiration| {
                    p.notification_days.encode()
                })
                .ctor(4),
            ],
            |args| {
                Ok(PasswordExpiration {
                    tenant_name: args.get(0)?,
                    email_notification_enabled: args.get::<Option<i32>>(1)? == Some(1),
                    email_from: args.get(2)?,
                    email_subject: args.get(3)?,
                    notification_days: args.get(4)?,
                })
            },
        )
        .expect("password expiration descriptor table is well-formed")
    })
}
