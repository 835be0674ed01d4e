//! Tenant lifecycle, tenant-wide properties and the tenant attribute list.

use tracing::{info, warn};
use uuid::Uuid;

use dirconf_crypto::generate_tenant_key;
use dirconf_entities::names;
use dirconf_entities::tenant::{self, tenant_descriptor, tenants_container_descriptor};
use dirconf_entities::{
    attribute_descriptor, Attribute, AuthenticationType, AuthnTypes, DomainType, IdentityProvider,
    IdentityStoreType, Tenant,
};
use dirconf_mapper::{delete_subtree, load_indexed, save_indexed, AttributeValue, MapperError};
use dirconf_store::{ConnectionFactory, DirectoryConnection};
use dirconf_types::names::validate_common_name;
use dirconf_types::{Dn, SearchScope};

use crate::error::{ConfigError, ConfigResult};
use crate::store::{decode, same_name, ConfigStore};

/// `dc=` components of a dotted domain name.
fn domain_dn(domain: &str) -> String {
    domain
        .split('.')
        .filter(|part| !part.is_empty())
        .map(|part| format!("dc={part}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn non_negative<T: Into<i64> + Copy>(what: &str, value: T) -> ConfigResult<T> {
    if value.into() < 0 {
        return Err(ConfigError::invalid(format!("{what} must not be negative")));
    }
    Ok(value)
}

impl<F: ConnectionFactory> ConfigStore<F> {
    // ---- Tenant lifecycle ----

    /// Create a tenant together with its system-domain identity provider.
    ///
    /// A missing GUID is generated. A fresh tenant key is always generated;
    /// any key on `tenant` is ignored. The administrator password is stored
    /// encrypted with that key.
    pub fn add_tenant(&self, tenant: &Tenant, admin_user: &str, admin_password: &str) -> ConfigResult<()> {
        validate_common_name(&tenant.name)?;
        self.with_connection(|conn| {
            let tenants = self
                .tenants_dn(conn, true)?
                .ok_or_else(|| ConfigError::InvalidConfig("tenants container unavailable".into()))?;
            let descriptor = tenant_descriptor();
            if descriptor
                .lookup_one(conn, &tenants, SearchScope::OneLevel, &tenant.name, None)?
                .is_some()
            {
                return Err(ConfigError::DuplicateTenant(tenant.name.clone()));
            }

            let mut stored = tenant.clone();
            if stored.guid.as_deref().map_or(true, str::is_empty) {
                stored.guid = Some(Uuid::now_v7().to_string());
            }
            let tenant_key = generate_tenant_key(self.settings().tenant_key_length);
            stored.tenant_key = Some(tenant_key.clone());

            let dn = descriptor.dn_for(&tenants, &stored)?;
            match descriptor.create(conn, &dn, &stored) {
                Ok(()) => {}
                Err(MapperError::AlreadyExists(_)) => {
                    return Err(ConfigError::DuplicateTenant(tenant.name.clone()))
                }
                Err(e) => return Err(e.into()),
            }

            let system_domain = self.system_domain_provider(&tenant.name, admin_user, admin_password);
            self.create_provider(conn, &dn, &tenant_key, &system_domain)?;

            info!(tenant = %tenant.name, guid = ?stored.guid, "tenant created");
            Ok(())
        })
    }

    fn system_domain_provider(&self, tenant: &str, admin_user: &str, admin_password: &str) -> IdentityProvider {
        let domain = domain_dn(tenant);
        let mut provider = IdentityProvider::new(tenant.to_ascii_lowercase(), DomainType::SystemDomain);
        provider.provider_type = Some(IdentityStoreType::VmwareDirectory);
        provider.authentication_type = Some(AuthenticationType::Password);
        provider.user_base_dn = Some(domain.clone());
        provider.group_base_dn = Some(domain);
        provider.user_name = Some(admin_user.to_string()).filter(|u| !u.is_empty());
        provider.password = Some(admin_password.to_string()).filter(|p| !p.is_empty());
        provider.authn_types = AuthnTypes {
            password: true,
            ..AuthnTypes::default()
        };
        provider
    }

    pub fn get_tenant(&self, name: &str) -> ConfigResult<Option<Tenant>> {
        self.with_connection(|conn| {
            let Some(tenants) = self.tenants_dn(conn, false)? else {
                return Ok(None);
            };
            Ok(tenant_descriptor().retrieve_one(conn, &tenants, SearchScope::OneLevel, name)?)
        })
    }

    pub fn get_all_tenants(&self) -> ConfigResult<Vec<Tenant>> {
        self.with_connection(|conn| {
            let Some(tenants) = self.tenants_dn(conn, false)? else {
                return Ok(Vec::new());
            };
            Ok(tenant_descriptor().search_all(conn, &tenants, SearchScope::OneLevel, None)?)
        })
    }

    /// Rewrite the mutable attributes (GUID, issuer name) of an existing
    /// tenant.
    pub fn set_tenant(&self, tenant: &Tenant) -> ConfigResult<()> {
        self.with_connection(|conn| {
            let dn = self.tenant_root(conn, &tenant.name)?;
            tenant_descriptor().update(conn, &dn, tenant)?;
            info!(tenant = %tenant.name, "tenant updated");
            Ok(())
        })
    }

    /// Delete a tenant and everything beneath it. A tenant that was the
    /// default tenant stops being the default.
    pub fn delete_tenant(&self, name: &str) -> ConfigResult<()> {
        self.with_connection(|conn| {
            let dn = self.tenant_root(conn, name)?;
            if let Some(tenants) = self.tenants_dn(conn, false)? {
                for attribute in [tenant::attr::DEFAULT_TENANT, tenant::attr::SYSTEM_TENANT] {
                    let current = self.container_property(conn, &tenants, attribute)?;
                    if current.as_deref().is_some_and(|c| same_name(c, name)) {
                        tenants_container_descriptor().set_property(
                            conn,
                            &tenants,
                            attribute,
                            Default::default(),
                        )?;
                        warn!(tenant = name, attribute, "cleared reference to deleted tenant");
                    }
                }
            }
            let removed = delete_subtree(conn, &dn)?;
            info!(tenant = name, removed, "tenant deleted");
            Ok(())
        })
    }

    // ---- Default and system tenant ----

    pub(crate) fn container_property(
        &self,
        conn: &dyn DirectoryConnection,
        tenants: &Dn,
        attribute: &str,
    ) -> ConfigResult<Option<String>> {
        let raw = tenants_container_descriptor().get_property(
            conn,
            tenants,
            SearchScope::Base,
            "",
            attribute,
        )?;
        raw.map(|raw| decode::<String>(attribute, &raw)).transpose()
    }

    fn read_tenant_reference(&self, attribute: &str) -> ConfigResult<Option<String>> {
        self.with_connection(|conn| match self.tenants_dn(conn, false)? {
            Some(tenants) => self.container_property(conn, &tenants, attribute),
            None => Ok(None),
        })
    }

    fn write_tenant_reference(&self, attribute: &str, name: &str) -> ConfigResult<()> {
        self.with_connection(|conn| {
            // The canonical spelling comes from the stored tenant.
            let dn = self.tenant_root(conn, name)?;
            let canonical = dn.leaf_value().unwrap_or(name).to_string();
            let tenants = self
                .tenants_dn(conn, true)?
                .ok_or_else(|| ConfigError::InvalidConfig("tenants container unavailable".into()))?;
            tenants_container_descriptor().set_property(conn, &tenants, attribute, canonical.encode())?;
            info!(tenant = %canonical, attribute, "tenant reference set");
            Ok(())
        })
    }

    pub fn get_default_tenant(&self) -> ConfigResult<Option<String>> {
        self.read_tenant_reference(tenant::attr::DEFAULT_TENANT)
    }

    pub fn set_default_tenant(&self, name: &str) -> ConfigResult<()> {
        self.write_tenant_reference(tenant::attr::DEFAULT_TENANT, name)
    }

    pub fn get_system_tenant(&self) -> ConfigResult<Option<String>> {
        self.read_tenant_reference(tenant::attr::SYSTEM_TENANT)
    }

    pub fn set_system_tenant(&self, name: &str) -> ConfigResult<()> {
        self.write_tenant_reference(tenant::attr::SYSTEM_TENANT, name)
    }

    // ---- Tenant properties ----

    pub(crate) fn read_tenant_property<T: AttributeValue>(
        &self,
        conn: &dyn DirectoryConnection,
        tenant_dn: &Dn,
        attribute: &str,
    ) -> ConfigResult<Option<T>> {
        let raw = tenant_descriptor().get_property(conn, tenant_dn, SearchScope::Base, "", attribute)?;
        raw.map(|raw| decode::<T>(attribute, &raw)).transpose()
    }

    fn tenant_property<T: AttributeValue>(&self, tenant: &str, attribute: &str) -> ConfigResult<Option<T>> {
        self.with_connection(|conn| {
            let dn = self.tenant_root(conn, tenant)?;
            self.read_tenant_property(conn, &dn, attribute)
        })
    }

    /// Overwrite one tenant property; `None` clears it.
    fn set_tenant_property<T: AttributeValue>(
        &self,
        tenant: &str,
        attribute: &str,
        value: Option<T>,
    ) -> ConfigResult<()> {
        self.with_connection(|conn| {
            let dn = self.tenant_root(conn, tenant)?;
            let raw = value.map(|v| v.encode()).unwrap_or_default();
            tenant_descriptor().set_property(conn, &dn, attribute, raw)?;
            Ok(())
        })
    }

    pub fn get_clock_tolerance(&self, tenant: &str) -> ConfigResult<i64> {
        Ok(self
            .tenant_property(tenant, tenant::attr::CLOCK_TOLERANCE)?
            .unwrap_or(self.settings().tenant_defaults.clock_tolerance_ms))
    }

    pub fn set_clock_tolerance(&self, tenant: &str, millis: i64) -> ConfigResult<()> {
        let millis = non_negative("clock tolerance", millis)?;
        self.set_tenant_property(tenant, tenant::attr::CLOCK_TOLERANCE, Some(millis))
    }

    pub fn get_delegation_count(&self, tenant: &str) -> ConfigResult<i32> {
        Ok(self
            .tenant_property(tenant, tenant::attr::DELEGATION_COUNT)?
            .unwrap_or(self.settings().tenant_defaults.delegation_count))
    }

    pub fn set_delegation_count(&self, tenant: &str, count: i32) -> ConfigResult<()> {
        let count = non_negative("delegation count", count)?;
        self.set_tenant_property(tenant, tenant::attr::DELEGATION_COUNT, Some(count))
    }

    pub fn get_renew_count(&self, tenant: &str) -> ConfigResult<i32> {
        Ok(self
            .tenant_property(tenant, tenant::attr::RENEW_COUNT)?
            .unwrap_or(self.settings().tenant_defaults.renew_count))
    }

    pub fn set_renew_count(&self, tenant: &str, count: i32) -> ConfigResult<()> {
        let count = non_negative("renew count", count)?;
        self.set_tenant_property(tenant, tenant::attr::RENEW_COUNT, Some(count))
    }

    pub fn get_max_bearer_token_lifetime(&self, tenant: &str) -> ConfigResult<i64> {
        Ok(self
            .tenant_property(tenant, tenant::attr::MAX_BEARER_TOKEN_LIFETIME)?
            .unwrap_or(self.settings().tenant_defaults.max_bearer_token_lifetime_ms))
    }

    pub fn set_max_bearer_token_lifetime(&self, tenant: &str, millis: i64) -> ConfigResult<()> {
        let millis = non_negative("bearer token lifetime", millis)?;
        self.set_tenant_property(tenant, tenant::attr::MAX_BEARER_TOKEN_LIFETIME, Some(millis))
    }

    pub fn get_max_hok_token_lifetime(&self, tenant: &str) -> ConfigResult<i64> {
        Ok(self
            .tenant_property(tenant, tenant::attr::MAX_HOK_TOKEN_LIFETIME)?
            .unwrap_or(self.settings().tenant_defaults.max_hok_token_lifetime_ms))
    }

    pub fn set_max_hok_token_lifetime(&self, tenant: &str, millis: i64) -> ConfigResult<()> {
        let millis = non_negative("holder-of-key token lifetime", millis)?;
        self.set_tenant_property(tenant, tenant::attr::MAX_HOK_TOKEN_LIFETIME, Some(millis))
    }

    pub fn get_max_bearer_refresh_token_lifetime(&self, tenant: &str) -> ConfigResult<i64> {
        Ok(self
            .tenant_property(tenant, tenant::attr::MAX_BEARER_REFRESH_TOKEN_LIFETIME)?
            .unwrap_or(self.settings().tenant_defaults.max_bearer_refresh_token_lifetime_ms))
    }

    pub fn set_max_bearer_refresh_token_lifetime(&self, tenant: &str, millis: i64) -> ConfigResult<()> {
        let millis = non_negative("bearer refresh token lifetime", millis)?;
        self.set_tenant_property(tenant, tenant::attr::MAX_BEARER_REFRESH_TOKEN_LIFETIME, Some(millis))
    }

    pub fn get_max_hok_refresh_token_lifetime(&self, tenant: &str) -> ConfigResult<i64> {
        Ok(self
            .tenant_property(tenant, tenant::attr::MAX_HOK_REFRESH_TOKEN_LIFETIME)?
            .unwrap_or(self.settings().tenant_defaults.max_hok_refresh_token_lifetime_ms))
    }

    pub fn set_max_hok_refresh_token_lifetime(&self, tenant: &str, millis: i64) -> ConfigResult<()> {
        let millis = non_negative("holder-of-key refresh token lifetime", millis)?;
        self.set_tenant_property(tenant, tenant::attr::MAX_HOK_REFRESH_TOKEN_LIFETIME, Some(millis))
    }

    pub fn get_signature_algorithm(&self, tenant: &str) -> ConfigResult<Option<String>> {
        self.tenant_property(tenant, tenant::attr::SIGNATURE_ALGORITHM)
    }

    pub fn set_signature_algorithm(&self, tenant: &str, algorithm: Option<&str>) -> ConfigResult<()> {
        self.set_tenant_property(tenant, tenant::attr::SIGNATURE_ALGORITHM, algorithm.map(str::to_string))
    }

    pub fn get_entity_id(&self, tenant: &str) -> ConfigResult<Option<String>> {
        self.tenant_property(tenant, tenant::attr::ENTITY_ID)
    }

    pub fn set_entity_id(&self, tenant: &str, entity_id: Option<&str>) -> ConfigResult<()> {
        self.set_tenant_property(tenant, tenant::attr::ENTITY_ID, entity_id.map(str::to_string))
    }

    pub fn get_tenant_alias(&self, tenant: &str) -> ConfigResult<Option<String>> {
        self.tenant_property(tenant, tenant::attr::ALIAS)
    }

    pub fn set_tenant_alias(&self, tenant: &str, alias: Option<&str>) -> ConfigResult<()> {
        self.set_tenant_property(tenant, tenant::attr::ALIAS, alias.map(str::to_string))
    }

    pub fn get_brand_name(&self, tenant: &str) -> ConfigResult<Option<String>> {
        self.tenant_property(tenant, tenant::attr::BRAND_NAME)
    }

    pub fn set_brand_name(&self, tenant: &str, brand: Option<&str>) -> ConfigResult<()> {
        self.set_tenant_property(tenant, tenant::attr::BRAND_NAME, brand.map(str::to_string))
    }

    pub fn get_logon_banner_title(&self, tenant: &str) -> ConfigResult<Option<String>> {
        self.tenant_property(tenant, tenant::attr::LOGON_BANNER_TITLE)
    }

    pub fn set_logon_banner_title(&self, tenant: &str, title: Option<&str>) -> ConfigResult<()> {
        self.set_tenant_property(tenant, tenant::attr::LOGON_BANNER_TITLE, title.map(str::to_string))
    }

    pub fn get_logon_banner_content(&self, tenant: &str) -> ConfigResult<Option<String>> {
        self.tenant_property(tenant, tenant::attr::LOGON_BANNER_CONTENT)
    }

    pub fn set_logon_banner_content(&self, tenant: &str, content: Option<&str>) -> ConfigResult<()> {
        self.set_tenant_property(tenant, tenant::attr::LOGON_BANNER_CONTENT, content.map(str::to_string))
    }

    pub fn get_logon_banner_checkbox(&self, tenant: &str) -> ConfigResult<bool> {
        Ok(self
            .tenant_property(tenant, tenant::attr::LOGON_BANNER_ENABLE_CHECKBOX)?
            .unwrap_or(false))
    }

    pub fn set_logon_banner_checkbox(&self, tenant: &str, enabled: bool) -> ConfigResult<()> {
        self.set_tenant_property(tenant, tenant::attr::LOGON_BANNER_ENABLE_CHECKBOX, Some(enabled))
    }

    pub fn get_enable_idp_selection(&self, tenant: &str) -> ConfigResult<bool> {
        Ok(self
            .tenant_property(tenant, tenant::attr::ENABLE_IDP_SELECTION)?
            .unwrap_or(true))
    }

    pub fn set_enable_idp_selection(&self, tenant: &str, enabled: bool) -> ConfigResult<()> {
        self.set_tenant_property(tenant, tenant::attr::ENABLE_IDP_SELECTION, Some(enabled))
    }

    /// Authentication methods allowed tenant-wide. Unset means none.
    pub fn get_authn_types(&self, tenant: &str) -> ConfigResult<AuthnTypes> {
        Ok(self
            .tenant_property(tenant, tenant::attr::AUTHN_TYPES)?
            .unwrap_or_default())
    }

    pub fn set_authn_types(&self, tenant: &str, types: AuthnTypes) -> ConfigResult<()> {
        self.set_tenant_property(tenant, tenant::attr::AUTHN_TYPES, Some(types))
    }

    // ---- Tenant attributes ----

    /// The SAML attributes the tenant advertises, in saved order.
    pub fn get_tenant_attributes(&self, tenant: &str) -> ConfigResult<Vec<Attribute>> {
        self.with_connection(|conn| {
            let dn = self.tenant_root(conn, tenant)?;
            Ok(load_indexed(
                conn,
                &dn,
                names::ATTRIBUTES,
                attribute_descriptor(),
                true,
                |_, _, _| Ok(()),
            )?)
        })
    }

    /// Replace the tenant's attribute list.
    pub fn set_tenant_attributes(&self, tenant: &str, attributes: &[Attribute]) -> ConfigResult<()> {
        self.with_connection(|conn| {
            let dn = self.tenant_root(conn, tenant)?;
            save_indexed(
                conn,
                &dn,
                names::ATTRIBUTES,
                attribute_descriptor(),
                attributes,
                |_, _, _| Ok(()),
            )?;
            info!(tenant, count = attributes.len(), "tenant attributes saved");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config_store, store_with_tenant, tenant_dn};
    use dirconf_entities::DomainType;
    use proptest::prelude::*;

    fn names_of(tenants: &[Tenant]) -> Vec<String> {
        let mut names: Vec<String> = tenants.iter().map(|t| t.name.clone()).collect();
        names.sort();
        names
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn tenant_bootstrap_and_teardown() {
        let (dir, store) = config_store();
        store
            .add_tenant(&Tenant::new("acme"), "Administrator", "s3cret")
            .unwrap();

        assert_eq!(names_of(&store.get_all_tenants().unwrap()), vec!["acme"]);
        let acme = store.get_tenant("acme").unwrap().unwrap();
        assert_eq!(acme.name, "acme");
        let guid = acme.guid.clone().unwrap();
        assert!(Uuid::parse_str(&guid).is_ok());
        assert_eq!(acme.tenant_key.as_deref().map(str::len), Some(16));

        store.delete_tenant("acme").unwrap();
        assert!(store.get_all_tenants().unwrap().is_empty());
        assert!(store.get_tenant("acme").unwrap().is_none());
        assert!(!dir.contains(&tenant_dn("acme")));
    }

    #[test]
    fn supplied_guid_is_kept() {
        let (_, store) = config_store();
        let mut tenant = Tenant::new("acme");
        tenant.guid = Some("fixed-guid".into());
        tenant.long_name = Some("Acme Corporation".into());
        store.add_tenant(&tenant, "admin", "pw").unwrap();
        let back = store.get_tenant("ACME").unwrap().unwrap();
        assert_eq!(back.guid.as_deref(), Some("fixed-guid"));
        assert_eq!(back.long_name.as_deref(), Some("Acme Corporation"));
    }

    #[test]
    fn duplicate_tenant_rejected() {
        let (_, store) = store_with_tenant("acme");
        let err = store
            .add_tenant(&Tenant::new("Acme"), "admin", "pw")
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTenant(_)));
        assert_eq!(store.get_all_tenants().unwrap().len(), 1);
    }

    #[test]
    fn invalid_tenant_name_rejected() {
        let (_, store) = config_store();
        assert!(matches!(
            store.add_tenant(&Tenant::new(" padded"), "admin", "pw"),
            Err(ConfigError::InvalidName(_))
        ));
    }

    #[test]
    fn system_domain_created_with_tenant() {
        let (_, store) = store_with_tenant("vsphere.local");
        let provider = store
            .get_provider("vsphere.local", "vsphere.local")
            .unwrap()
            .unwrap();
        assert_eq!(provider.domain_type, DomainType::SystemDomain);
        assert_eq!(provider.user_base_dn.as_deref(), Some("dc=vsphere,dc=local"));
        assert_eq!(provider.user_name.as_deref(), Some("Administrator"));
        assert_eq!(provider.password.as_deref(), Some("changeme"));
        assert!(provider.authn_types.password);
    }

    #[test]
    fn set_tenant_updates_issuer() {
        let (_, store) = store_with_tenant("acme");
        let mut tenant = store.get_tenant("acme").unwrap().unwrap();
        tenant.issuer_name = Some("https://sso.acme.test/websso".into());
        store.set_tenant(&tenant).unwrap();
        assert_eq!(
            store.get_tenant("acme").unwrap().unwrap().issuer_name.as_deref(),
            Some("https://sso.acme.test/websso")
        );
        assert!(matches!(
            store.set_tenant(&Tenant::new("ghost")),
            Err(ConfigError::NoSuchTenant(_))
        ));
    }

    #[test]
    fn delete_missing_tenant_fails() {
        let (_, store) = config_store();
        assert!(matches!(
            store.delete_tenant("ghost"),
            Err(ConfigError::NoSuchTenant(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Default / system tenant
    // -----------------------------------------------------------------------

    #[test]
    fn default_tenant_cleared_on_delete() {
        let (_, store) = store_with_tenant("acme");
        store.add_tenant(&Tenant::new("other"), "admin", "pw").unwrap();
        assert_eq!(store.get_default_tenant().unwrap(), None);

        store.set_default_tenant("ACME").unwrap();
        store.set_system_tenant("other").unwrap();
        assert_eq!(store.get_default_tenant().unwrap().as_deref(), Some("acme"));

        store.delete_tenant("acme").unwrap();
        assert_eq!(store.get_default_tenant().unwrap(), None);
        assert_eq!(store.get_system_tenant().unwrap().as_deref(), Some("other"));
    }

    #[test]
    fn default_tenant_must_exist() {
        let (_, store) = store_with_tenant("acme");
        assert!(matches!(
            store.set_default_tenant("ghost"),
            Err(ConfigError::NoSuchTenant(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    #[test]
    fn unset_properties_report_defaults() {
        let (_, store) = store_with_tenant("acme");
        let defaults = store.settings().tenant_defaults.clone();
        assert_eq!(store.get_clock_tolerance("acme").unwrap(), defaults.clock_tolerance_ms);
        assert_eq!(store.get_delegation_count("acme").unwrap(), defaults.delegation_count);
        assert_eq!(store.get_renew_count("acme").unwrap(), defaults.renew_count);
        assert_eq!(
            store.get_max_hok_refresh_token_lifetime("acme").unwrap(),
            defaults.max_hok_refresh_token_lifetime_ms
        );
        assert_eq!(store.get_brand_name("acme").unwrap(), None);
        assert!(!store.get_logon_banner_checkbox("acme").unwrap());
        assert!(store.get_enable_idp_selection("acme").unwrap());
        assert_eq!(store.get_authn_types("acme").unwrap(), AuthnTypes::default());
    }

    #[test]
    fn properties_roundtrip_and_clear() {
        let (_, store) = store_with_tenant("acme");
        store.set_clock_tolerance("acme", 1_000).unwrap();
        store.set_renew_count("acme", 3).unwrap();
        store.set_max_bearer_token_lifetime("acme", 60_000).unwrap();
        store.set_brand_name("acme", Some("Acme SSO")).unwrap();
        store.set_logon_banner_title("acme", Some("Notice")).unwrap();
        store.set_logon_banner_content("acme", Some("Authorized use only")).unwrap();
        store.set_logon_banner_checkbox("acme", true).unwrap();
        store.set_signature_algorithm("acme", Some("RSA-SHA256")).unwrap();
        store
            .set_authn_types(
                "acme",
                AuthnTypes {
                    password: true,
                    tls_certificate: true,
                    ..AuthnTypes::default()
                },
            )
            .unwrap();

        assert_eq!(store.get_clock_tolerance("acme").unwrap(), 1_000);
        assert_eq!(store.get_renew_count("acme").unwrap(), 3);
        assert_eq!(store.get_max_bearer_token_lifetime("acme").unwrap(), 60_000);
        assert_eq!(store.get_brand_name("acme").unwrap().as_deref(), Some("Acme SSO"));
        assert_eq!(store.get_logon_banner_title("acme").unwrap().as_deref(), Some("Notice"));
        assert!(store.get_logon_banner_checkbox("acme").unwrap());
        assert_eq!(store.get_signature_algorithm("acme").unwrap().as_deref(), Some("RSA-SHA256"));
        let types = store.get_authn_types("acme").unwrap();
        assert!(types.password && types.tls_certificate && !types.windows);

        store.set_brand_name("acme", None).unwrap();
        assert_eq!(store.get_brand_name("acme").unwrap(), None);
    }

    #[test]
    fn negative_counters_rejected() {
        let (_, store) = store_with_tenant("acme");
        assert!(matches!(
            store.set_delegation_count("acme", -1),
            Err(ConfigError::InvalidArgument(_))
        ));
        assert!(matches!(
            store.set_max_hok_token_lifetime("acme", -5),
            Err(ConfigError::InvalidArgument(_))
        ));
        assert_eq!(
            store.get_delegation_count("acme").unwrap(),
            store.settings().tenant_defaults.delegation_count
        );
    }

    #[test]
    fn properties_of_missing_tenant_fail() {
        let (_, store) = config_store();
        assert!(matches!(
            store.get_clock_tolerance("ghost"),
            Err(ConfigError::NoSuchTenant(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Attributes
    // -----------------------------------------------------------------------

    #[test]
    fn tenant_attributes_replace_previous_list() {
        let (dir, store) = store_with_tenant("acme");
        let first = vec![Attribute::new("a"), Attribute::new("b"), Attribute::new("c")];
        store.set_tenant_attributes("acme", &first).unwrap();
        assert_eq!(store.get_tenant_attributes("acme").unwrap(), first);

        let second = vec![Attribute::new("z")];
        store.set_tenant_attributes("acme", &second).unwrap();
        assert_eq!(store.get_tenant_attributes("acme").unwrap(), second);
        let container = tenant_dn("acme").child_cn("Attributes").unwrap();
        assert!(!dir.contains(&container.child_cn("Attribute-1").unwrap()));
    }

    #[test]
    fn domain_dn_components() {
        assert_eq!(domain_dn("vsphere.local"), "dc=vsphere,dc=local");
        assert_eq!(domain_dn("acme"), "dc=acme");
    }

    proptest! {
        #[test]
        fn domain_dn_parses_with_one_rdn_per_label(labels in prop::collection::vec("[a-z][a-z0-9-]{0,10}", 1..5)) {
            let dn = Dn::parse(&domain_dn(&labels.join("."))).unwrap();
            prop_assert_eq!(dn.rdns().len(), labels.len());
            prop_assert_eq!(dn.leaf_value(), Some(labels[0].as_str()));
        }
    }
}
