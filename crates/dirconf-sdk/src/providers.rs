//! Identity providers of a tenant.
//!
//! Providers live in the tenant's `IdentityProviders` container. A provider
//! whose alias differs from its name also gets an alias object there, so it
//! can be found by either. Bind passwords are stored encrypted with the
//! tenant key and decrypted on read.

use tracing::{info, warn};

use dirconf_entities::provider::{self, identity_provider_alias_descriptor, identity_provider_descriptor};
use dirconf_entities::tenant::{self, tenant_descriptor};
use dirconf_entities::{
    attribute_map_descriptor, names, AttributeMapEntry, AuthnTypes, DomainType, IdentityProvider,
    IdentityProviderAlias, IdentityStoreType,
};
use dirconf_mapper::{delete_subtree, load_indexed, save_indexed, AttributeValue, MapperError};
use dirconf_store::{ConnectionFactory, DirectoryConnection, Modification, StoreError};
use dirconf_types::names::validate_common_name;
use dirconf_types::{Dn, Filter, RawValue, SearchScope};

use crate::error::{ConfigError, ConfigResult};
use crate::store::{same_name, ConfigStore};

impl<F: ConnectionFactory> ConfigStore<F> {
    fn providers_container(
        &self,
        conn: &dyn DirectoryConnection,
        tenant_dn: &Dn,
        create: bool,
    ) -> ConfigResult<Option<Dn>> {
        self.tenant_container(conn, tenant_dn, names::IDENTITY_PROVIDERS, create)
    }

    /// DN of the provider called `name`, looked up by name first and then
    /// through the alias objects.
    fn find_provider(
        &self,
        conn: &dyn DirectoryConnection,
        container: &Dn,
        name: &str,
    ) -> ConfigResult<Option<Dn>> {
        let by_name =
            identity_provider_descriptor().lookup_one(conn, container, SearchScope::OneLevel, name, None)?;
        if by_name.is_some() {
            return Ok(by_name);
        }
        let alias = identity_provider_alias_descriptor().retrieve_one(
            conn,
            container,
            SearchScope::OneLevel,
            name,
        )?;
        Ok(alias.map(|a| a.provider_dn))
    }

    fn load_provider(
        &self,
        conn: &dyn DirectoryConnection,
        dn: &Dn,
        tenant_key: &str,
    ) -> ConfigResult<Option<IdentityProvider>> {
        let Some(mut provider) =
            identity_provider_descriptor().retrieve_one(conn, dn, SearchScope::Base, "")?
        else {
            return Ok(None);
        };
        self.hydrate_provider(conn, dn, tenant_key, &mut provider)?;
        Ok(Some(provider))
    }

    fn hydrate_provider(
        &self,
        conn: &dyn DirectoryConnection,
        dn: &Dn,
        tenant_key: &str,
        provider: &mut IdentityProvider,
    ) -> ConfigResult<()> {
        provider.password = self.decrypt_secret(tenant_key, provider.password.as_deref())?;
        let descriptor = attribute_map_descriptor();
        provider.attribute_map = AttributeMapEntry::into_map(load_indexed(
            conn,
            dn,
            names::ATTRIBUTES_MAP,
            descriptor,
            true,
            |_, _, _| Ok(()),
        )?);
        provider.schema_mapping = AttributeMapEntry::into_map(load_indexed(
            conn,
            dn,
            names::SCHEMA_MAPPING,
            descriptor,
            true,
            |_, _, _| Ok(()),
        )?);
        Ok(())
    }

    /// Write `provider` with its maps and alias object. The password is
    /// encrypted on the way in.
    pub(crate) fn create_provider(
        &self,
        conn: &dyn DirectoryConnection,
        tenant_dn: &Dn,
        tenant_key: &str,
        provider: &IdentityProvider,
    ) -> ConfigResult<Dn> {
        let container = self
            .providers_container(conn, tenant_dn, true)?
            .ok_or_else(|| ConfigError::InvalidConfig("identity providers container unavailable".into()))?;

        let mut stored = provider.clone();
        stored.password = self.encrypt_secret(tenant_key, provider.password.as_deref())?;

        let descriptor = identity_provider_descriptor();
        let dn = descriptor.dn_for(&container, &stored)?;
        match descriptor.create(conn, &dn, &stored) {
            Ok(()) => {}
            Err(MapperError::AlreadyExists(_)) => {
                return Err(ConfigError::DuplicateProvider(provider.name.clone()))
            }
            Err(e) => return Err(e.into()),
        }

        let maps = attribute_map_descriptor();
        save_indexed(
            conn,
            &dn,
            names::ATTRIBUTES_MAP,
            maps,
            &AttributeMapEntry::from_map(&provider.attribute_map),
            |_, _, _| Ok(()),
        )?;
        save_indexed(
            conn,
            &dn,
            names::SCHEMA_MAPPING,
            maps,
            &AttributeMapEntry::from_map(&provider.schema_mapping),
            |_, _, _| Ok(()),
        )?;

        if let Some(alias) = provider.distinct_alias() {
            let alias_object = IdentityProviderAlias {
                alias: alias.to_string(),
                provider_dn: dn.clone(),
            };
            let aliases = identity_provider_alias_descriptor();
            let alias_dn = aliases.dn_for(&container, &alias_object)?;
            match aliases.create(conn, &alias_dn, &alias_object) {
                Ok(()) => {}
                Err(MapperError::AlreadyExists(_)) => {
                    return Err(ConfigError::DuplicateProvider(alias.to_string()))
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(dn)
    }

    /// Validate `provider` against the providers already in `container`.
    /// The entry at `replacing`, if any, is left out of the conflict checks.
    fn check_provider(
        &self,
        conn: &dyn DirectoryConnection,
        tenant: &str,
        container: Option<&Dn>,
        provider: &IdentityProvider,
        replacing: Option<&Dn>,
    ) -> ConfigResult<()> {
        validate_common_name(&provider.name)?;
        let existing: Vec<IdentityProvider> = match container {
            Some(container) => identity_provider_descriptor()
                .search_all_with_dn(conn, container, SearchScope::OneLevel, None)?
                .into_iter()
                .filter(|(dn, _)| replacing != Some(dn))
                .map(|(_, p)| p)
                .collect(),
            None => Vec::new(),
        };

        match provider.domain_type {
            DomainType::SystemDomain => {
                return Err(ConfigError::invalid(
                    "system domain providers are created together with their tenant",
                ));
            }
            DomainType::LocalOsDomain => {
                let default_tenant = match self.tenants_dn(conn, false)? {
                    Some(tenants) => self.container_property(conn, &tenants, tenant::attr::DEFAULT_TENANT)?,
                    None => None,
                };
                if !default_tenant.as_deref().is_some_and(|d| same_name(d, tenant)) {
                    return Err(ConfigError::invalid(
                        "a local OS provider can only be added to the default tenant",
                    ));
                }
                if let Some(other) = existing
                    .iter()
                    .find(|p| p.domain_type == DomainType::LocalOsDomain)
                {
                    return Err(ConfigError::DuplicateProvider(other.name.clone()));
                }
            }
            DomainType::ExternalDomain => {
                let has_connection = provider.connection_strings.iter().any(|c| !c.is_empty());
                if !has_connection && provider.provider_type != Some(IdentityStoreType::ActiveDirectory) {
                    return Err(ConfigError::invalid(format!(
                        "provider {} needs at least one connection string",
                        provider.name
                    )));
                }
            }
        }

        let alias = provider.alias.as_deref().filter(|a| !a.is_empty());
        if let Some(conflict) = existing
            .iter()
            .find(|p| p.is_known_as(&provider.name) || alias.is_some_and(|a| p.is_known_as(a)))
        {
            return Err(ConfigError::DuplicateProvider(conflict.name.clone()));
        }
        Ok(())
    }

    /// Delete the provider at `dn`, its alias objects and everything beneath
    /// it. Clears the tenant's default provider when it named this one.
    fn remove_provider(
        &self,
        conn: &dyn DirectoryConnection,
        tenant: &str,
        tenant_dn: &Dn,
        container: &Dn,
        dn: &Dn,
        found: &IdentityProvider,
    ) -> ConfigResult<()> {
        let aliases = identity_provider_alias_descriptor();
        let pointing_here = Filter::equality(provider::attr::ALIASED_OBJECT_NAME, dn.to_string());
        for alias_dn in aliases.lookup_many(conn, container, SearchScope::OneLevel, "", Some(&pointing_here))? {
            aliases.delete(conn, &alias_dn)?;
        }
        let removed = delete_subtree(conn, dn)?;

        if self.is_default_provider(conn, tenant_dn, found)? {
            tenant_descriptor().set_property(
                conn,
                tenant_dn,
                tenant::attr::DEFAULT_PROVIDER,
                RawValue::empty(),
            )?;
            warn!(tenant, provider = %found.name, "default provider deleted; default cleared");
        }
        info!(tenant, provider = %found.name, removed, "identity provider deleted");
        Ok(())
    }

    fn is_default_provider(
        &self,
        conn: &dyn DirectoryConnection,
        tenant_dn: &Dn,
        provider: &IdentityProvider,
    ) -> ConfigResult<bool> {
        let default: Option<String> =
            self.read_tenant_property(conn, tenant_dn, tenant::attr::DEFAULT_PROVIDER)?;
        Ok(default.as_deref().is_some_and(|d| provider.is_known_as(d)))
    }

    // ---- Providers ----

    /// Register a local OS or external provider.
    ///
    /// Neither its name nor its alias may match the name or alias of an
    /// existing provider. An external provider needs a connection string
    /// unless it is an Active Directory provider, which can locate its
    /// domain controllers itself.
    pub fn add_provider(&self, tenant: &str, provider: &IdentityProvider) -> ConfigResult<()> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let container = self.providers_container(conn, &tenant_dn, false)?;
            self.check_provider(conn, tenant, container.as_ref(), provider, None)?;

            let tenant_key = self.tenant_key(conn, &tenant_dn)?;
            self.create_provider(conn, &tenant_dn, &tenant_key, provider)?;
            info!(
                tenant,
                provider = %provider.name,
                domain_type = %provider.domain_type,
                "identity provider added"
            );
            Ok(())
        })
    }

    /// The provider called `name` (or aliased as `name`), with its password
    /// decrypted and its maps loaded.
    pub fn get_provider(&self, tenant: &str, name: &str) -> ConfigResult<Option<IdentityProvider>> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let Some(container) = self.providers_container(conn, &tenant_dn, false)? else {
                return Ok(None);
            };
            let Some(dn) = self.find_provider(conn, &container, name)? else {
                return Ok(None);
            };
            let tenant_key = self.tenant_key(conn, &tenant_dn)?;
            self.load_provider(conn, &dn, &tenant_key)
        })
    }

    /// Providers whose domain type is one of `domain_types`; every provider
    /// when the list is empty.
    pub fn get_providers(&self, tenant: &str, domain_types: &[DomainType]) -> ConfigResult<Vec<IdentityProvider>> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let Some(container) = self.providers_container(conn, &tenant_dn, false)? else {
                return Ok(Vec::new());
            };
            let descriptor = identity_provider_descriptor();
            let filter = descriptor.in_set_filter(
                provider::attr::DOMAIN_TYPE,
                domain_types.iter().map(DomainType::as_str),
            )?;
            let tenant_key = self.tenant_key(conn, &tenant_dn)?;
            let mut providers = Vec::new();
            for (dn, mut provider) in
                descriptor.search_all_with_dn(conn, &container, SearchScope::OneLevel, filter.as_ref())?
            {
                self.hydrate_provider(conn, &dn, &tenant_key, &mut provider)?;
                providers.push(provider);
            }
            Ok(providers)
        })
    }

    /// Update the provider called (or aliased as) `provider.name`.
    ///
    /// An external provider is validated like a new one, ignoring the entry
    /// it replaces, then deleted and added again; its default-provider
    /// status is carried across. A system domain provider is updated in
    /// place, which is how its bind credentials change. Local OS providers
    /// cannot be updated.
    pub fn set_provider(&self, tenant: &str, provider: &IdentityProvider) -> ConfigResult<()> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let no_such = || ConfigError::NoSuchProvider(provider.name.clone());
            let container = self
                .providers_container(conn, &tenant_dn, false)?
                .ok_or_else(no_such)?;
            let dn = self.find_provider(conn, &container, &provider.name)?.ok_or_else(no_such)?;
            let current = identity_provider_descriptor()
                .retrieve_one(conn, &dn, SearchScope::Base, "")?
                .ok_or_else(no_such)?;
            if current.domain_type != provider.domain_type {
                return Err(ConfigError::invalid(format!(
                    "provider {} is a {} provider, not {}",
                    current.name, current.domain_type, provider.domain_type
                )));
            }

            match provider.domain_type {
                DomainType::ExternalDomain => {
                    self.check_provider(conn, tenant, Some(&container), provider, Some(&dn))?;
                    let was_default = self.is_default_provider(conn, &tenant_dn, &current)?;
                    self.remove_provider(conn, tenant, &tenant_dn, &container, &dn, &current)?;

                    let tenant_key = self.tenant_key(conn, &tenant_dn)?;
                    self.create_provider(conn, &tenant_dn, &tenant_key, provider)?;
                    if was_default {
                        tenant_descriptor().set_property(
                            conn,
                            &tenant_dn,
                            tenant::attr::DEFAULT_PROVIDER,
                            provider.name.encode(),
                        )?;
                    }
                }
                DomainType::SystemDomain => {
                    let tenant_key = self.tenant_key(conn, &tenant_dn)?;
                    let mut stored = provider.clone();
                    stored.password = self.encrypt_secret(&tenant_key, provider.password.as_deref())?;
                    identity_provider_descriptor().update(conn, &dn, &stored)?;
                }
                DomainType::LocalOsDomain => {
                    return Err(ConfigError::invalid(format!(
                        "local OS provider {} cannot be updated",
                        provider.name
                    )));
                }
            }
            info!(
                tenant,
                provider = %provider.name,
                domain_type = %provider.domain_type,
                "identity provider updated"
            );
            Ok(())
        })
    }

    /// Delete the provider called (or aliased as) `name`, its alias objects
    /// and everything beneath it.
    pub fn delete_provider(&self, tenant: &str, name: &str) -> ConfigResult<()> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let no_such = || ConfigError::NoSuchProvider(name.to_string());
            let container = self
                .providers_container(conn, &tenant_dn, false)?
                .ok_or_else(no_such)?;
            let dn = self.find_provider(conn, &container, name)?.ok_or_else(no_such)?;
            let found = identity_provider_descriptor()
                .retrieve_one(conn, &dn, SearchScope::Base, "")?
                .ok_or_else(no_such)?;
            self.remove_provider(conn, tenant, &tenant_dn, &container, &dn, &found)
        })
    }

    pub fn set_authn_types_for_provider(&self, tenant: &str, name: &str, types: AuthnTypes) -> ConfigResult<()> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let dn = self.require_provider(conn, &tenant_dn, name)?;
            identity_provider_descriptor().set_property(
                conn,
                &dn,
                provider::attr::AUTHN_TYPES,
                types.encode(),
            )?;
            Ok(())
        })
    }

    fn require_provider(&self, conn: &dyn DirectoryConnection, tenant_dn: &Dn, name: &str) -> ConfigResult<Dn> {
        let container = self.providers_container(conn, tenant_dn, false)?;
        let found = match container {
            Some(container) => self.find_provider(conn, &container, name)?,
            None => None,
        };
        found.ok_or_else(|| ConfigError::NoSuchProvider(name.to_string()))
    }

    // ---- UPN suffixes ----

    /// Add `suffix` to the provider's UPN suffixes. Returns `false` when it
    /// was already registered.
    pub fn register_upn_suffix(&self, tenant: &str, name: &str, suffix: &str) -> ConfigResult<bool> {
        let suffix = suffix.trim();
        if suffix.is_empty() {
            return Err(ConfigError::invalid("UPN suffix must not be empty"));
        }
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let dn = self.require_provider(conn, &tenant_dn, name)?;
            let add = Modification::add(provider::attr::UPN_SUFFIXES, RawValue::from(suffix));
            match conn.modify(&dn, &[add]) {
                Ok(()) => Ok(true),
                Err(StoreError::AttributeOrValueExists { .. }) => {
                    info!(tenant, provider = name, suffix, "UPN suffix already registered");
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Remove `suffix` from the provider's UPN suffixes. Returns `false`
    /// when it was not registered.
    pub fn unregister_upn_suffix(&self, tenant: &str, name: &str, suffix: &str) -> ConfigResult<bool> {
        let suffix = suffix.trim();
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let dn = self.require_provider(conn, &tenant_dn, name)?;
            let remove = Modification::delete_values(provider::attr::UPN_SUFFIXES, RawValue::from(suffix));
            match conn.modify(&dn, &[remove]) {
                Ok(()) => Ok(true),
                Err(StoreError::NoSuchAttribute { .. }) => {
                    info!(tenant, provider = name, suffix, "UPN suffix not registered");
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    // ---- Default provider ----

    /// The tenant's default provider, as a list of at most one name.
    pub fn get_default_providers(&self, tenant: &str) -> ConfigResult<Vec<String>> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let default: Option<String> =
                self.read_tenant_property(conn, &tenant_dn, tenant::attr::DEFAULT_PROVIDER)?;
            Ok(default.into_iter().collect())
        })
    }

    /// Set the default provider. An empty list clears it; more than one
    /// name is rejected. The name may be a provider's name or alias.
    pub fn set_default_providers(&self, tenant: &str, providers: &[String]) -> ConfigResult<()> {
        if providers.len() > 1 {
            return Err(ConfigError::invalid("a tenant has at most one default provider"));
        }
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let value = match providers.first() {
                Some(name) => {
                    self.require_provider(conn, &tenant_dn, name)?;
                    name.encode()
                }
                None => RawValue::empty(),
            };
            tenant_descriptor().set_property(
                conn,
                &tenant_dn,
                tenant::attr::DEFAULT_PROVIDER,
                value,
            )?;
            info!(tenant, default = ?providers.first(), "default provider set");
            Ok(())
        })
    }

    /// Alias objects of the tenant, for diagnostics.
    pub fn get_provider_aliases(&self, tenant: &str) -> ConfigResult<Vec<IdentityProviderAlias>> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            match self.providers_container(conn, &tenant_dn, false)? {
                Some(container) => Ok(identity_provider_alias_descriptor().search_all(
                    conn,
                    &container,
                    SearchScope::OneLevel,
                    None,
                )?),
                None => Ok(Vec::new()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::testing::{store_with_tenant, tenant_dn, MemoryStore};

    fn external(name: &str) -> IdentityProvider {
        let mut p = IdentityProvider::new(name, DomainType::ExternalDomain);
        p.provider_type = Some(IdentityStoreType::Ldap);
        p.connection_strings = vec![format!("ldaps://{name}:636")];
        p.user_name = Some(format!("cn=svc,dc={name}"));
        p.password = Some("bind-secret".into());
        p
    }

    fn with_alias(name: &str, alias: &str) -> IdentityProvider {
        let mut p = external(name);
        p.alias = Some(alias.into());
        p
    }

    fn provider_names(store: &MemoryStore, types: &[DomainType]) -> Vec<String> {
        let mut names: Vec<String> = store
            .get_providers("acme", types)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        names.sort();
        names
    }

    // -----------------------------------------------------------------------
    // Add / get
    // -----------------------------------------------------------------------

    #[test]
    fn add_then_get_hydrates_everything() {
        let (dir, store) = store_with_tenant("acme");
        let mut p = with_alias("corp.test", "CORP");
        p.attribute_map = BTreeMap::from([
            ("http://schemas.xmlsoap.org/claims/UPN".to_string(), "userPrincipalName".to_string()),
            ("http://schemas.xmlsoap.org/claims/Group".to_string(), "memberOf".to_string()),
        ]);
        p.schema_mapping = BTreeMap::from([("user".to_string(), "inetOrgPerson".to_string())]);
        store.add_provider("acme", &p).unwrap();

        let back = store.get_provider("acme", "corp.test").unwrap().unwrap();
        assert_eq!(back, p);

        let by_alias = store.get_provider("acme", "corp").unwrap().unwrap();
        assert_eq!(by_alias.name, "corp.test");

        // The stored password is not the plaintext.
        let stored = dir
            .get(&tenant_dn("acme").child_cn("IdentityProviders").unwrap().child_cn("corp.test").unwrap())
            .unwrap();
        let raw = stored.value_or_empty(provider::attr::PASSWORD);
        assert!(!raw.is_empty());
        assert!(!raw.contains_ignore_case("bind-secret"));
    }

    #[test]
    fn missing_provider_is_none() {
        let (_, store) = store_with_tenant("acme");
        assert!(store.get_provider("acme", "nowhere").unwrap().is_none());
    }

    #[test]
    fn name_and_alias_conflicts_rejected() {
        let (_, store) = store_with_tenant("acme");
        store.add_provider("acme", &with_alias("corp.test", "CORP")).unwrap();

        for clash in [
            external("CORP.TEST"),
            external("corp"),
            with_alias("other.test", "corp.test"),
            with_alias("other.test", "Corp"),
            external("acme"),
        ] {
            let err = store.add_provider("acme", &clash).unwrap_err();
            assert!(matches!(err, ConfigError::DuplicateProvider(_)), "{clash:?}");
        }
        assert_eq!(provider_names(&store, &[DomainType::ExternalDomain]), vec!["corp.test"]);
    }

    #[test]
    fn system_domain_cannot_be_added() {
        let (_, store) = store_with_tenant("acme");
        let p = IdentityProvider::new("sys", DomainType::SystemDomain);
        assert!(matches!(store.add_provider("acme", &p), Err(ConfigError::InvalidArgument(_))));
    }

    #[test]
    fn external_needs_connection_unless_active_directory() {
        let (_, store) = store_with_tenant("acme");
        let mut p = external("ldap.test");
        p.connection_strings = vec![String::new()];
        assert!(matches!(store.add_provider("acme", &p), Err(ConfigError::InvalidArgument(_))));

        p.provider_type = Some(IdentityStoreType::ActiveDirectory);
        p.connection_strings.clear();
        store.add_provider("acme", &p).unwrap();
    }

    #[test]
    fn local_os_only_on_default_tenant_and_only_once() {
        let (_, store) = store_with_tenant("acme");
        let local = IdentityProvider::new("localos", DomainType::LocalOsDomain);
        assert!(matches!(store.add_provider("acme", &local), Err(ConfigError::InvalidArgument(_))));

        store.set_default_tenant("acme").unwrap();
        store.add_provider("acme", &local).unwrap();
        let second = IdentityProvider::new("localos2", DomainType::LocalOsDomain);
        assert!(matches!(store.add_provider("acme", &second), Err(ConfigError::DuplicateProvider(_))));
    }

    #[test]
    fn providers_filtered_by_domain_type() {
        let (_, store) = store_with_tenant("acme");
        store.add_provider("acme", &external("one.test")).unwrap();
        store.add_provider("acme", &external("two.test")).unwrap();

        assert_eq!(provider_names(&store, &[DomainType::SystemDomain]), vec!["acme"]);
        assert_eq!(
            provider_names(&store, &[DomainType::ExternalDomain]),
            vec!["one.test", "two.test"]
        );
        assert_eq!(
            provider_names(&store, &[DomainType::SystemDomain, DomainType::ExternalDomain]),
            vec!["acme", "one.test", "two.test"]
        );
        assert_eq!(provider_names(&store, &[]).len(), 3);
        assert!(provider_names(&store, &[DomainType::LocalOsDomain]).is_empty());
    }

    // -----------------------------------------------------------------------
    // Delete / replace
    // -----------------------------------------------------------------------

    #[test]
    fn delete_by_alias_removes_alias_and_default() {
        let (dir, store) = store_with_tenant("acme");
        store.add_provider("acme", &with_alias("corp.test", "CORP")).unwrap();
        store.set_default_providers("acme", &["CORP".to_string()]).unwrap();
        assert_eq!(store.get_provider_aliases("acme").unwrap().len(), 1);

        store.delete_provider("acme", "corp").unwrap();
        assert!(store.get_provider("acme", "corp.test").unwrap().is_none());
        assert!(store.get_provider_aliases("acme").unwrap().is_empty());
        assert!(store.get_default_providers("acme").unwrap().is_empty());
        let container = tenant_dn("acme").child_cn("IdentityProviders").unwrap();
        assert!(!dir.contains(&container.child_cn("CORP").unwrap()));
    }

    #[test]
    fn delete_missing_provider_fails() {
        let (_, store) = store_with_tenant("acme");
        assert!(matches!(
            store.delete_provider("acme", "ghost"),
            Err(ConfigError::NoSuchProvider(_))
        ));
    }

    #[test]
    fn set_provider_replaces_and_keeps_default() {
        let (_, store) = store_with_tenant("acme");
        store.add_provider("acme", &external("corp.test")).unwrap();
        store.set_default_providers("acme", &["corp.test".to_string()]).unwrap();

        let mut changed = external("corp.test");
        changed.search_timeout_secs = 30;
        changed.upn_suffixes = vec!["corp.test".into()];
        store.set_provider("acme", &changed).unwrap();

        let back = store.get_provider("acme", "corp.test").unwrap().unwrap();
        assert_eq!(back.search_timeout_secs, 30);
        assert_eq!(back.upn_suffixes, vec!["corp.test"]);
        assert_eq!(store.get_default_providers("acme").unwrap(), vec!["corp.test"]);
    }

    #[test]
    fn failed_set_provider_keeps_original() {
        let (_, store) = store_with_tenant("acme");
        let original = with_alias("corp", "corp-alias");
        store.add_provider("acme", &original).unwrap();
        store.set_default_providers("acme", &["corp".to_string()]).unwrap();

        let mut broken = external("corp");
        broken.connection_strings.clear();
        assert!(matches!(store.set_provider("acme", &broken), Err(ConfigError::InvalidArgument(_))));

        let back = store.get_provider("acme", "corp").unwrap().unwrap();
        assert_eq!(back, original);
        assert_eq!(back.connection_strings, vec!["ldaps://corp:636"]);
        assert_eq!(store.get_provider("acme", "corp-alias").unwrap().unwrap().name, "corp");
        assert_eq!(store.get_default_providers("acme").unwrap(), vec!["corp"]);
    }

    #[test]
    fn set_provider_rejects_conflicts_with_other_providers() {
        let (_, store) = store_with_tenant("acme");
        store.add_provider("acme", &external("corp")).unwrap();
        store.add_provider("acme", &external("other")).unwrap();

        // Keeping its own alias is fine, taking another provider's name is not.
        store.set_provider("acme", &with_alias("corp", "corp")).unwrap();
        let clash = with_alias("corp", "OTHER");
        assert!(matches!(store.set_provider("acme", &clash), Err(ConfigError::DuplicateProvider(_))));
        assert_eq!(store.get_provider("acme", "corp").unwrap().unwrap().alias.as_deref(), Some("corp"));
        assert_eq!(provider_names(&store, &[DomainType::ExternalDomain]), vec!["corp", "other"]);
    }

    #[test]
    fn set_provider_needs_existing_provider_of_same_type() {
        let (_, store) = store_with_tenant("acme");
        assert!(matches!(
            store.set_provider("acme", &external("nowhere")),
            Err(ConfigError::NoSuchProvider(_))
        ));

        // "acme" is the system domain; it cannot be swapped for an external one.
        assert!(matches!(
            store.set_provider("acme", &external("acme")),
            Err(ConfigError::InvalidArgument(_))
        ));
        let system = store.get_provider("acme", "acme").unwrap().unwrap();
        assert_eq!(system.domain_type, DomainType::SystemDomain);
    }

    #[test]
    fn system_domain_updated_in_place() {
        let (dir, store) = store_with_tenant("acme");
        let mut system = store.get_provider("acme", "acme").unwrap().unwrap();
        assert_eq!(system.password.as_deref(), Some("changeme"));

        system.user_name = Some("root".into());
        system.password = Some("new-secret".into());
        store.set_provider("acme", &system).unwrap();

        let back = store.get_provider("acme", "acme").unwrap().unwrap();
        assert_eq!(back.domain_type, DomainType::SystemDomain);
        assert_eq!(back.user_name.as_deref(), Some("root"));
        assert_eq!(back.password.as_deref(), Some("new-secret"));
        assert_eq!(back.user_base_dn, system.user_base_dn);

        let stored = dir
            .get(&tenant_dn("acme").child_cn("IdentityProviders").unwrap().child_cn("acme").unwrap())
            .unwrap();
        let raw = stored.value_or_empty(provider::attr::PASSWORD);
        assert!(!raw.is_empty());
        assert!(!raw.contains_ignore_case("new-secret"));
        assert_eq!(store.pool().idle_count(), 1);
    }

    #[test]
    fn local_os_provider_cannot_be_updated() {
        let (_, store) = store_with_tenant("acme");
        store.set_default_tenant("acme").unwrap();
        let local = IdentityProvider::new("localos", DomainType::LocalOsDomain);
        store.add_provider("acme", &local).unwrap();
        assert!(matches!(store.set_provider("acme", &local), Err(ConfigError::InvalidArgument(_))));
        assert!(store.get_provider("acme", "localos").unwrap().is_some());
    }

    // -----------------------------------------------------------------------
    // Defaults, authn types, UPN suffixes
    // -----------------------------------------------------------------------

    #[test]
    fn default_provider_must_exist_and_be_single() {
        let (_, store) = store_with_tenant("acme");
        assert!(matches!(
            store.set_default_providers("acme", &["ghost".to_string()]),
            Err(ConfigError::NoSuchProvider(_))
        ));
        assert!(matches!(
            store.set_default_providers("acme", &["acme".to_string(), "acme".to_string()]),
            Err(ConfigError::InvalidArgument(_))
        ));
        store.set_default_providers("acme", &["acme".to_string()]).unwrap();
        assert_eq!(store.get_default_providers("acme").unwrap(), vec!["acme"]);
        store.set_default_providers("acme", &[]).unwrap();
        assert!(store.get_default_providers("acme").unwrap().is_empty());
    }

    #[test]
    fn authn_types_stored_on_provider() {
        let (_, store) = store_with_tenant("acme");
        store.add_provider("acme", &external("corp.test")).unwrap();
        let types = AuthnTypes {
            windows: true,
            rsa_secure_id: true,
            ..AuthnTypes::default()
        };
        store.set_authn_types_for_provider("acme", "corp.test", types).unwrap();
        assert_eq!(store.get_provider("acme", "corp.test").unwrap().unwrap().authn_types, types);
        assert!(matches!(
            store.set_authn_types_for_provider("acme", "ghost", types),
            Err(ConfigError::NoSuchProvider(_))
        ));
    }

    #[test]
    fn upn_suffix_registration() {
        let (_, store) = store_with_tenant("acme");
        store.add_provider("acme", &external("corp.test")).unwrap();
        assert!(store.register_upn_suffix("acme", "corp.test", "corp.test").unwrap());
        assert!(store.register_upn_suffix("acme", "corp.test", "example.org").unwrap());
        assert!(!store.register_upn_suffix("acme", "corp.test", "CORP.TEST").unwrap());
        assert_eq!(
            store.get_provider("acme", "corp.test").unwrap().unwrap().upn_suffixes,
            vec!["corp.test", "example.org"]
        );

        assert!(store.unregister_upn_suffix("acme", "corp.test", "corp.test").unwrap());
        assert!(!store.unregister_upn_suffix("acme", "corp.test", "corp.test").unwrap());
        assert_eq!(
            store.get_provider("acme", "corp.test").unwrap().unwrap().upn_suffixes,
            vec!["example.org"]
        );
    }
}
