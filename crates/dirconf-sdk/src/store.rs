use dirconf_crypto::{KeystreamCipher, TenantSecretCipher};
use dirconf_entities::tenant::{self, tenant_descriptor, tenants_container_descriptor, TenantsContainer};
use dirconf_mapper::{ensure_exists, ensure_object_exists, AttributeValue};
use dirconf_store::{ConnectionFactory, ConnectionPool, DirectoryConnection};
use dirconf_types::{Dn, RawValue, SearchScope};

use crate::config::ConfigStoreSettings;
use crate::error::{ConfigError, ConfigResult};
use crate::inspect::{CertificateInspector, OpaqueCertificates};

/// Multi-tenant identity configuration over a directory.
///
/// Every operation borrows one pooled connection for its whole duration.
/// Operations are not atomic: a store error part way through a multi-step
/// write leaves what was already written in place.
pub struct ConfigStore<F: ConnectionFactory> {
    pool: ConnectionPool<F>,
    settings: ConfigStoreSettings,
    cipher: Box<dyn TenantSecretCipher>,
    inspector: Box<dyn CertificateInspector>,
}

impl<F: ConnectionFactory> ConfigStore<F> {
    pub fn new(factory: F, settings: ConfigStoreSettings) -> Self {
        Self {
            pool: ConnectionPool::new(factory),
            settings,
            cipher: Box::new(KeystreamCipher::new()),
            inspector: Box::new(OpaqueCertificates),
        }
    }

    pub fn with_cipher(mut self, cipher: impl TenantSecretCipher + 'static) -> Self {
        self.cipher = Box::new(cipher);
        self
    }

    pub fn with_inspector(mut self, inspector: impl CertificateInspector + 'static) -> Self {
        self.inspector = Box::new(inspector);
        self
    }

    pub fn settings(&self) -> &ConfigStoreSettings {
        &self.settings
    }

    pub fn pool(&self) -> &ConnectionPool<F> {
        &self.pool
    }

    pub(crate) fn inspector(&self) -> &dyn CertificateInspector {
        self.inspector.as_ref()
    }

    /// Run `op` with a borrowed connection. The connection goes back to the
    /// pool however `op` ends.
    pub(crate) fn with_connection<T>(
        &self,
        op: impl FnOnce(&dyn DirectoryConnection) -> ConfigResult<T>,
    ) -> ConfigResult<T> {
        let conn = self.pool.borrow()?;
        op(&*conn)
    }

    // ---- Paths ----

    /// `cn=IdentityManager,cn=Services,<root>`, created along the way when
    /// `create` is set.
    pub(crate) fn identity_manager_dn(
        &self,
        conn: &dyn DirectoryConnection,
        create: bool,
    ) -> ConfigResult<Option<Dn>> {
        let root = &self.settings.root_dn;
        let Some(services) = ensure_exists(conn, root, &self.settings.services_container, create)?
        else {
            return Ok(None);
        };
        Ok(ensure_exists(
            conn,
            &services,
            &self.settings.identity_manager_container,
            create,
        )?)
    }

    pub(crate) fn tenants_dn(
        &self,
        conn: &dyn DirectoryConnection,
        create: bool,
    ) -> ConfigResult<Option<Dn>> {
        let Some(identity_manager) = self.identity_manager_dn(conn, create)? else {
            return Ok(None);
        };
        let container = TenantsContainer {
            name: self.settings.tenants_container.clone(),
        };
        Ok(ensure_object_exists(
            conn,
            &identity_manager,
            tenants_container_descriptor(),
            &container,
            create,
        )?)
    }

    pub(crate) fn lookup_tenant(
        &self,
        conn: &dyn DirectoryConnection,
        name: &str,
    ) -> ConfigResult<Option<Dn>> {
        match self.tenants_dn(conn, false)? {
            Some(tenants) => Ok(tenant_descriptor().lookup_one(
                conn,
                &tenants,
                SearchScope::OneLevel,
                name,
                None,
            )?),
            None => Ok(None),
        }
    }

    /// DN of tenant `name`, which must exist.
    pub(crate) fn tenant_root(&self, conn: &dyn DirectoryConnection, name: &str) -> ConfigResult<Dn> {
        if name.is_empty() {
            return Err(ConfigError::invalid("tenant name must not be empty"));
        }
        self.lookup_tenant(conn, name)?
            .ok_or_else(|| ConfigError::NoSuchTenant(name.to_string()))
    }

    /// `cn=<name>` beneath the tenant, created when missing and `create`
    /// is set.
    pub(crate) fn tenant_container(
        &self,
        conn: &dyn DirectoryConnection,
        tenant_dn: &Dn,
        name: &str,
        create: bool,
    ) -> ConfigResult<Option<Dn>> {
        Ok(ensure_exists(conn, tenant_dn, name, create)?)
    }

    // ---- Tenant secrets ----

    pub(crate) fn tenant_key(&self, conn: &dyn DirectoryConnection, tenant_dn: &Dn) -> ConfigResult<String> {
        let raw = tenant_descriptor()
            .get_property(conn, tenant_dn, SearchScope::Base, "", tenant::attr::TENANT_KEY)?
            .unwrap_or_default();
        let key: String = decode(tenant::attr::TENANT_KEY, &raw)?;
        if key.is_empty() {
            return Err(ConfigError::InvalidConfig(format!("tenant {tenant_dn} has no tenant key")));
        }
        Ok(key)
    }

    pub(crate) fn encrypt_secret(&self, tenant_key: &str, secret: Option<&str>) -> ConfigResult<Option<String>> {
        match secret {
            Some(s) if !s.is_empty() => Ok(Some(self.cipher.encrypt(tenant_key, s)?)),
            _ => Ok(None),
        }
    }

    pub(crate) fn decrypt_secret(&self, tenant_key: &str, stored: Option<&str>) -> ConfigResult<Option<String>> {
        match stored {
            Some(s) if !s.is_empty() => Ok(Some(self.cipher.decrypt(tenant_key, s)?)),
            _ => Ok(None),
        }
    }
}

/// Decode a raw property value, naming the attribute on failure.
pub(crate) fn decode<T: AttributeValue>(attribute: &str, raw: &RawValue) -> ConfigResult<T> {
    T::decode(raw).map_err(|e| ConfigError::Mapper(e.at(attribute)))
}

/// Names are compared the way the directory compares them.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
