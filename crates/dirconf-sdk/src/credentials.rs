//! Signing credentials and trusted certificate chains.
//!
//! Credentials are kept as generations: each call to
//! [`ConfigStore::add_tenant_credentials`] writes `TenantCredential-<n+1>`
//! beneath the tenant and `TrustedCertChain-<n+1>` into the trusted chain
//! container, and the highest generation is the active one.

use std::collections::HashSet;

use tracing::info;

use dirconf_entities::credential::generation_of;
use dirconf_entities::{
    names, next_generation_name, tenant_credential_descriptor, trusted_cert_chain_descriptor,
    TenantCredential, TrustedCertChain, TENANT_CREDENTIAL_PREFIX, TRUSTED_CERT_CHAIN_PREFIX,
};
use dirconf_store::{ConnectionFactory, DirectoryConnection};
use dirconf_types::{Certificate, Dn, PrivateKey, SearchScope};

use crate::error::{ConfigError, ConfigResult};
use crate::store::ConfigStore;

/// Keep the first certificate of each fingerprint.
pub(crate) fn dedup_certificates(certs: impl IntoIterator<Item = Certificate>) -> Vec<Certificate> {
    let mut seen = HashSet::new();
    certs
        .into_iter()
        .filter(|c| seen.insert(c.fingerprint()))
        .collect()
}

fn require_chain(chain: &[Certificate]) -> ConfigResult<()> {
    if chain.is_empty() {
        return Err(ConfigError::invalid("certificate chain must not be empty"));
    }
    Ok(())
}

impl<F: ConnectionFactory> ConfigStore<F> {
    pub(crate) fn credentials_with_dn(
        &self,
        conn: &dyn DirectoryConnection,
        tenant_dn: &Dn,
    ) -> ConfigResult<Vec<(Dn, TenantCredential)>> {
        Ok(tenant_credential_descriptor().search_all_with_dn(conn, tenant_dn, SearchScope::OneLevel, None)?)
    }

    /// Trusted chains in generation order.
    pub(crate) fn trusted_chains_with_dn(
        &self,
        conn: &dyn DirectoryConnection,
        tenant_dn: &Dn,
    ) -> ConfigResult<Vec<(Dn, TrustedCertChain)>> {
        let Some(container) =
            self.tenant_container(conn, tenant_dn, names::TRUSTED_CERTIFICATE_CHAINS, false)?
        else {
            return Ok(Vec::new());
        };
        let mut chains = trusted_cert_chain_descriptor().search_all_with_dn(
            conn,
            &container,
            SearchScope::OneLevel,
            None,
        )?;
        chains.sort_by_key(|(_, c)| generation_of(TRUSTED_CERT_CHAIN_PREFIX, &c.name));
        Ok(chains)
    }

    pub(crate) fn active_credential(
        &self,
        conn: &dyn DirectoryConnection,
        tenant_dn: &Dn,
    ) -> ConfigResult<Option<TenantCredential>> {
        Ok(self
            .credentials_with_dn(conn, tenant_dn)?
            .into_iter()
            .map(|(_, c)| c)
            .max_by_key(|c| generation_of(TENANT_CREDENTIAL_PREFIX, &c.name)))
    }

    fn create_trusted_chain(
        &self,
        conn: &dyn DirectoryConnection,
        tenant_dn: &Dn,
        certificates: Vec<Certificate>,
    ) -> ConfigResult<String> {
        let container = self
            .tenant_container(conn, tenant_dn, names::TRUSTED_CERTIFICATE_CHAINS, true)?
            .ok_or_else(|| ConfigError::InvalidConfig("trusted certificate chain container unavailable".into()))?;
        let existing = self.trusted_chains_with_dn(conn, tenant_dn)?;
        let name = next_generation_name(
            TRUSTED_CERT_CHAIN_PREFIX,
            existing.iter().map(|(_, c)| c.name.as_str()),
        );
        let chain = TrustedCertChain { name, certificates };
        let descriptor = trusted_cert_chain_descriptor();
        descriptor.create(conn, &descriptor.dn_for(&container, &chain)?, &chain)?;
        Ok(chain.name)
    }

    // ---- Credentials ----

    /// Install a new signing credential. The chain is ordered leaf first
    /// and is also recorded as a trusted chain. Returns the credential's
    /// generation name.
    pub fn add_tenant_credentials(
        &self,
        tenant: &str,
        private_key: PrivateKey,
        chain: Vec<Certificate>,
    ) -> ConfigResult<String> {
        require_chain(&chain)?;
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let existing = self.credentials_with_dn(conn, &tenant_dn)?;
            let name = next_generation_name(
                TENANT_CREDENTIAL_PREFIX,
                existing.iter().map(|(_, c)| c.name.as_str()),
            );
            let credential = TenantCredential {
                name,
                private_key,
                certificates: chain.clone(),
            };
            let descriptor = tenant_credential_descriptor();
            descriptor.create(conn, &descriptor.dn_for(&tenant_dn, &credential)?, &credential)?;
            let chain_name = self.create_trusted_chain(conn, &tenant_dn, chain)?;
            info!(tenant, credential = %credential.name, chain = %chain_name, "tenant credential added");
            Ok(credential.name)
        })
    }

    /// The active (most recently added) signing credential.
    pub fn get_tenant_credentials(&self, tenant: &str) -> ConfigResult<Option<TenantCredential>> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            self.active_credential(conn, &tenant_dn)
        })
    }

    // ---- Trusted chains ----

    pub fn get_trusted_certificate_chains(&self, tenant: &str) -> ConfigResult<Vec<TrustedCertChain>> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            Ok(self
                .trusted_chains_with_dn(conn, &tenant_dn)?
                .into_iter()
                .map(|(_, c)| c)
                .collect())
        })
    }

    /// Trust `chain` (leaf first) without making it a signing credential.
    pub fn add_trusted_certificate_chain(&self, tenant: &str, chain: Vec<Certificate>) -> ConfigResult<String> {
        require_chain(&chain)?;
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let name = self.create_trusted_chain(conn, &tenant_dn, chain)?;
            info!(tenant, chain = %name, "trusted certificate chain added");
            Ok(name)
        })
    }

    pub(crate) fn trusted_roots(
        &self,
        conn: &dyn DirectoryConnection,
        tenant_dn: &Dn,
    ) -> ConfigResult<Vec<Certificate>> {
        let chains = self.trusted_chains_with_dn(conn, tenant_dn)?;
        Ok(dedup_certificates(
            chains.into_iter().filter_map(|(_, c)| c.root().cloned()),
        ))
    }

    /// Root certificate of every trusted chain.
    pub fn get_trusted_root_certificates(&self, tenant: &str) -> ConfigResult<Vec<Certificate>> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            self.trusted_roots(conn, &tenant_dn)
        })
    }

    /// Leaf certificate of every trusted chain: the certificates tokens
    /// may be signed with.
    pub fn get_sts_issuer_certificates(&self, tenant: &str) -> ConfigResult<Vec<Certificate>> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let chains = self.trusted_chains_with_dn(conn, &tenant_dn)?;
            Ok(chains.into_iter().filter_map(|(_, c)| c.leaf().cloned()).collect())
        })
    }
}
