use tracing::{debug, info};

use dirconf_entities::certificate::attr as cert_attr;
use dirconf_entities::{idm_certificate_descriptor, names, CertificateType, IdmCertificate};
use dirconf_mapper::MapperError;
use dirconf_store::{ConnectionFactory, DirectoryConnection};
use dirconf_types::{Certificate, Dn, Filter, SearchScope};

use crate::credentials::dedup_certificates;
use crate::error::{ConfigError, ConfigResult};
use crate::store::ConfigStore;

fn has_fingerprint(cert: Option<&Certificate>, fingerprint: &str) -> bool {
    cert.is_some_and(|c| c.fingerprint().to_hex().eq_ignore_ascii_case(fingerprint))
}

fn type_filter(cert_type: CertificateType) -> Filter {
    Filter::equality(cert_attr::CERT_TYPE, cert_type.as_str())
}

impl<F: ConnectionFactory> ConfigStore<F> {
    /// Store `certificate` in the tenant's certificate store, named by its
    /// fingerprint.
    pub fn add_certificate(
        &self,
        tenant: &str,
        certificate: Certificate,
        cert_type: CertificateType,
    ) -> ConfigResult<()> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let container = self
                .tenant_container(conn, &tenant_dn, names::IDM_CERTIFICATES, true)?
                .ok_or_else(|| ConfigError::InvalidConfig("certificate container unavailable".into()))?;
            let entry = IdmCertificate::new(certificate, cert_type);
            let descriptor = idm_certificate_descriptor();
            let dn = descriptor.dn_for(&container, &entry)?;
            match descriptor.create(conn, &dn, &entry) {
                Ok(()) => {}
                Err(MapperError::AlreadyExists(_)) => {
                    return Err(ConfigError::DuplicateCertificate(entry.fingerprint()))
                }
                Err(e) => return Err(e.into()),
            }
            info!(tenant, fingerprint = %entry.fingerprint(), cert_type = %cert_type, "certificate added");
            Ok(())
        })
    }

    /// Certificates of `cert_type`. STS trust also covers every certificate
    /// of every trusted chain.
    pub fn get_certificates(&self, tenant: &str, cert_type: CertificateType) -> ConfigResult<Vec<Certificate>> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let mut certs: Vec<Certificate> =
                match self.tenant_container(conn, &tenant_dn, names::IDM_CERTIFICATES, false)? {
                    Some(container) => idm_certificate_descriptor()
                        .search_all(conn, &container, SearchScope::OneLevel, Some(&type_filter(cert_type)))?
                        .into_iter()
                        .map(|c| c.certificate)
                        .collect(),
                    None => Vec::new(),
                };
            if cert_type == CertificateType::StsTrustCert {
                for (_, chain) in self.trusted_chains_with_dn(conn, &tenant_dn)? {
                    certs.extend(chain.certificates);
                }
            }
            Ok(dedup_certificates(certs))
        })
    }

    /// Delete the certificate with `fingerprint` (hex).
    ///
    /// For STS trust this also removes every trusted chain (and matching
    /// signing credential) that the certificate roots or leads, and then
    /// every remaining trusted root issued by one of the removed chains'
    /// intermediate certificates. The active signing credential's root and
    /// leaf cannot be deleted.
    pub fn delete_certificate(
        &self,
        tenant: &str,
        fingerprint: &str,
        cert_type: CertificateType,
    ) -> ConfigResult<()> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            match cert_type {
                CertificateType::LdapTrustedCert => {
                    self.delete_stored_certificate(conn, tenant, &tenant_dn, fingerprint, cert_type, false)
                }
                CertificateType::StsTrustCert => self.delete_sts_certificate(conn, tenant, &tenant_dn, fingerprint),
            }
        })
    }

    /// Remove the `IdmCertificates` entry. A missing entry is an error unless
    /// the certificate was already found elsewhere.
    fn delete_stored_certificate(
        &self,
        conn: &dyn DirectoryConnection,
        tenant: &str,
        tenant_dn: &Dn,
        fingerprint: &str,
        cert_type: CertificateType,
        found_elsewhere: bool,
    ) -> ConfigResult<()> {
        let descriptor = idm_certificate_descriptor();
        let dn = match self.tenant_container(conn, tenant_dn, names::IDM_CERTIFICATES, false)? {
            Some(container) => descriptor.lookup_one(
                conn,
                &container,
                SearchScope::OneLevel,
                fingerprint,
                Some(&type_filter(cert_type)),
            )?,
            None => None,
        };
        match dn {
            Some(dn) => {
                descriptor.delete(conn, &dn)?;
                info!(tenant, fingerprint, cert_type = %cert_type, "certificate deleted");
                Ok(())
            }
            None if found_elsewhere => Ok(()),
            None => Err(ConfigError::NoSuchCertificate(fingerprint.to_string())),
        }
    }

    fn delete_sts_certificate(
        &self,
        conn: &dyn DirectoryConnection,
        tenant: &str,
        tenant_dn: &Dn,
        fingerprint: &str,
    ) -> ConfigResult<()> {
        if let Some(active) = self.active_credential(conn, tenant_dn)? {
            if has_fingerprint(active.root(), fingerprint) || has_fingerprint(active.leaf(), fingerprint) {
                return Err(ConfigError::CertificateInUse(fingerprint.to_string()));
            }
        }

        let mut found = false;
        let mut issuers = Vec::new();
        for (chain_dn, chain) in self.trusted_chains_with_dn(conn, tenant_dn)? {
            let by_root = has_fingerprint(chain.root(), fingerprint);
            if !by_root && !has_fingerprint(chain.leaf(), fingerprint) {
                continue;
            }
            found = true;
            if by_root {
                let below_root = chain.certificates.len().saturating_sub(1);
                issuers.extend(chain.certificates[..below_root].iter().cloned());
            }
            self.delete_chain(conn, tenant_dn, &chain_dn, &chain.certificates)?;
            info!(tenant, chain = %chain.name, fingerprint, "trusted certificate chain deleted");
        }

        if !issuers.is_empty() {
            let inspector = self.inspector();
            for root in self.trusted_roots(conn, tenant_dn)? {
                if has_fingerprint(Some(&root), fingerprint) {
                    continue;
                }
                if issuers.iter().any(|issuer| inspector.is_issued_by(&root, issuer)) {
                    let root_fingerprint = root.fingerprint().to_hex();
                    debug!(tenant, fingerprint = %root_fingerprint, "deleting root issued by a removed chain");
                    self.delete_sts_certificate(conn, tenant, tenant_dn, &root_fingerprint)?;
                }
            }
        }

        self.delete_stored_certificate(
            conn,
            tenant,
            tenant_dn,
            fingerprint,
            CertificateType::StsTrustCert,
            found,
        )
    }

    /// Delete a trusted chain and any signing credential with the same
    /// certificates.
    fn delete_chain(
        &self,
        conn: &dyn DirectoryConnection,
        tenant_dn: &Dn,
        chain_dn: &Dn,
        certificates: &[Certificate],
    ) -> ConfigResult<()> {
        dirconf_entities::trusted_cert_chain_descriptor().delete(conn, chain_dn)?;
        for (dn, credential) in self.credentials_with_dn(conn, tenant_dn)? {
            if credential.certificates == certificates {
                dirconf_entities::tenant_credential_descriptor().delete(conn, &dn)?;
                info!(credential = %credential.name, "tenant credential deleted with its chain");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::KnownCertificates;
    use crate::testing::{cert, fingerprint, key, store_with_tenant};

    // -----------------------------------------------------------------------
    // Certificate store
    // -----------------------------------------------------------------------

    #[test]
    fn add_and_list_by_type() {
        let (_, store) = store_with_tenant("acme");
        store.add_certificate("acme", cert(1), CertificateType::LdapTrustedCert).unwrap();
        store.add_certificate("acme", cert(2), CertificateType::StsTrustCert).unwrap();

        assert_eq!(
            store.get_certificates("acme", CertificateType::LdapTrustedCert).unwrap(),
            vec![cert(1)]
        );
        assert_eq!(
            store.get_certificates("acme", CertificateType::StsTrustCert).unwrap(),
            vec![cert(2)]
        );
    }

    #[test]
    fn duplicate_certificate_rejected() {
        let (_, store) = store_with_tenant("acme");
        store.add_certificate("acme", cert(1), CertificateType::LdapTrustedCert).unwrap();
        let err = store
            .add_certificate("acme", cert(1), CertificateType::LdapTrustedCert)
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCertificate(fp) if fp == fingerprint(&cert(1))));
    }

    #[test]
    fn sts_listing_includes_chain_certificates_once() {
        let (_, store) = store_with_tenant("acme");
        store.add_certificate("acme", cert(9), CertificateType::StsTrustCert).unwrap();
        store
            .add_tenant_credentials("acme", key(1), vec![cert(1), cert(9)])
            .unwrap();
        assert_eq!(
            store.get_certificates("acme", CertificateType::StsTrustCert).unwrap(),
            vec![cert(9), cert(1)]
        );
        assert!(store
            .get_certificates("acme", CertificateType::LdapTrustedCert)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn ldap_delete() {
        let (_, store) = store_with_tenant("acme");
        store.add_certificate("acme", cert(1), CertificateType::LdapTrustedCert).unwrap();
        let fp = fingerprint(&cert(1));

        assert!(matches!(
            store.delete_certificate("acme", &fp, CertificateType::StsTrustCert),
            Err(ConfigError::NoSuchCertificate(_))
        ));
        store
            .delete_certificate("acme", &fp.to_ascii_uppercase(), CertificateType::LdapTrustedCert)
            .unwrap();
        assert!(matches!(
            store.delete_certificate("acme", &fp, CertificateType::LdapTrustedCert),
            Err(ConfigError::NoSuchCertificate(_))
        ));
    }

    // -----------------------------------------------------------------------
    // STS cascade
    // -----------------------------------------------------------------------

    #[test]
    fn active_credential_certificates_are_in_use() {
        let (_, store) = store_with_tenant("acme");
        store
            .add_tenant_credentials("acme", key(1), vec![cert(1), cert(5), cert(9)])
            .unwrap();
        for c in [cert(1), cert(9)] {
            assert!(matches!(
                store.delete_certificate("acme", &fingerprint(&c), CertificateType::StsTrustCert),
                Err(ConfigError::CertificateInUse(_))
            ));
        }
        assert_eq!(store.get_trusted_certificate_chains("acme").unwrap().len(), 1);
    }

    #[test]
    fn deleting_unused_root_cascades_to_issued_roots() {
        let (_, store) = store_with_tenant("acme");
        let known = KnownCertificates::new()
            .with(&cert(2), "CN=Intermediate", "CN=Old Root")
            .with(&cert(8), "CN=Old Root", "CN=Old Root")
            .with(&cert(5), "CN=Cross", "cn=intermediate")
            .with(&cert(6), "CN=Unrelated", "CN=Unrelated");
        let store = store.with_inspector(known);

        store
            .add_tenant_credentials("acme", key(1), vec![cert(1), cert(9)])
            .unwrap();
        store
            .add_trusted_certificate_chain("acme", vec![cert(3), cert(2), cert(8)])
            .unwrap();
        store.add_trusted_certificate_chain("acme", vec![cert(5)]).unwrap();
        store.add_trusted_certificate_chain("acme", vec![cert(6)]).unwrap();
        store
            .add_tenant_credentials("acme", key(2), vec![cert(3), cert(2), cert(8)])
            .unwrap();
        // The old chain is no longer the active one.
        store
            .add_tenant_credentials("acme", key(3), vec![cert(1), cert(9)])
            .unwrap();

        store
            .delete_certificate("acme", &fingerprint(&cert(8)), CertificateType::StsTrustCert)
            .unwrap();

        let roots = store.get_trusted_root_certificates("acme").unwrap();
        assert_eq!(roots, vec![cert(9), cert(6)]);
        assert_eq!(
            store.get_tenant_credentials("acme").unwrap().unwrap().private_key,
            key(3)
        );
        let remaining_keys: Vec<_> = store
            .with_connection(|conn| {
                let dn = store.tenant_root(conn, "acme")?;
                store.credentials_with_dn(conn, &dn)
            })
            .unwrap()
            .into_iter()
            .map(|(_, c)| c.private_key)
            .collect();
        assert!(!remaining_keys.contains(&key(2)));
        assert_eq!(remaining_keys.len(), 2);
    }

    #[test]
    fn deleting_chain_leaf_removes_chain_only() {
        let (_, store) = store_with_tenant("acme");
        store
            .add_tenant_credentials("acme", key(1), vec![cert(1), cert(9)])
            .unwrap();
        store
            .add_trusted_certificate_chain("acme", vec![cert(2), cert(8)])
            .unwrap();
        store
            .delete_certificate("acme", &fingerprint(&cert(2)), CertificateType::StsTrustCert)
            .unwrap();
        assert_eq!(store.get_trusted_root_certificates("acme").unwrap(), vec![cert(9)]);
    }

    #[test]
    fn sts_delete_removes_stored_entry_and_reports_missing() {
        let (_, store) = store_with_tenant("acme");
        store.add_certificate("acme", cert(7), CertificateType::StsTrustCert).unwrap();
        let fp = fingerprint(&cert(7));
        store.delete_certificate("acme", &fp, CertificateType::StsTrustCert).unwrap();
        assert!(store
            .get_certificates("acme", CertificateType::StsTrustCert)
            .unwrap()
            .is_empty());
        assert!(matches!(
            store.delete_certificate("acme", &fp, CertificateType::StsTrustCert),
            Err(ConfigError::NoSuchCertificate(_))
        ));
    }
}
