use tracing::info;

use dirconf_entities::policy::DEFAULT_POLICY_NAME;
use dirconf_entities::{
    client_cert_policy_descriptor, names, password_expiration_descriptor, ClientCertPolicy,
    PasswordExpiration,
};
use dirconf_mapper::ensure_object_exists;
use dirconf_store::ConnectionFactory;
use dirconf_types::SearchScope;

use crate::error::{ConfigError, ConfigResult};
use crate::store::ConfigStore;

impl<F: ConnectionFactory> ConfigStore<F> {
    // ---- Password expiration ----

    /// Password-expiration notification settings. Fails when sender or
    /// subject has never been configured.
    pub fn get_password_expiration(&self, tenant: &str) -> ConfigResult<PasswordExpiration> {
        self.with_connection(|conn| {
            let dn = self.tenant_root(conn, tenant)?;
            password_expiration_descriptor()
                .retrieve_one(conn, &dn, SearchScope::Base, "")?
                .filter(PasswordExpiration::is_configured)
                .ok_or_else(|| ConfigError::PasswordExpirationNotConfigured(tenant.to_string()))
        })
    }

    pub fn update_password_expiration(&self, tenant: &str, settings: &PasswordExpiration) -> ConfigResult<()> {
        if !settings.is_configured() {
            return Err(ConfigError::invalid(
                "password expiration needs both a sender address and a subject",
            ));
        }
        if settings.notification_days.iter().any(|d| *d < 0) {
            return Err(ConfigError::invalid("notification days must not be negative"));
        }
        self.with_connection(|conn| {
            let dn = self.tenant_root(conn, tenant)?;
            let mut stored = settings.clone();
            stored.tenant_name = dn.leaf_value().unwrap_or(tenant).to_string();
            password_expiration_descriptor().update(conn, &dn, &stored)?;
            info!(tenant, enabled = stored.email_notification_enabled, "password expiration updated");
            Ok(())
        })
    }

    // ---- Client certificate policy ----

    /// The tenant's client certificate policy; the defaults when none has
    /// been stored.
    pub fn get_client_cert_policy(&self, tenant: &str) -> ConfigResult<ClientCertPolicy> {
        self.with_connection(|conn| {
            let dn = self.tenant_root(conn, tenant)?;
            let Some(container) = self.tenant_container(conn, &dn, names::CLIENT_CERT_POLICIES, false)? else {
                return Ok(ClientCertPolicy::default());
            };
            Ok(client_cert_policy_descriptor()
                .retrieve_one(conn, &container, SearchScope::OneLevel, DEFAULT_POLICY_NAME)?
                .unwrap_or_default())
        })
    }

    /// Store the tenant's client certificate policy. There is one policy per
    /// tenant, so the name on `policy` is ignored.
    pub fn set_client_cert_policy(&self, tenant: &str, policy: &ClientCertPolicy) -> ConfigResult<()> {
        if policy.crl_cache_size < 0 {
            return Err(ConfigError::invalid("CRL cache size must not be negative"));
        }
        self.with_connection(|conn| {
            let dn = self.tenant_root(conn, tenant)?;
            let container = self
                .tenant_container(conn, &dn, names::CLIENT_CERT_POLICIES, true)?
                .ok_or_else(|| ConfigError::InvalidConfig("client certificate policy container unavailable".into()))?;

            let stored = ClientCertPolicy {
                name: DEFAULT_POLICY_NAME.to_string(),
                ..policy.clone()
            };
            let descriptor = client_cert_policy_descriptor();
            let policy_dn = ensure_object_exists(conn, &container, descriptor, &stored, true)?
                .ok_or_else(|| ConfigError::InvalidConfig("client certificate policy unavailable".into()))?;
            descriptor.update(conn, &policy_dn, &stored)?;
            info!(tenant, revocation_check = stored.revocation_check_enabled, "client certificate policy set");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cert, store_with_tenant};

    fn expiration() -> PasswordExpiration {
        PasswordExpiration {
            tenant_name: String::new(),
            email_notification_enabled: true,
            email_from: Some("noreply@acme.test".into()),
            email_subject: Some("Your password expires soon".into()),
            notification_days: vec![1, 7, 30],
        }
    }

    // -----------------------------------------------------------------------
    // Password expiration
    // -----------------------------------------------------------------------

    #[test]
    fn unconfigured_expiration_is_an_error() {
        let (_, store) = store_with_tenant("acme");
        assert!(matches!(
            store.get_password_expiration("acme"),
            Err(ConfigError::PasswordExpirationNotConfigured(_))
        ));
    }

    #[test]
    fn expiration_roundtrip() {
        let (_, store) = store_with_tenant("acme");
        store.update_password_expiration("acme", &expiration()).unwrap();
        let back = store.get_password_expiration("acme").unwrap();
        assert_eq!(back.tenant_name, "acme");
        assert!(back.email_notification_enabled);
        assert_eq!(back.notification_days, vec![1, 7, 30]);
        assert_eq!(back.email_subject, expiration().email_subject);

        let disabled = PasswordExpiration {
            email_notification_enabled: false,
            notification_days: vec![14],
            ..expiration()
        };
        store.update_password_expiration("acme", &disabled).unwrap();
        let back = store.get_password_expiration("acme").unwrap();
        assert!(!back.email_notification_enabled);
        assert_eq!(back.notification_days, vec![14]);
    }

    #[test]
    fn expiration_requires_sender_and_subject() {
        let (_, store) = store_with_tenant("acme");
        let no_subject = PasswordExpiration {
            email_subject: Some(String::new()),
            ..expiration()
        };
        assert!(matches!(
            store.update_password_expiration("acme", &no_subject),
            Err(ConfigError::InvalidArgument(_))
        ));
        assert!(matches!(
            store.update_password_expiration("ghost", &expiration()),
            Err(ConfigError::NoSuchTenant(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Client certificate policy
    // -----------------------------------------------------------------------

    #[test]
    fn missing_policy_reads_as_default() {
        let (_, store) = store_with_tenant("acme");
        assert_eq!(store.get_client_cert_policy("acme").unwrap(), ClientCertPolicy::default());
    }

    #[test]
    fn policy_set_twice_keeps_latest() {
        let (_, store) = store_with_tenant("acme");
        let first = ClientCertPolicy {
            name: "ignored".into(),
            use_ocsp: true,
            ocsp_url: Some("http://ocsp.acme.test".into()),
            ocsp_signing_certificate: Some(cert(4)),
            oids: vec!["2.16.840.1.101.2.1.11.10".into()],
            ..ClientCertPolicy::default()
        };
        store.set_client_cert_policy("acme", &first).unwrap();
        let back = store.get_client_cert_policy("acme").unwrap();
        assert_eq!(back.name, DEFAULT_POLICY_NAME);
        assert!(back.use_ocsp);
        assert_eq!(back.ocsp_signing_certificate, Some(cert(4)));
        assert_eq!(back.oids, first.oids);

        let second = ClientCertPolicy {
            revocation_check_enabled: false,
            crl_cache_size: 64,
            ..ClientCertPolicy::default()
        };
        store.set_client_cert_policy("acme", &second).unwrap();
        let back = store.get_client_cert_policy("acme").unwrap();
        assert_eq!(back, second);
    }
}
