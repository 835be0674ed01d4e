use tracing::info;

use dirconf_entities::oidc::attr as oidc_attr;
use dirconf_entities::{names, oidc_client_descriptor, OidcClient};
use dirconf_mapper::MapperError;
use dirconf_store::{ConnectionFactory, DirectoryConnection};
use dirconf_types::names::validate_common_name;
use dirconf_types::{Dn, SearchScope};

use crate::error::{ConfigError, ConfigResult};
use crate::store::ConfigStore;

impl<F: ConnectionFactory> ConfigStore<F> {
    fn oidc_container(
        &self,
        conn: &dyn DirectoryConnection,
        tenant_dn: &Dn,
        create: bool,
    ) -> ConfigResult<Option<Dn>> {
        self.tenant_container(conn, tenant_dn, names::OIDC_CLIENTS, create)
    }

    fn find_oidc_client(
        &self,
        conn: &dyn DirectoryConnection,
        tenant_dn: &Dn,
        client_id: &str,
    ) -> ConfigResult<Option<Dn>> {
        match self.oidc_container(conn, tenant_dn, false)? {
            Some(container) => Ok(oidc_client_descriptor().lookup_one(
                conn,
                &container,
                SearchScope::OneLevel,
                client_id,
                None,
            )?),
            None => Ok(None),
        }
    }

    /// Register an OIDC client. None of its redirect URIs may already belong
    /// to another client of the tenant.
    ///
    /// The URI check and the create are separate store calls; two clients
    /// added concurrently with the same URI can both succeed.
    pub fn add_oidc_client(&self, tenant: &str, client: &OidcClient) -> ConfigResult<()> {
        validate_common_name(&client.client_id)?;
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let container = self
                .oidc_container(conn, &tenant_dn, true)?
                .ok_or_else(|| ConfigError::InvalidConfig("OIDC client container unavailable".into()))?;
            let descriptor = oidc_client_descriptor();

            let filter = descriptor.in_set_filter(oidc_attr::REDIRECT_URIS, client.redirect_uris.iter().cloned())?;
            if let Some(filter) = filter {
                let holders = descriptor.search_all(conn, &container, SearchScope::OneLevel, Some(&filter))?;
                let taken = client.redirect_uris.iter().find(|uri| {
                    holders
                        .iter()
                        .any(|h| h.redirect_uris.iter().any(|u| u.eq_ignore_ascii_case(uri)))
                });
                if let Some(uri) = taken {
                    return Err(ConfigError::DuplicateRedirectUri(uri.clone()));
                }
            }

            let dn = descriptor.dn_for(&container, client)?;
            match descriptor.create(conn, &dn, client) {
                Ok(()) => {}
                Err(MapperError::AlreadyExists(_)) => {
                    return Err(ConfigError::DuplicateOidcClient(client.client_id.clone()))
                }
                Err(e) => return Err(e.into()),
            }
            info!(tenant, client_id = %client.client_id, redirect_uris = client.redirect_uris.len(), "OIDC client added");
            Ok(())
        })
    }

    pub fn get_oidc_client(&self, tenant: &str, client_id: &str) -> ConfigResult<Option<OidcClient>> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            match self.oidc_container(conn, &tenant_dn, false)? {
                Some(container) => Ok(oidc_client_descriptor().retrieve_one(
                    conn,
                    &container,
                    SearchScope::OneLevel,
                    client_id,
                )?),
                None => Ok(None),
            }
        })
    }

    pub fn get_oidc_clients(&self, tenant: &str) -> ConfigResult<Vec<OidcClient>> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            match self.oidc_container(conn, &tenant_dn, false)? {
                Some(container) => Ok(oidc_client_descriptor().search_all(
                    conn,
                    &container,
                    SearchScope::OneLevel,
                    None,
                )?),
                None => Ok(Vec::new()),
            }
        })
    }

    /// Rewrite an existing client's metadata.
    pub fn set_oidc_client(&self, tenant: &str, client: &OidcClient) -> ConfigResult<()> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let dn = self
                .find_oidc_client(conn, &tenant_dn, &client.client_id)?
                .ok_or_else(|| ConfigError::NoSuchOidcClient(client.client_id.clone()))?;
            oidc_client_descriptor().update(conn, &dn, client)?;
            info!(tenant, client_id = %client.client_id, "OIDC client updated");
            Ok(())
        })
    }

    pub fn delete_oidc_client(&self, tenant: &str, client_id: &str) -> ConfigResult<()> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let dn = self
                .find_oidc_client(conn, &tenant_dn, client_id)?
                .ok_or_else(|| ConfigError::NoSuchOidcClient(client_id.to_string()))?;
            oidc_client_descriptor().delete(conn, &dn)?;
            info!(tenant, client_id, "OIDC client deleted");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::store_with_tenant;

    fn client(id: &str, uri: &str) -> OidcClient {
        OidcClient::builder(id)
            .with_redirect_uri(uri)
            .with_post_logout_redirect_uri(format!("{uri}/logout"))
            .with_token_endpoint_auth_method("private_key_jwt")
            .with_id_token_signed_response_alg("RS256")
            .with_client_assertion_lifetime_ms(300_000)
            .with_scope("openid")
            .with_grant_type("authorization_code")
            .build()
    }

    fn ids(clients: &[OidcClient]) -> Vec<String> {
        let mut ids: Vec<String> = clients.iter().map(|c| c.client_id.clone()).collect();
        ids.sort();
        ids
    }

    // -----------------------------------------------------------------------
    // Add / get
    // -----------------------------------------------------------------------

    #[test]
    fn add_get_list() {
        let (_, store) = store_with_tenant("acme");
        let a = client("client-a", "https://a.test/cb");
        store.add_oidc_client("acme", &a).unwrap();
        store.add_oidc_client("acme", &client("client-b", "https://b.test/cb")).unwrap();

        assert_eq!(store.get_oidc_client("acme", "client-a").unwrap(), Some(a));
        assert!(store.get_oidc_client("acme", "client-z").unwrap().is_none());
        assert_eq!(ids(&store.get_oidc_clients("acme").unwrap()), vec!["client-a", "client-b"]);
    }

    #[test]
    fn redirect_uri_collision_creates_nothing() {
        let (_, store) = store_with_tenant("acme");
        store.add_oidc_client("acme", &client("client-a", "https://x/cb")).unwrap();

        let b = OidcClient::builder("client-b")
            .with_redirect_uri("https://y/cb")
            .with_redirect_uri("https://x/cb")
            .build();
        let err = store.add_oidc_client("acme", &b).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRedirectUri(uri) if uri == "https://x/cb"));
        assert!(store.get_oidc_client("acme", "client-b").unwrap().is_none());
        assert_eq!(ids(&store.get_oidc_clients("acme").unwrap()), vec!["client-a"]);
    }

    #[test]
    fn duplicate_client_id_rejected() {
        let (_, store) = store_with_tenant("acme");
        store.add_oidc_client("acme", &client("client-a", "https://a.test/cb")).unwrap();
        assert!(matches!(
            store.add_oidc_client("acme", &client("CLIENT-A", "https://other.test/cb")),
            Err(ConfigError::DuplicateOidcClient(_))
        ));
    }

    #[test]
    fn clients_without_redirect_uris_do_not_collide() {
        let (_, store) = store_with_tenant("acme");
        store.add_oidc_client("acme", &OidcClient::builder("svc-1").build()).unwrap();
        store.add_oidc_client("acme", &OidcClient::builder("svc-2").build()).unwrap();
        let back = store.get_oidc_client("acme", "svc-1").unwrap().unwrap();
        assert!(back.redirect_uris.is_empty());
    }

    // -----------------------------------------------------------------------
    // Update / delete
    // -----------------------------------------------------------------------

    #[test]
    fn set_and_delete() {
        let (_, store) = store_with_tenant("acme");
        let mut a = client("client-a", "https://a.test/cb");
        store.add_oidc_client("acme", &a).unwrap();

        a.redirect_uris = vec!["https://a.test/v2/cb".into()];
        a.scopes.push("profile".into());
        a.token_endpoint_auth_method = None;
        store.set_oidc_client("acme", &a).unwrap();
        assert_eq!(store.get_oidc_client("acme", "client-a").unwrap(), Some(a.clone()));

        store.delete_oidc_client("acme", "client-a").unwrap();
        assert!(matches!(
            store.delete_oidc_client("acme", "client-a"),
            Err(ConfigError::NoSuchOidcClient(_))
        ));
        assert!(matches!(
            store.set_oidc_client("acme", &a),
            Err(ConfigError::NoSuchOidcClient(_))
        ));
    }
}
