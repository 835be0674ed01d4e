//! SAML relying parties.
//!
//! A relying party's consumer services, logout services and signature
//! algorithms live in containers beneath its own entry and are written and
//! read together with it.

use tracing::{info, warn};

use dirconf_entities::relying_party::attr as rp_attr;
use dirconf_entities::{
    assertion_consumer_service_descriptor, attribute_consumer_service_descriptor, attribute_descriptor,
    names, relying_party_descriptor, signature_algorithm_descriptor, single_logout_service_descriptor,
    RelyingParty,
};
use dirconf_mapper::{delete_subtree, load_collection, load_indexed, save_collection, save_indexed, MapperError};
use dirconf_store::{ConnectionFactory, DirectoryConnection};
use dirconf_types::{Dn, Filter, SearchScope};
use dirconf_types::names::validate_common_name;

use crate::error::{ConfigError, ConfigResult};
use crate::store::ConfigStore;

fn save_services(conn: &dyn DirectoryConnection, dn: &Dn, rp: &RelyingParty) -> ConfigResult<()> {
    save_collection(
        conn,
        dn,
        names::ASSERTION_CONSUMER_SERVICES,
        assertion_consumer_service_descriptor(),
        &rp.assertion_consumer_services,
        |_, _, _| Ok(()),
    )?;
    save_collection(
        conn,
        dn,
        names::ATTRIBUTE_CONSUMER_SERVICES,
        attribute_consumer_service_descriptor(),
        &rp.attribute_consumer_services,
        |c, service_dn, service| {
            save_indexed(
                c,
                service_dn,
                names::ATTRIBUTES,
                attribute_descriptor(),
                &service.attributes,
                |_, _, _| Ok(()),
            )
        },
    )?;
    save_collection(
        conn,
        dn,
        names::SINGLE_LOGOUT_SERVICES,
        single_logout_service_descriptor(),
        &rp.single_logout_services,
        |_, _, _| Ok(()),
    )?;
    save_indexed(
        conn,
        dn,
        names::SIGNATURE_ALGORITHMS,
        signature_algorithm_descriptor(),
        &rp.signature_algorithms,
        |_, _, _| Ok(()),
    )?;
    Ok(())
}

/// Load the nested collections. Services come back ordered by name.
fn load_services(conn: &dyn DirectoryConnection, dn: &Dn, rp: &mut RelyingParty) -> ConfigResult<()> {
    rp.assertion_consumer_services = load_collection(
        conn,
        dn,
        names::ASSERTION_CONSUMER_SERVICES,
        assertion_consumer_service_descriptor(),
        |_, _, _| Ok(()),
    )?;
    rp.assertion_consumer_services.sort_by(|a, b| a.name.cmp(&b.name));

    rp.attribute_consumer_services = load_collection(
        conn,
        dn,
        names::ATTRIBUTE_CONSUMER_SERVICES,
        attribute_consumer_service_descriptor(),
        |c, service_dn, service| {
            service.attributes =
                load_indexed(c, service_dn, names::ATTRIBUTES, attribute_descriptor(), true, |_, _, _| Ok(()))?;
            Ok(())
        },
    )?;
    rp.attribute_consumer_services.sort_by(|a, b| a.name.cmp(&b.name));

    rp.single_logout_services = load_collection(
        conn,
        dn,
        names::SINGLE_LOGOUT_SERVICES,
        single_logout_service_descriptor(),
        |_, _, _| Ok(()),
    )?;
    rp.single_logout_services.sort_by(|a, b| a.name.cmp(&b.name));

    rp.signature_algorithms = load_indexed(
        conn,
        dn,
        names::SIGNATURE_ALGORITHMS,
        signature_algorithm_descriptor(),
        true,
        |_, _, _| Ok(()),
    )?;
    Ok(())
}

impl<F: ConnectionFactory> ConfigStore<F> {
    fn relying_parties_container(
        &self,
        conn: &dyn DirectoryConnection,
        tenant_dn: &Dn,
        create: bool,
    ) -> ConfigResult<Option<Dn>> {
        self.tenant_container(conn, tenant_dn, names::RELYING_PARTIES, create)
    }

    fn hydrated(
        &self,
        conn: &dyn DirectoryConnection,
        found: Option<(Dn, RelyingParty)>,
    ) -> ConfigResult<Option<RelyingParty>> {
        let Some((dn, mut rp)) = found else {
            return Ok(None);
        };
        load_services(conn, &dn, &mut rp)?;
        Ok(Some(rp))
    }

    pub fn add_relying_party(&self, tenant: &str, rp: &RelyingParty) -> ConfigResult<()> {
        validate_common_name(&rp.name)?;
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let container = self
                .relying_parties_container(conn, &tenant_dn, true)?
                .ok_or_else(|| ConfigError::InvalidConfig("relying party container unavailable".into()))?;
            let descriptor = relying_party_descriptor();
            let dn = descriptor.dn_for(&container, rp)?;
            match descriptor.create(conn, &dn, rp) {
                Ok(()) => {}
                Err(MapperError::AlreadyExists(_)) => {
                    return Err(ConfigError::DuplicateRelyingParty(rp.name.clone()))
                }
                Err(e) => return Err(e.into()),
            }
            save_services(conn, &dn, rp)?;
            info!(tenant, relying_party = %rp.name, url = %rp.url, "relying party added");
            Ok(())
        })
    }

    pub fn get_relying_party(&self, tenant: &str, name: &str) -> ConfigResult<Option<RelyingParty>> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let Some(container) = self.relying_parties_container(conn, &tenant_dn, false)? else {
                return Ok(None);
            };
            let found = relying_party_descriptor().retrieve_one_with_dn(
                conn,
                &container,
                SearchScope::OneLevel,
                name,
            )?;
            self.hydrated(conn, found)
        })
    }

    /// The relying party registered under `url`. More than one match is
    /// reported as an ambiguous object.
    pub fn get_relying_party_by_url(&self, tenant: &str, url: &str) -> ConfigResult<Option<RelyingParty>> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let Some(container) = self.relying_parties_container(conn, &tenant_dn, false)? else {
                return Ok(None);
            };
            let filter = Filter::equality(rp_attr::URL, url);
            let mut matches = relying_party_descriptor().search_all_with_dn(
                conn,
                &container,
                SearchScope::OneLevel,
                Some(&filter),
            )?;
            if matches.len() > 1 {
                let names: Vec<&str> = matches.iter().map(|(_, rp)| rp.name.as_str()).collect();
                warn!(tenant, url, relying_parties = ?names, "relying parties share a URL");
                return Err(MapperError::AmbiguousObject {
                    base: container,
                    filter: filter.to_string(),
                    count: matches.len(),
                }
                .into());
            }
            self.hydrated(conn, matches.pop())
        })
    }

    pub fn get_relying_parties(&self, tenant: &str) -> ConfigResult<Vec<RelyingParty>> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let Some(container) = self.relying_parties_container(conn, &tenant_dn, false)? else {
                return Ok(Vec::new());
            };
            let mut parties = Vec::new();
            for (dn, mut rp) in
                relying_party_descriptor().search_all_with_dn(conn, &container, SearchScope::OneLevel, None)?
            {
                load_services(conn, &dn, &mut rp)?;
                parties.push(rp);
            }
            Ok(parties)
        })
    }

    /// Replace a relying party and all of its services.
    pub fn set_relying_party(&self, tenant: &str, rp: &RelyingParty) -> ConfigResult<()> {
        self.delete_relying_party(tenant, &rp.name)?;
        self.add_relying_party(tenant, rp)
    }

    pub fn delete_relying_party(&self, tenant: &str, name: &str) -> ConfigResult<()> {
        self.with_connection(|conn| {
            let tenant_dn = self.tenant_root(conn, tenant)?;
            let dn = match self.relying_parties_container(conn, &tenant_dn, false)? {
                Some(container) => {
                    relying_party_descriptor().lookup_one(conn, &container, SearchScope::OneLevel, name, None)?
                }
                None => None,
            }
            .ok_or_else(|| ConfigError::NoSuchRelyingParty(name.to_string()))?;
            let removed = delete_subtree(conn, &dn)?;
            info!(tenant, relying_party = name, removed, "relying party deleted");
            Ok(())
        })
    }
}
