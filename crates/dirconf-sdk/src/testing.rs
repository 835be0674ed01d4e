//! Shared test helpers.

use dirconf_entities::Tenant;
use dirconf_store::InMemoryDirectory;
use dirconf_types::{Certificate, Dn, PrivateKey};

use crate::config::ConfigStoreSettings;
use crate::store::ConfigStore;

pub type MemoryStore = ConfigStore<InMemoryDirectory>;

pub fn settings() -> ConfigStoreSettings {
    ConfigStoreSettings::with_root(Dn::parse("dc=example,dc=com").unwrap())
}

pub fn config_store() -> (InMemoryDirectory, MemoryStore) {
    let dir = InMemoryDirectory::with_suffix(settings().root_dn);
    let store = ConfigStore::new(dir.clone(), settings());
    (dir, store)
}

/// A store holding tenant `name`.
pub fn store_with_tenant(name: &str) -> (InMemoryDirectory, MemoryStore) {
    let (dir, store) = config_store();
    store
        .add_tenant(&Tenant::new(name), "Administrator", "changeme")
        .unwrap();
    (dir, store)
}

pub fn tenant_dn(name: &str) -> Dn {
    Dn::parse(&format!(
        "cn={name},cn=Tenants,cn=IdentityManager,cn=Services,dc=example,dc=com"
    ))
    .unwrap()
}

pub fn cert(seed: u8) -> Certificate {
    Certificate::from_der(vec![0x30, 0x82, seed, seed.wrapping_mul(3)]).unwrap()
}

pub fn key(seed: u8) -> PrivateKey {
    PrivateKey::from_der(vec![0x30, 0x81, seed]).unwrap()
}

pub fn fingerprint(cert: &Certificate) -> String {
    cert.fingerprint().to_hex()
}
