//! Shared test helpers.

use dirconf_mapper::Descriptor;
use dirconf_store::InMemoryDirectory;
use dirconf_types::{Certificate, Dn, PrivateKey, SearchScope};

pub fn base() -> Dn {
    Dn::parse("cn=tenant,dc=example,dc=com").unwrap()
}

pub fn directory() -> InMemoryDirectory {
    InMemoryDirectory::with_suffix(base())
}

pub fn cert(seed: u8) -> Certificate {
    Certificate::from_der(vec![0x30, 0x82, seed, seed.wrapping_mul(7)]).unwrap()
}

pub fn key(seed: u8) -> PrivateKey {
    PrivateKey::from_der(vec![0x30, 0x81, seed]).unwrap()
}

/// Create `entity` beneath [`base`] in a fresh directory and read it back.
pub fn roundtrip<E, B>(descriptor: &Descriptor<E, B>, entity: &E) -> E {
    let dir = directory();
    stored(&dir, descriptor, entity)
}

pub fn stored<E, B>(dir: &InMemoryDirectory, descriptor: &Descriptor<E, B>, entity: &E) -> E {
    let dn = descriptor.dn_for(&base(), entity).unwrap();
    descriptor.create(dir, &dn, entity).unwrap();
    let name = descriptor.cn_of(entity).unwrap();
    descriptor
        .retrieve_one(dir, &base(), SearchScope::OneLevel, &name)
        .unwrap()
        .unwrap()
}
