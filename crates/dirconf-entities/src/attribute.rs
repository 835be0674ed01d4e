//! Ordered attribute lists.
//!
//! [`Attribute`] is the SAML attribute a tenant or attribute consumer
//! service advertises; [`AttributeMapEntry`] is one `from -> to` pair of an
//! identity provider's attribute or schema map. Both are stored as indexed
//! collections, so their order survives the store.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use dirconf_mapper::{indexed_descriptor, AttributeMapping, AttributeValue, Descriptor, Indexed, IndexedBuilder};

pub const ATTRIBUTE_OBJECT_CLASS: &str = "vmwSTSAttribute";
pub const ATTRIBUTE_PREFIX: &str = "Attribute";

pub const ATTRIBUTE_MAP_OBJECT_CLASS: &str = "vmwSTSAttributeMap";
pub const ATTRIBUTE_MAP_PREFIX: &str = "AttributeMapping";

pub mod attr {
    pub const NAME: &str = "name";
    pub const FRIENDLY_NAME: &str = "vmwSTSName";
    pub const NAME_FORMAT: &str = "vmwSTSNameFormat";
    pub const MAP_KEY: &str = "vmwSTSMapKey";
    pub const MAP_VALUE: &str = "vmwSTSMapValue";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub friendly_name: Option<String>,
    pub name_format: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            friendly_name: None,
            name_format: None,
        }
    }
}

pub type IndexedDescriptor<T> = Descriptor<Indexed<T>, IndexedBuilder<T>>;

pub fn attribute_descriptor() -> &'static IndexedDescriptor<Attribute> {
    static DESCRIPTOR: OnceLock<IndexedDescriptor<Attribute>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        indexed_descriptor(
            ATTRIBUTE_OBJECT_CLASS,
            ATTRIBUTE_PREFIX,
            vec![
                AttributeMapping::new(attr::NAME, |a: &Attribute| a.name.encode()).ctor(0),
                AttributeMapping::new(attr::FRIENDLY_NAME, |a: &Attribute| a.friendly_name.encode())
                    .set_with(|a: &mut Attribute, v: Option<String>| a.friendly_name = v),
                AttributeMapping::new(attr::NAME_FORMAT, |a: &Attribute| a.name_format.encode())
                    .set_with(|a: &mut Attribute, v: Option<String>| a.name_format = v),
            ],
            |args| Ok(Attribute::new(args.get::<String>(0)?)),
            Ok,
        )
        .expect("attribute descriptor table is well-formed")
    })
}

/// One pair of an attribute or schema map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMapEntry {
    pub from: String,
    pub to: String,
}

impl AttributeMapEntry {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Entries of `map` in key order.
    pub fn from_map(map: &BTreeMap<String, String>) -> Vec<Self> {
        map.iter().map(|(from, to)| Self::new(from, to)).collect()
    }

    /// Collect entries back into a map. Later duplicates win.
    pub fn into_map(entries: impl IntoIterator<Item = Self>) -> BTreeMap<String, String> {
        entries.into_iter().map(|e| (e.from, e.to)).collect()
    }
}

pub fn attribute_map_descriptor() -> &'static IndexedDescriptor<AttributeMapEntry> {
    static DESCRIPTOR: OnceLock<IndexedDescriptor<AttributeMapEntry>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        indexed_descriptor(
            ATTRIBUTE_MAP_OBJECT_CLASS,
            ATTRIBUTE_MAP_PREFIX,
            vec![
                AttributeMapping::new(attr::MAP_KEY, |e: &AttributeMapEntry| e.from.encode()).ctor(0),
                AttributeMapping::new(attr::MAP_VALUE, |e: &AttributeMapEntry| e.to.encode()).ctor(1),
            ],
            |args| Ok(AttributeMapEntry::new(args.get::<String>(0)?, args.get::<String>(1)?)),
            Ok,
        )
        .expect("attribute map descriptor table is well-formed")
    })
}
