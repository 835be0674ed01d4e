use serde::{Deserialize, Serialize};

use dirconf_types::{Dn, RawValue};

/// One named attribute of an entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryAttribute {
    pub name: String,
    pub value: RawValue,
}

/// A directory entry as returned by a search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub dn: Dn,
    pub attributes: Vec<EntryAttribute>,
}

impl Entry {
    pub fn new(dn: Dn) -> Self {
        Self {
            dn,
            attributes: Vec::new(),
        }
    }

    /// Look up an attribute by name (ASCII case-insensitive).
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| &a.value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut RawValue> {
        self.attributes
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| &mut a.value)
    }

    /// Returns `true` if the attribute is present with at least one value.
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Set an attribute, replacing any existing value. An empty value removes
    /// the attribute.
    pub fn set(&mut self, name: &str, value: RawValue) {
        if value.is_empty() {
            self.remove(name);
            return;
        }
        match self.get_mut(name) {
            Some(existing) => *existing = value,
            None => self.attributes.push(EntryAttribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Remove an attribute. Returns `true` if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|a| !a.name.eq_ignore_ascii_case(name));
        before != self.attributes.len()
    }

    /// Owned attribute value, or the empty value when absent.
    pub fn value_or_empty(&self, name: &str) -> RawValue {
        self.get(name).cloned().unwrap_or_default()
    }
}

/// Kind of change applied to one attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifyOp {
    /// Add the given values; adding a value already present is an error.
    Add,
    /// Replace all values; an empty value removes the attribute.
    Replace,
    /// Remove the given values, or the whole attribute when empty.
    Delete,
}

/// An attribute mutation used by both add and modify requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Modification {
    pub op: ModifyOp,
    pub attribute: String,
    pub value: RawValue,
}

impl Modification {
    pub fn add(attribute: impl Into<String>, value: RawValue) -> Self {
        Self {
            op: ModifyOp::Add,
            attribute: attribute.into(),
            value,
        }
    }

    pub fn replace(attribute: impl Into<String>, value: RawValue) -> Self {
        Self {
            op: ModifyOp::Replace,
            attribute: attribute.into(),
            value,
        }
    }

    /// Clear the whole attribute.
    pub fn delete(attribute: impl Into<String>) -> Self {
        Self {
            op: ModifyOp::Delete,
            attribute: attribute.into(),
            value: RawValue::empty(),
        }
    }

    /// Remove specific values.
    pub fn delete_values(attribute: impl Into<String>, value: RawValue) -> Self {
        Self {
            op: ModifyOp::Delete,
            attribute: attribute.into(),
            value,
        }
    }
}
