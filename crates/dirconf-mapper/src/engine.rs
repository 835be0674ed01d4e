//! Store operations driven by a [`Descriptor`].
//!
//! Every operation takes the connection explicitly; descriptors hold no
//! connection state. Searches beneath a base that does not exist yet return
//! no results rather than an error.

use std::collections::BTreeSet;

use tracing::debug;

use dirconf_store::{DirectoryConnection, Entry, Modification, StoreError};
use dirconf_types::{Dn, Filter, RawValue, SearchScope, CN};

use crate::codec::AttributeValue;
use crate::descriptor::Descriptor;
use crate::error::{MapperError, MapperResult};
use crate::subtree::delete_subtree;

fn search_entries(
    conn: &dyn DirectoryConnection,
    base: &Dn,
    scope: SearchScope,
    filter: &Filter,
    attributes: &[&str],
    attributes_only: bool,
) -> MapperResult<Vec<Entry>> {
    match conn.search(base, scope, filter, attributes, attributes_only) {
        Ok(entries) => Ok(entries),
        Err(StoreError::NoSuchObject(missing)) if &missing == base => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

impl<E, B> Descriptor<E, B> {
    /// The canonical name of `entity`.
    pub fn cn_of(&self, entity: &E) -> MapperResult<String> {
        String::decode(&self.cn_mapping().value_of(entity)).map_err(|e| e.at(CN))
    }

    /// `cn=<name>,<parent>` for `entity`.
    pub fn dn_for(&self, parent: &Dn, entity: &E) -> MapperResult<Dn> {
        Ok(parent.child_cn(&self.cn_of(entity)?)?)
    }

    /// `(&(objectClass=<class>)(cn=<name>)<extra>)`; the name clause is
    /// omitted when `name` is empty.
    pub fn object_filter(&self, name: &str, extra: Option<&Filter>) -> Filter {
        let mut clauses = vec![Filter::object_class(self.object_class())];
        if !name.is_empty() {
            clauses.push(Filter::equality(CN, name));
        }
        if let Some(extra) = extra {
            clauses.push(extra.clone());
        }
        Filter::and(clauses)
    }

    fn find_unique(
        &self,
        conn: &dyn DirectoryConnection,
        base: &Dn,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&str],
        attributes_only: bool,
    ) -> MapperResult<Option<Entry>> {
        let mut entries = search_entries(conn, base, scope, filter, attributes, attributes_only)?;
        match entries.len() {
            0 => Ok(None),
            1 => Ok(entries.pop()),
            count => Err(MapperError::AmbiguousObject {
                base: base.clone(),
                filter: filter.to_string(),
                count,
            }),
        }
    }

    /// DN of the single matching object. More than one match is reported as
    /// [`MapperError::AmbiguousObject`].
    pub fn lookup_one(
        &self,
        conn: &dyn DirectoryConnection,
        base: &Dn,
        scope: SearchScope,
        name: &str,
        extra: Option<&Filter>,
    ) -> MapperResult<Option<Dn>> {
        let filter = self.object_filter(name, extra);
        Ok(self
            .find_unique(conn, base, scope, &filter, &[CN], true)?
            .map(|e| e.dn))
    }

    /// DNs of every matching object.
    pub fn lookup_many(
        &self,
        conn: &dyn DirectoryConnection,
        base: &Dn,
        scope: SearchScope,
        name: &str,
        extra: Option<&Filter>,
    ) -> MapperResult<BTreeSet<Dn>> {
        let filter = self.object_filter(name, extra);
        Ok(search_entries(conn, base, scope, &filter, &[CN], true)?
            .into_iter()
            .map(|e| e.dn)
            .collect())
    }

    fn from_entry(&self, entry: &Entry) -> MapperResult<E> {
        self.materialize(|name| entry.value_or_empty(name))
    }

    /// The single matching object, materialized.
    pub fn retrieve_one(
        &self,
        conn: &dyn DirectoryConnection,
        base: &Dn,
        scope: SearchScope,
        name: &str,
    ) -> MapperResult<Option<E>> {
        Ok(self
            .retrieve_one_with_dn(conn, base, scope, name)?
            .map(|(_, entity)| entity))
    }

    pub fn retrieve_one_with_dn(
        &self,
        conn: &dyn DirectoryConnection,
        base: &Dn,
        scope: SearchScope,
        name: &str,
    ) -> MapperResult<Option<(Dn, E)>> {
        let filter = self.object_filter(name, None);
        let names = self.settable_names();
        match self.find_unique(conn, base, scope, &filter, &names, false)? {
            Some(entry) => {
                let entity = self.from_entry(&entry)?;
                Ok(Some((entry.dn, entity)))
            }
            None => Ok(None),
        }
    }

    /// Every matching object, in store order.
    pub fn search_all(
        &self,
        conn: &dyn DirectoryConnection,
        base: &Dn,
        scope: SearchScope,
        extra: Option<&Filter>,
    ) -> MapperResult<Vec<E>> {
        Ok(self
            .search_all_with_dn(conn, base, scope, extra)?
            .into_iter()
            .map(|(_, entity)| entity)
            .collect())
    }

    pub fn search_all_with_dn(
        &self,
        conn: &dyn DirectoryConnection,
        base: &Dn,
        scope: SearchScope,
        extra: Option<&Filter>,
    ) -> MapperResult<Vec<(Dn, E)>> {
        let filter = self.object_filter("", extra);
        let names = self.settable_names();
        search_entries(conn, base, scope, &filter, &names, false)?
            .into_iter()
            .map(|entry| -> MapperResult<(Dn, E)> {
                let entity = self.from_entry(&entry)?;
                Ok((entry.dn, entity))
            })
            .collect()
    }

    /// Add `entity` at `dn` with its object class and every non-empty
    /// settable attribute.
    pub fn create(&self, conn: &dyn DirectoryConnection, dn: &Dn, entity: &E) -> MapperResult<()> {
        let mut attributes = vec![Modification::add(
            dirconf_types::OBJECT_CLASS,
            RawValue::from(self.object_class()),
        )];
        for attr in self.settable_attributes() {
            let value = attr.value_of(entity);
            if !value.is_empty() {
                attributes.push(Modification::add(attr.name(), value));
            }
        }
        conn.add(dn, &attributes)?;
        debug!(
            dn = %dn,
            object_class = self.object_class(),
            attributes = attributes.len() - 1,
            "object created"
        );
        Ok(())
    }

    /// Rewrite the updatable attributes of the object at `dn`: REPLACE when
    /// the entity holds a value, DELETE otherwise. Other attributes are left
    /// untouched.
    pub fn update(&self, conn: &dyn DirectoryConnection, dn: &Dn, entity: &E) -> MapperResult<()> {
        let modifications: Vec<Modification> = self
            .updatable_attributes()
            .map(|attr| {
                let value = attr.value_of(entity);
                if value.is_empty() {
                    Modification::delete(attr.name())
                } else {
                    Modification::replace(attr.name(), value)
                }
            })
            .collect();
        if modifications.is_empty() {
            return Ok(());
        }
        conn.modify(dn, &modifications)?;
        debug!(dn = %dn, object_class = self.object_class(), "object updated");
        Ok(())
    }

    /// Find `entity` by name beneath `base` and update it.
    pub fn update_named(
        &self,
        conn: &dyn DirectoryConnection,
        base: &Dn,
        scope: SearchScope,
        entity: &E,
    ) -> MapperResult<Dn> {
        let name = self.cn_of(entity)?;
        let dn = self
            .lookup_one(conn, base, scope, &name, None)?
            .ok_or_else(|| {
                MapperError::not_found(format!("{} {name} under {base}", self.object_class()))
            })?;
        self.update(conn, &dn, entity)?;
        Ok(dn)
    }

    /// Delete the object at `dn` together with everything beneath it.
    pub fn delete(&self, conn: &dyn DirectoryConnection, dn: &Dn) -> MapperResult<()> {
        let removed = delete_subtree(conn, dn)?;
        debug!(dn = %dn, object_class = self.object_class(), removed, "object deleted");
        Ok(())
    }

    /// Read one attribute of the single matching object without
    /// materializing it. `None` when the object is missing or the attribute
    /// has no value.
    pub fn get_property(
        &self,
        conn: &dyn DirectoryConnection,
        base: &Dn,
        scope: SearchScope,
        name: &str,
        attribute: &str,
    ) -> MapperResult<Option<RawValue>> {
        let attr = self.require_attribute(attribute)?;
        let filter = self.object_filter(name, None);
        let entry = self.find_unique(conn, base, scope, &filter, &[attr.name()], false)?;
        Ok(entry
            .map(|e| e.value_or_empty(attr.name()))
            .filter(|v| !v.is_empty()))
    }

    /// Overwrite one attribute of the object at `dn`. An empty value clears
    /// the attribute.
    pub fn set_property(
        &self,
        conn: &dyn DirectoryConnection,
        dn: &Dn,
        attribute: &str,
        value: RawValue,
    ) -> MapperResult<()> {
        let attr = self.require_attribute(attribute)?;
        let modification = if value.is_empty() {
            Modification::delete(attr.name())
        } else {
            Modification::replace(attr.name(), value)
        };
        conn.modify(dn, &[modification])?;
        debug!(dn = %dn, attribute = attr.name(), "property set");
        Ok(())
    }

    /// Membership filter over a declared attribute. `None` for an empty
    /// candidate list, which matches everything.
    pub fn in_set_filter<I, S>(&self, attribute: &str, values: I) -> MapperResult<Option<Filter>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attr = self.require_attribute(attribute)?;
        Ok(Filter::in_set(attr.name(), values))
    }
}
