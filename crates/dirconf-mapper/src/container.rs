//! Organizational containers and collections stored beneath them.
//!
//! A container is an entry with nothing but a name. Containers are created
//! on first write and a collection is replaced by deleting its container
//! wholesale and recreating it, so nothing is ever diffed in place.

use std::sync::OnceLock;

use tracing::debug;

use dirconf_store::DirectoryConnection;
use dirconf_types::{Dn, SearchScope, CN};

use crate::codec::AttributeValue;
use crate::descriptor::{AttributeMapping, Descriptor};
use crate::error::{MapperError, MapperResult};
use crate::subtree::delete_subtree;

pub const CONTAINER_OBJECT_CLASS: &str = "container";

/// A namespace node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container {
    pub name: String,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Descriptor for `objectClass=container`.
pub fn container_descriptor() -> &'static Descriptor<Container> {
    static DESCRIPTOR: OnceLock<Descriptor<Container>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        Descriptor::direct(
            CONTAINER_OBJECT_CLASS,
            vec![AttributeMapping::new(CN, |c: &Container| c.name.encode())
                .ctor(0)
                .create_only()],
            |args| Ok(Container::new(args.get::<String>(0)?)),
        )
        .expect("container descriptor table is well-formed")
    })
}

/// Find the container `name` directly beneath `parent`.
///
/// When it is missing and `create` is set, an empty container is created.
/// `None` means nothing has been stored there yet.
pub fn ensure_exists(
    conn: &dyn DirectoryConnection,
    parent: &Dn,
    name: &str,
    create: bool,
) -> MapperResult<Option<Dn>> {
    ensure_object_exists(conn, parent, container_descriptor(), &Container::new(name), create)
}

/// Find `object` by name directly beneath `parent`, creating it when
/// missing and `create` is set.
///
/// Creation racing with another writer is not an error: the object exists
/// either way.
pub fn ensure_object_exists<E, B>(
    conn: &dyn DirectoryConnection,
    parent: &Dn,
    descriptor: &Descriptor<E, B>,
    object: &E,
    create: bool,
) -> MapperResult<Option<Dn>> {
    let name = descriptor.cn_of(object)?;
    if let Some(dn) = descriptor.lookup_one(conn, parent, SearchScope::OneLevel, &name, None)? {
        return Ok(Some(dn));
    }
    if !create {
        return Ok(None);
    }
    let dn = parent.child_cn(&name)?;
    match descriptor.create(conn, &dn, object) {
        Ok(()) | Err(MapperError::AlreadyExists(_)) => Ok(Some(dn)),
        Err(e) => Err(e),
    }
}

/// Replace the collection stored in container `name` beneath `parent`.
///
/// The existing container is deleted with everything in it. If `items` is
/// non-empty the container is recreated and one child is created per item,
/// after which `on_item` runs with the child's DN (for nested saves).
///
/// Not atomic: a failure part way leaves the collection partially written.
pub fn save_collection<E, B, F>(
    conn: &dyn DirectoryConnection,
    parent: &Dn,
    name: &str,
    descriptor: &Descriptor<E, B>,
    items: &[E],
    mut on_item: F,
) -> MapperResult<()>
where
    F: FnMut(&dyn DirectoryConnection, &Dn, &E) -> MapperResult<()>,
{
    if let Some(existing) = ensure_exists(conn, parent, name, false)? {
        delete_subtree(conn, &existing)?;
    }
    if items.is_empty() {
        return Ok(());
    }

    let container = ensure_exists(conn, parent, name, true)?
        .ok_or_else(|| MapperError::not_found(format!("container {name} under {parent}")))?;
    for item in items {
        let dn = descriptor.dn_for(&container, item)?;
        descriptor.create(conn, &dn, item)?;
        on_item(conn, &dn, item)?;
    }
    debug!(
        container = %container,
        object_class = descriptor.object_class(),
        count = items.len(),
        "collection saved"
    );
    Ok(())
}

/// Load the collection stored in container `name` beneath `parent`, in
/// store order. A missing container is an empty collection.
///
/// `on_item` runs for every loaded item with its DN, for hydrating nested
/// collections.
pub fn load_collection<E, B, F>(
    conn: &dyn DirectoryConnection,
    parent: &Dn,
    name: &str,
    descriptor: &Descriptor<E, B>,
    mut on_item: F,
) -> MapperResult<Vec<E>>
where
    F: FnMut(&dyn DirectoryConnection, &Dn, &mut E) -> MapperResult<()>,
{
    let Some(container) = ensure_exists(conn, parent, name, false)? else {
        return Ok(Vec::new());
    };
    let mut items = Vec::new();
    for (dn, mut item) in
        descriptor.search_all_with_dn(conn, &container, SearchScope::OneLevel, None)?
    {
        on_item(conn, &dn, &mut item)?;
        items.push(item);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{base, directory, widget, widget_descriptor, Widget};

    #[test]
    fn descriptor_builds() {
        let d = container_descriptor();
        assert_eq!(d.object_class(), "container");
        assert_eq!(d.updatable_attributes().count(), 0);
    }

    #[test]
    fn ensure_is_idempotent() {
        let dir = directory();
        let first = ensure_exists(&dir, &base(), "Widgets", true).unwrap();
        let second = ensure_exists(&dir, &base(), "Widgets", true).unwrap();
        assert_eq!(first, second);
        assert!(first.is_some());
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn ensure_without_create_reports_absence() {
        let dir = directory();
        assert_eq!(ensure_exists(&dir, &base(), "Widgets", false).unwrap(), None);
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn ensure_beneath_missing_parent() {
        let dir = directory();
        let missing = base().child_cn("nowhere").unwrap();
        assert_eq!(ensure_exists(&dir, &missing, "Widgets", false).unwrap(), None);
        assert!(ensure_exists(&dir, &missing, "Widgets", true).is_err());
    }

    #[test]
    fn ensure_object_creates_once() {
        let dir = directory();
        let d = widget_descriptor();
        let w = widget("gear");
        let a = ensure_object_exists(&dir, &base(), &d, &w, true).unwrap();
        let b = ensure_object_exists(&dir, &base(), &d, &w, true).unwrap();
        assert_eq!(a, b);
        assert_eq!(d.search_all(&dir, &base(), SearchScope::OneLevel, None).unwrap().len(), 1);
    }

    #[test]
    fn collection_replace_leaves_no_residue() {
        let dir = directory();
        let d = widget_descriptor();
        let first = vec![widget("a"), widget("b"), widget("c")];
        save_collection(&dir, &base(), "Widgets", &d, &first, |_, _, _| Ok(())).unwrap();

        let second = vec![widget("d")];
        save_collection(&dir, &base(), "Widgets", &d, &second, |_, _, _| Ok(())).unwrap();

        let loaded = load_collection(&dir, &base(), "Widgets", &d, |_, _, _| Ok(())).unwrap();
        assert_eq!(loaded, second);
    }

    #[test]
    fn empty_collection_removes_container() {
        let dir = directory();
        let d = widget_descriptor();
        save_collection(&dir, &base(), "Widgets", &d, &[widget("a")], |_, _, _| Ok(())).unwrap();
        save_collection(&dir, &base(), "Widgets", &d, &[], |_, _, _| Ok(())).unwrap();
        assert_eq!(ensure_exists(&dir, &base(), "Widgets", false).unwrap(), None);
        assert!(load_collection(&dir, &base(), "Widgets", &d, |_, _, _| Ok(()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn callbacks_see_item_dns() {
        let dir = directory();
        let d = widget_descriptor();
        let items = vec![widget("a"), widget("b")];
        let mut saved = Vec::new();
        save_collection(&dir, &base(), "Widgets", &d, &items, |_, dn, w: &Widget| {
            saved.push((dn.clone(), w.name.clone()));
            Ok(())
        })
        .unwrap();
        assert_eq!(saved.len(), 2);
        assert!(saved.iter().all(|(dn, name)| dn.leaf_value() == Some(name.as_str())));

        let loaded = load_collection(&dir, &base(), "Widgets", &d, |_, _, w: &mut Widget| {
            w.tags.push("hydrated".into());
            Ok(())
        })
        .unwrap();
        assert!(loaded.iter().all(|w| w.tags.last().map(String::as_str) == Some("hydrated")));
    }
}
