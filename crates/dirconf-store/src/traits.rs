use dirconf_types::{Dn, Filter, SearchScope};

use crate::entry::{Entry, Modification};
use crate::error::{StoreError, StoreResult};

/// A connection to a hierarchical directory store.
///
/// All implementations must satisfy these invariants:
/// - Entries are addressed by DN; a DN holds at most one entry.
/// - An entry can only be added beneath an existing parent.
/// - Deleting an entry that still has children fails; there is no cascade.
/// - Sibling enumeration order is unspecified. Callers that need an order
///   must carry it in the data.
/// - Each call is independent; there are no multi-entry transactions.
/// - All backend errors are propagated, never silently ignored.
pub trait DirectoryConnection: Send + Sync {
    /// Search beneath `base` with the given scope and filter.
    ///
    /// `attributes` selects which attributes to return (empty selects all);
    /// with `attributes_only` the selected attributes come back without
    /// values. Fails with [`StoreError::NoSuchObject`] if `base` is absent.
    fn search(
        &self,
        base: &Dn,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&str],
        attributes_only: bool,
    ) -> StoreResult<Vec<Entry>>;

    /// Add a new entry built from `attributes`.
    fn add(&self, dn: &Dn, attributes: &[Modification]) -> StoreResult<()>;

    /// Apply modifications to an existing entry, all-or-nothing.
    fn modify(&self, dn: &Dn, modifications: &[Modification]) -> StoreResult<()>;

    /// Delete a leaf entry.
    fn delete(&self, dn: &Dn) -> StoreResult<()>;

    /// Check whether an entry exists at `dn`.
    ///
    /// Default implementation performs a base-scope search and maps
    /// [`StoreError::NoSuchObject`] to `false`.
    fn exists(&self, dn: &Dn) -> StoreResult<bool> {
        match self.search(dn, SearchScope::Base, &Filter::any_object(), &[], true) {
            Ok(entries) => Ok(!entries.is_empty()),
            Err(StoreError::NoSuchObject(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
