use std::collections::HashSet;

use tracing::debug;

use dirconf_store::DirectoryConnection;
use dirconf_types::{Dn, Filter, SearchScope, OBJECT_CLASS};

use crate::error::MapperResult;

/// Delete `dn` and every entry beneath it. Returns the number of entries
/// removed.
///
/// Uses an explicit work stack, so subtree depth never grows the call stack.
/// A DN is popped twice: the first time its children are pushed above it,
/// the second time (all descendants gone) it is deleted. The first failing
/// store call aborts the traversal and leaves the rest of the subtree in
/// place.
pub fn delete_subtree(conn: &dyn DirectoryConnection, dn: &Dn) -> MapperResult<usize> {
    let mut stack = vec![dn.clone()];
    let mut expanded: HashSet<Dn> = HashSet::new();
    let mut removed = 0usize;

    while let Some(current) = stack.pop() {
        if expanded.remove(&current) {
            conn.delete(&current)?;
            removed += 1;
            continue;
        }

        let children = conn.search(
            &current,
            SearchScope::OneLevel,
            &Filter::any_object(),
            &[OBJECT_CLASS],
            true,
        )?;
        stack.push(current.clone());
        expanded.insert(current);
        stack.extend(children.into_iter().map(|entry| entry.dn));
    }

    debug!(dn = %dn, removed, "subtree deleted");
    Ok(removed)
}
