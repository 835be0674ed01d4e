use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use dirconf_types::{Dn, Filter, RawValue, SearchScope, OBJECT_CLASS};

use crate::entry::{Entry, Modification, ModifyOp};
use crate::error::{StoreError, StoreResult};
use crate::traits::DirectoryConnection;

/// Order in which search results are returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnumerationOrder {
    /// Sorted by normalized DN.
    #[default]
    Sorted,
    /// Reverse of `Sorted`.
    Reversed,
    /// A different deterministic permutation on every search.
    Shuffled { seed: u64 },
}

/// Configuration of an in-memory directory.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryDirectoryConfig {
    /// Naming contexts: entries that may be added without a parent. They are
    /// created when the directory is constructed.
    pub suffixes: Vec<Dn>,
    #[serde(default)]
    pub order: EnumerationOrder,
}

impl MemoryDirectoryConfig {
    pub fn with_suffix(suffix: Dn) -> Self {
        Self {
            suffixes: vec![suffix],
            order: EnumerationOrder::default(),
        }
    }

    pub fn order(mut self, order: EnumerationOrder) -> Self {
        self.order = order;
        self
    }
}

struct Inner {
    config: RwLock<MemoryDirectoryConfig>,
    entries: RwLock<BTreeMap<Dn, Entry>>,
    searches: AtomicU64,
}

/// In-memory, `BTreeMap`-based directory.
///
/// Intended for tests, the CLI, and embedding. Cloning yields another handle
/// (connection) onto the same tree. Comparisons of DNs, attribute names and
/// string values are ASCII case-insensitive.
#[derive(Clone)]
pub struct InMemoryDirectory {
    inner: Arc<Inner>,
}

impl InMemoryDirectory {
    /// Create a directory and its naming-context entries.
    pub fn new(config: MemoryDirectoryConfig) -> Self {
        let mut entries = BTreeMap::new();
        for suffix in &config.suffixes {
            let mut entry = Entry::new(suffix.clone());
            entry.set(OBJECT_CLASS, RawValue::from("top"));
            entries.insert(suffix.clone(), entry);
        }
        Self::from_parts(config, entries)
    }

    /// Convenience constructor for a single naming context.
    pub fn with_suffix(suffix: Dn) -> Self {
        Self::new(MemoryDirectoryConfig::with_suffix(suffix))
    }

    pub(crate) fn from_parts(config: MemoryDirectoryConfig, entries: BTreeMap<Dn, Entry>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config: RwLock::new(config),
                entries: RwLock::new(entries),
                searches: AtomicU64::new(0),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<Dn, Entry>> {
        self.inner.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<Dn, Entry>> {
        self.inner.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> MemoryDirectoryConfig {
        self.inner
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Change the enumeration order for subsequent searches.
    pub fn set_order(&self, order: EnumerationOrder) {
        self.inner
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .order = order;
    }

    /// Number of entries, naming contexts included.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if the directory holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn contains(&self, dn: &Dn) -> bool {
        self.read().contains_key(dn)
    }

    /// A copy of the entry at `dn`.
    pub fn get(&self, dn: &Dn) -> Option<Entry> {
        self.read().get(dn).cloned()
    }

    /// All entries, sorted by DN.
    pub fn entries(&self) -> Vec<Entry> {
        self.read().values().cloned().collect()
    }

    /// Number of entries strictly below `dn`.
    pub fn count_descendants(&self, dn: &Dn) -> usize {
        self.read().keys().filter(|k| k.is_descendant_of(dn)).count()
    }

    fn is_suffix(&self, dn: &Dn) -> bool {
        self.inner
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .suffixes
            .iter()
            .any(|s| s == dn)
    }

    fn apply_order(&self, entries: &mut [Entry]) {
        let order = self.config().order;
        match order {
            EnumerationOrder::Sorted => {}
            EnumerationOrder::Reversed => entries.reverse(),
            EnumerationOrder::Shuffled { seed } => {
                let n = self.inner.searches.fetch_add(1, Ordering::Relaxed);
                let mut rng = StdRng::seed_from_u64(seed ^ n.wrapping_mul(0x9e37_79b9_7f4a_7c15));
                entries.shuffle(&mut rng);
            }
        }
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new(MemoryDirectoryConfig::default())
    }
}

impl std::fmt::Debug for InMemoryDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryDirectory")
            .field("entry_count", &count)
            .field("order", &self.config().order)
            .finish()
    }
}

/// Evaluate a filter against an entry.
pub fn filter_matches(filter: &Filter, entry: &Entry) -> bool {
    match filter {
        Filter::Equality { attribute, value } => entry
            .get(attribute)
            .is_some_and(|v| v.contains_ignore_case(value)),
        Filter::Present(attribute) => entry.has(attribute),
        Filter::And(clauses) => clauses.iter().all(|c| filter_matches(c, entry)),
        Filter::Or(clauses) => clauses.iter().any(|c| filter_matches(c, entry)),
    }
}

fn project(entry: &Entry, attributes: &[&str], attributes_only: bool) -> Entry {
    let mut out = Entry::new(entry.dn.clone());
    for attr in &entry.attributes {
        let selected =
            attributes.is_empty() || attributes.iter().any(|a| a.eq_ignore_ascii_case(&attr.name));
        if !selected {
            continue;
        }
        let value = if attributes_only {
            RawValue::empty()
        } else {
            attr.value.clone()
        };
        out.attributes.push(crate::entry::EntryAttribute {
            name: attr.name.clone(),
            value,
        });
    }
    out
}

fn apply_modification(entry: &mut Entry, m: &Modification) -> StoreResult<()> {
    match m.op {
        ModifyOp::Add => {
            if m.value.is_empty() {
                return Ok(());
            }
            let mut current = entry.value_or_empty(&m.attribute);
            for item in m.value.items() {
                if current.items().iter().any(|i| i.eq_ignore_ascii_case(item)) {
                    return Err(StoreError::AttributeOrValueExists {
                        dn: entry.dn.clone(),
                        attribute: m.attribute.clone(),
                    });
                }
                current.push(item.clone());
            }
            entry.set(&m.attribute, current);
        }
        ModifyOp::Replace => entry.set(&m.attribute, m.value.clone()),
        ModifyOp::Delete => {
            if m.value.is_empty() {
                entry.remove(&m.attribute);
                return Ok(());
            }
            let mut current = entry.value_or_empty(&m.attribute);
            for item in m.value.items() {
                if current.remove_ignore_case(item) == 0 {
                    return Err(StoreError::NoSuchAttribute {
                        dn: entry.dn.clone(),
                        attribute: m.attribute.clone(),
                    });
                }
            }
            entry.set(&m.attribute, current);
        }
    }
    Ok(())
}

impl DirectoryConnection for InMemoryDirectory {
    fn search(
        &self,
        base: &Dn,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&str],
        attributes_only: bool,
    ) -> StoreResult<Vec<Entry>> {
        let mut results: Vec<Entry> = {
            let map = self.read();
            if !base.is_root() && !map.contains_key(base) {
                return Err(StoreError::NoSuchObject(base.clone()));
            }
            map.values()
                .filter(|e| match scope {
                    SearchScope::Base => &e.dn == base,
                    SearchScope::OneLevel => e.dn.is_child_of(base),
                    SearchScope::Subtree => &e.dn == base || e.dn.is_descendant_of(base),
                })
                .filter(|e| filter_matches(filter, e))
                .map(|e| project(e, attributes, attributes_only))
                .collect()
        };
        self.apply_order(&mut results);
        Ok(results)
    }

    fn add(&self, dn: &Dn, attributes: &[Modification]) -> StoreResult<()> {
        let mut entry = Entry::new(dn.clone());
        for m in attributes {
            apply_modification(&mut entry, &Modification::add(m.attribute.clone(), m.value.clone()))?;
        }
        if !entry.has(OBJECT_CLASS) {
            return Err(StoreError::ObjectClassViolation {
                dn: dn.clone(),
                reason: "entry has no objectClass".into(),
            });
        }

        let suffix = self.is_suffix(dn);
        let mut map = self.write();
        if map.contains_key(dn) {
            return Err(StoreError::AlreadyExists(dn.clone()));
        }
        if !suffix {
            let parent = dn
                .parent()
                .ok_or_else(|| StoreError::NoSuchObject(dn.clone()))?;
            if !map.contains_key(&parent) {
                return Err(StoreError::NoSuchObject(parent));
            }
        }
        map.insert(dn.clone(), entry);
        debug!(dn = %dn, "entry added");
        Ok(())
    }

    fn modify(&self, dn: &Dn, modifications: &[Modification]) -> StoreResult<()> {
        let mut map = self.write();
        let current = map
            .get(dn)
            .ok_or_else(|| StoreError::NoSuchObject(dn.clone()))?;
        let mut updated = current.clone();
        for m in modifications {
            apply_modification(&mut updated, m)?;
        }
        if !updated.has(OBJECT_CLASS) {
            return Err(StoreError::ObjectClassViolation {
                dn: dn.clone(),
                reason: "modification removes objectClass".into(),
            });
        }
        map.insert(dn.clone(), updated);
        Ok(())
    }

    fn delete(&self, dn: &Dn) -> StoreResult<()> {
        let mut map = self.write();
        if !map.contains_key(dn) {
            return Err(StoreError::NoSuchObject(dn.clone()));
        }
        if map.keys().any(|k| k.is_child_of(dn)) {
            return Err(StoreError::NotAllowedOnNonLeaf(dn.clone()));
        }
        map.remove(dn);
        debug!(dn = %dn, "entry deleted");
        Ok(())
    }
}
