//! Hierarchical directory store for dirconf.
//!
//! This crate defines the contract the schema mapper talks to and a
//! self-contained backend that honors it.
//!
//! # Key Types
//!
//! - [`DirectoryConnection`]: search/add/modify/delete over DN-addressed entries
//! - [`InMemoryDirectory`]: `BTreeMap`-backed directory with configurable
//!   enumeration order and JSON snapshots
//! - [`ConnectionPool`]: borrow/return pool with RAII guards
//! - [`Entry`] / [`Modification`]: the wire shapes of entries and changes

pub mod entry;
pub mod error;
pub mod memory;
pub mod pool;
pub mod snapshot;
pub mod traits;

pub use entry::{Entry, EntryAttribute, Modification, ModifyOp};
pub use error::{StoreError, StoreResult};
pub use memory::{filter_matches, EnumerationOrder, InMemoryDirectory, MemoryDirectoryConfig};
pub use pool::{ConnectionFactory, ConnectionPool, PooledConnection, DEFAULT_MAX_IDLE};
pub use snapshot::{Snapshot, SNAPSHOT_FORMAT_VERSION};
pub use traits::DirectoryConnection;
