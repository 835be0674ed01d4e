//! Declarative mapping between typed entities and a hierarchical directory
//! store.
//!
//! # Key Types
//!
//! - [`AttributeValue`]: typed value ⇄ [`RawValue`](dirconf_types::RawValue)
//! - [`AttributeMapping`] / [`Descriptor`]: per-entity attribute table with
//!   constructor positions, settable and updatable flags, getters and setters
//! - [`Indexed`]: payload plus sequence index for ordered collections
//! - [`Container`]: organizational namespace node
//!
//! # Operations
//!
//! The engine methods live on [`Descriptor`] (`lookup_one`, `retrieve_one`,
//! `search_all`, `create`, `update`, `delete`, `get_property`, ...). The
//! collection helpers [`save_collection`], [`load_collection`],
//! [`save_indexed`] and [`load_indexed`] replace and read whole child sets
//! beneath a container. [`delete_subtree`] removes an entry and all of its
//! descendants.
//!
//! # Design Rules
//!
//! - Lookups that expect one object fail on more than one match.
//! - Collections are replaced, never diffed: delete the container, recreate.
//! - Nothing here is transactional; multi-step writes can stop part way.

pub mod codec;
pub mod container;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod indexed;
pub mod subtree;

#[cfg(test)]
mod fixtures;

pub use codec::{AttributeValue, ScalarValue};
pub use container::{
    container_descriptor, ensure_exists, ensure_object_exists, load_collection, save_collection,
    Container, CONTAINER_OBJECT_CLASS,
};
pub use descriptor::{AttributeMapping, CtorArgs, Descriptor};
pub use error::{CodecError, CodecResult, MapperError, MapperResult};
pub use indexed::{
    index_name, indexed_descriptor, load_indexed, parse_index, save_indexed, Indexed,
    IndexedBuilder,
};
pub use subtree::delete_subtree;
