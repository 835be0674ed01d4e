//! Foundation types for dirconf.
//!
//! This crate provides the addressing and value types shared by every layer:
//! the directory store, the mapping engine, the entity descriptors and the
//! configuration façade. Every other dirconf crate depends on `dirconf-types`.
//!
//! # Key Types
//!
//! - [`Dn`]: Distinguished name, the hierarchical primary key of an entry
//! - [`SearchScope`]: Base / one-level / subtree search breadth
//! - [`Filter`]: Structured search filter with RFC 4515 rendering
//! - [`RawValue`]: Ordered multi-valued raw attribute value
//! - [`Certificate`], [`PrivateKey`], [`Fingerprint`]: Opaque key material

pub mod cert;
pub mod dn;
pub mod error;
pub mod filter;
pub mod names;
pub mod value;

pub use cert::{Certificate, Fingerprint, PrivateKey};
pub use dn::{Dn, Rdn, CN};
pub use error::{TypeError, TypeResult};
pub use filter::{Filter, SearchScope, OBJECT_CLASS};
pub use value::RawValue;
