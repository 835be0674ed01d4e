use dirconf_store::StoreError;
use dirconf_types::{Dn, TypeError};

/// Errors produced by the mapping engine.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    /// A required object was not found.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// More than one entry matched a filter meant to identify one object.
    #[error("{count} entries under {base} match {filter}; expected at most one")]
    AmbiguousObject {
        base: Dn,
        filter: String,
        count: usize,
    },

    /// The store already holds an entry at the DN.
    #[error("object already exists: {0}")]
    AlreadyExists(Dn),

    /// A uniqueness-constrained attribute collided on create or modify.
    #[error("conflicting value for attribute {attribute} of {dn}")]
    AttributeValueConflict { dn: Dn, attribute: String },

    /// A stored value could not be decoded into the declared type.
    #[error("malformed value for attribute {attribute}: {reason}")]
    MalformedAttributeValue { attribute: String, reason: String },

    /// The attribute is not declared by the descriptor.
    #[error("attribute {attribute} is not declared for object class {object_class}")]
    UnknownAttribute {
        object_class: String,
        attribute: String,
    },

    /// A descriptor table violates its structural rules.
    #[error("invalid descriptor for object class {object_class}: {reason}")]
    InvalidDescriptor {
        object_class: String,
        reason: String,
    },

    #[error("invalid name: {0}")]
    InvalidName(#[from] TypeError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl MapperError {
    /// Returns `true` for errors that indicate corrupt stored state or a
    /// filter bug. These are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AmbiguousObject { .. } | Self::MalformedAttributeValue { .. }
        )
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }
}

impl From<StoreError> for MapperError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(dn) => Self::AlreadyExists(dn),
            StoreError::AttributeOrValueExists { dn, attribute } => {
                Self::AttributeValueConflict { dn, attribute }
            }
            other => Self::Store(other),
        }
    }
}

/// A value that could not be decoded. Carries no attribute name; the engine
/// attaches one with [`CodecError::at`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct CodecError {
    pub reason: String,
}

impl CodecError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Promote to a [`MapperError::MalformedAttributeValue`] for `attribute`.
    pub fn at(self, attribute: &str) -> MapperError {
        MapperError::MalformedAttributeValue {
            attribute: attribute.to_string(),
            reason: self.reason,
        }
    }
}

/// Result alias for mapper operations.
pub type MapperResult<T> = Result<T, MapperError>;

/// Result alias for value decoding.
pub type CodecResult<T> = Result<T, CodecError>;
