use dirconf_types::Dn;

/// Errors reported by a directory connection.
///
/// The first five variants are the distinguished signals the mapping layer
/// reacts to; everything else is propagated unchanged.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An entry already exists at the DN.
    #[error("entry already exists: {0}")]
    AlreadyExists(Dn),

    /// No entry exists at the DN (or at the parent of an entry being added).
    #[error("no such object: {0}")]
    NoSuchObject(Dn),

    /// A modify tried to add a value the attribute already holds.
    #[error("attribute {attribute} of {dn} already has the value")]
    AttributeOrValueExists { dn: Dn, attribute: String },

    /// A modify tried to delete a value the attribute does not hold.
    #[error("attribute {attribute} of {dn} has no such value")]
    NoSuchAttribute { dn: Dn, attribute: String },

    /// Deleting an entry that still has children.
    #[error("entry has children: {0}")]
    NotAllowedOnNonLeaf(Dn),

    /// The entry would be left without an object class.
    #[error("object class violation at {dn}: {reason}")]
    ObjectClassViolation { dn: Dn, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection or backend failure.
    #[error("directory backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
