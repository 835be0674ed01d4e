//! Tenant secret handling for dirconf.
//!
//! - [`TenantSecretCipher`]: the collaborator contract for encrypting
//!   identity-provider bind passwords under a per-tenant key
//! - [`KeystreamCipher`]: keyed-BLAKE3 encrypt-then-MAC implementation
//! - [`generate_tenant_key`]: random printable tenant keys

pub mod cipher;
pub mod error;
pub mod keys;

pub use cipher::{KeystreamCipher, TenantSecretCipher};
pub use error::{CipherError, CipherResult};
pub use keys::{generate_tenant_key, DEFAULT_TENANT_KEY_LEN};
