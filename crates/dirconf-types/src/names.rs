//! Canonical-name (`cn`) validation.
//!
//! Valid names:
//! - Must be non-empty
//! - Must not contain control characters (including NUL)
//! - Must not start or end with whitespace
//! - Must not exceed [`MAX_NAME_LEN`] bytes
//!
//! Characters with special meaning in DN strings (`,`, `=`, `+`, ...) are
//! permitted; they are escaped when the name is placed into a [`Dn`](crate::Dn).

use crate::error::{TypeError, TypeResult};

/// Upper bound on the byte length of a canonical name.
pub const MAX_NAME_LEN: usize = 256;

/// Validate a canonical name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use dirconf_types::names::validate_common_name;
///
/// assert!(validate_common_name("acme").is_ok());
/// assert!(validate_common_name("Acme, Inc.").is_ok());
/// assert!(validate_common_name("").is_err());
/// assert!(validate_common_name(" padded").is_err());
/// ```
pub fn validate_common_name(name: &str) -> TypeResult<()> {
    if name.is_empty() {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: "name must not be empty".into(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: format!("longer than {MAX_NAME_LEN} bytes"),
        });
    }

    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: format!("contains control character: {ch:?}"),
        });
    }

    if name.starts_with(char::is_whitespace) || name.ends_with(char::is_whitespace) {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: "must not start or end with whitespace".into(),
        });
    }

    Ok(())
}

/// Returns `true` if the name is valid.
pub fn is_valid_common_name(name: &str) -> bool {
    validate_common_name(name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Valid names
    // -----------------------------------------------------------------------

    #[test]
    fn simple_names_are_valid() {
        assert!(validate_common_name("acme").is_ok());
        assert!(validate_common_name("vsphere.local").is_ok());
        assert!(validate_common_name("TenantCredential-3").is_ok());
    }

    #[test]
    fn dn_special_characters_are_valid() {
        assert!(validate_common_name("a,b").is_ok());
        assert!(validate_common_name("x=y").is_ok());
        assert!(validate_common_name("#hash").is_ok());
        assert!(validate_common_name("in the middle").is_ok());
    }

    // -----------------------------------------------------------------------
    // Invalid names
    // -----------------------------------------------------------------------

    #[test]
    fn empty_is_invalid() {
        let err = validate_common_name("").unwrap_err();
        assert!(matches!(err, TypeError::InvalidName { .. }));
    }

    #[test]
    fn control_characters_are_invalid() {
        assert!(validate_common_name("a\0b").is_err());
        assert!(validate_common_name("line\nbreak").is_err());
        assert!(validate_common_name("tab\there").is_err());
    }

    #[test]
    fn surrounding_whitespace_is_invalid() {
        assert!(validate_common_name(" leading").is_err());
        assert!(validate_common_name("trailing ").is_err());
    }

    #[test]
    fn overlong_name_is_invalid() {
        let name = "a".repeat(MAX_NAME_LEN + 1);
        assert!(validate_common_name(&name).is_err());
        assert!(is_valid_common_name(&"a".repeat(MAX_NAME_LEN)));
    }
}
