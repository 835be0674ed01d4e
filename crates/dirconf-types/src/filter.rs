use std::fmt;

use serde::{Deserialize, Serialize};

/// The `objectClass` attribute every stored entry carries.
pub const OBJECT_CLASS: &str = "objectClass";

/// Search breadth relative to the base DN.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchScope {
    /// The base entry only.
    Base,
    /// Immediate children of the base (not the base itself).
    OneLevel,
    /// The base entry and all of its descendants.
    Subtree,
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::OneLevel => write!(f, "one"),
            Self::Subtree => write!(f, "sub"),
        }
    }
}

/// A search filter in structured form.
///
/// `Display` renders the RFC 4515 string form with assertion values escaped,
/// so values taken from entities can never alter the filter structure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    /// `(attribute=value)`
    Equality { attribute: String, value: String },
    /// `(attribute=*)`
    Present(String),
    /// `(&f1f2...)`
    And(Vec<Filter>),
    /// `(|f1f2...)`
    Or(Vec<Filter>),
}

impl Filter {
    pub fn equality(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equality {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn present(attribute: impl Into<String>) -> Self {
        Self::Present(attribute.into())
    }

    /// `(objectClass=<class>)`
    pub fn object_class(class: &str) -> Self {
        Self::equality(OBJECT_CLASS, class)
    }

    /// `(objectClass=*)`, matching every entry.
    pub fn any_object() -> Self {
        Self::present(OBJECT_CLASS)
    }

    /// Conjunction of the given clauses. A single clause is returned as-is.
    pub fn and(mut clauses: Vec<Filter>) -> Self {
        if clauses.len() == 1 {
            return clauses.remove(0);
        }
        Self::And(clauses)
    }

    /// Membership filter: a flat OR of one equality clause per value.
    ///
    /// Returns `None` for an empty candidate list. `None` means "no extra
    /// filter", which matches everything; callers that need "no results" for
    /// an empty set must check for emptiness themselves.
    pub fn in_set<I, S>(attribute: &str, values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut clauses: Vec<Filter> = values
            .into_iter()
            .map(|v| Self::equality(attribute, v))
            .collect();
        match clauses.len() {
            0 => None,
            1 => Some(clauses.remove(0)),
            _ => Some(Self::Or(clauses)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equality { attribute, value } => {
                write!(f, "({attribute}={})", escape_assertion_value(value))
            }
            Self::Present(attribute) => write!(f, "({attribute}=*)"),
            Self::And(clauses) => {
                f.write_str("(&")?;
                for clause in clauses {
                    write!(f, "{clause}")?;
                }
                f.write_str(")")
            }
            Self::Or(clauses) => {
                f.write_str("(|")?;
                for clause in clauses {
                    write!(f, "{clause}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Escape a filter assertion value per RFC 4515.
pub fn escape_assertion_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '*' => out.push_str("\\2a"),
            '(' => out.push_str("\\28"),
            ')' => out.push_str("\\29"),
            '\\' => out.push_str("\\5c"),
            '\0' => out.push_str("\\00"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    #[test]
    fn equality_renders() {
        let f = Filter::equality("cn", "acme");
        assert_eq!(f.to_string(), "(cn=acme)");
    }

    #[test]
    fn compound_renders() {
        let f = Filter::and(vec![
            Filter::object_class("vmwSTSTenant"),
            Filter::equality("cn", "acme"),
        ]);
        assert_eq!(f.to_string(), "(&(objectClass=vmwSTSTenant)(cn=acme))");
    }

    #[test]
    fn and_of_one_is_unwrapped() {
        let f = Filter::and(vec![Filter::object_class("container")]);
        assert_eq!(f.to_string(), "(objectClass=container)");
    }

    #[test]
    fn present_renders() {
        assert_eq!(Filter::any_object().to_string(), "(objectClass=*)");
    }

    // -----------------------------------------------------------------------
    // Escaping
    // -----------------------------------------------------------------------

    #[test]
    fn injection_is_escaped() {
        let f = Filter::equality("cn", "*)(objectClass=*");
        assert_eq!(f.to_string(), "(cn=\\2a\\29\\28objectClass=\\2a)");
    }

    #[test]
    fn backslash_and_nul_are_escaped() {
        assert_eq!(escape_assertion_value("a\\b"), "a\\5cb");
        assert_eq!(escape_assertion_value("a\0b"), "a\\00b");
    }

    proptest! {
        #[test]
        fn escaped_values_have_no_structural_chars(value in ".*") {
            let escaped = escape_assertion_value(&value);
            prop_assert!(!escaped.contains('('));
            prop_assert!(!escaped.contains(')'));
            prop_assert!(!escaped.contains('*'));
        }
    }

    // -----------------------------------------------------------------------
    // In-set filters
    // -----------------------------------------------------------------------

    #[test]
    fn in_set_empty_is_none() {
        assert!(Filter::in_set("cn", Vec::<String>::new()).is_none());
    }

    #[test]
    fn in_set_single_is_equality() {
        let f = Filter::in_set("vmwSTSDomainType", ["SYSTEM_DOMAIN"]).unwrap();
        assert_eq!(f.to_string(), "(vmwSTSDomainType=SYSTEM_DOMAIN)");
    }

    #[test]
    fn in_set_many_is_flat_or() {
        let f = Filter::in_set("url", ["a", "b", "c"]).unwrap();
        assert_eq!(f.to_string(), "(|(url=a)(url=b)(url=c))");
        match f {
            Filter::Or(clauses) => assert_eq!(clauses.len(), 3),
            other => panic!("expected Or, got {other:?}"),
        }
    }
}
