use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};
use crate::names::validate_common_name;

/// Characters that must be backslash-escaped anywhere in an RDN value.
const SPECIAL_CHARS: &[char] = &[',', '+', '"', '\\', '<', '>', ';', '='];

/// The canonical-name attribute used as the leaf component of mapped objects.
pub const CN: &str = "cn";

/// One `attribute=value` component of a distinguished name.
#[derive(Clone, Debug)]
pub struct Rdn {
    attribute: String,
    value: String,
}

impl Rdn {
    /// Create a component, validating the attribute type.
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> TypeResult<Self> {
        let attribute = attribute.into();
        validate_attribute_type(&attribute)?;
        Ok(Self {
            attribute,
            value: value.into(),
        })
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// The unescaped value.
    pub fn value(&self) -> &str {
        &self.value
    }

    fn normalized(&self) -> String {
        format!(
            "{}={}",
            self.attribute.to_ascii_lowercase(),
            escape_value(&self.value.to_ascii_lowercase())
        )
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attribute, escape_value(&self.value))
    }
}

impl PartialEq for Rdn {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Rdn {}

/// A distinguished name: RDN components ordered from leaf to root.
///
/// Equality, hashing and ordering are ASCII case-insensitive, matching the
/// directory's comparison rules for attribute types and `cn` values. The
/// original spelling is preserved for display.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dn {
    rdns: Vec<Rdn>,
}

impl Dn {
    /// The empty DN (root of the directory tree).
    pub const fn root() -> Self {
        Self { rdns: Vec::new() }
    }

    /// Returns `true` if this is the empty DN.
    pub fn is_root(&self) -> bool {
        self.rdns.is_empty()
    }

    /// Build a DN from components ordered leaf first.
    pub fn from_rdns(rdns: Vec<Rdn>) -> Self {
        Self { rdns }
    }

    /// Parse an RFC 4514 string such as `cn=acme,cn=Tenants,dc=example`.
    pub fn parse(s: &str) -> TypeResult<Self> {
        parse_dn(s)
    }

    /// The DN of a direct child `attribute=value` of this DN.
    pub fn child(&self, attribute: &str, value: &str) -> TypeResult<Self> {
        let mut rdns = Vec::with_capacity(self.rdns.len() + 1);
        rdns.push(Rdn::new(attribute, value)?);
        rdns.extend(self.rdns.iter().cloned());
        Ok(Self { rdns })
    }

    /// The DN of a direct child `cn=<name>`; the name must be a valid
    /// canonical name.
    pub fn child_cn(&self, name: &str) -> TypeResult<Self> {
        validate_common_name(name)?;
        self.child(CN, name)
    }

    /// The parent DN, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.rdns.is_empty() {
            return None;
        }
        Some(Self {
            rdns: self.rdns[1..].to_vec(),
        })
    }

    /// The leaf component.
    pub fn rdn(&self) -> Option<&Rdn> {
        self.rdns.first()
    }

    /// The unescaped value of the leaf component.
    pub fn leaf_value(&self) -> Option<&str> {
        self.rdns.first().map(Rdn::value)
    }

    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    /// Number of components.
    pub fn depth(&self) -> usize {
        self.rdns.len()
    }

    /// Returns `true` if `self` lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &Dn) -> bool {
        if self.rdns.len() <= ancestor.rdns.len() {
            return false;
        }
        let offset = self.rdns.len() - ancestor.rdns.len();
        self.rdns[offset..]
            .iter()
            .zip(ancestor.rdns.iter())
            .all(|(a, b)| a == b)
    }

    /// Returns `true` if `self` is an immediate child of `parent`.
    pub fn is_child_of(&self, parent: &Dn) -> bool {
        self.rdns.len() == parent.rdns.len() + 1 && self.is_descendant_of(parent)
    }

    /// Case-folded, escaped form used for comparisons.
    pub fn normalized(&self) -> String {
        self.rdns
            .iter()
            .map(Rdn::normalized)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{rdn}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dn({self})")
    }
}

impl PartialEq for Dn {
    fn eq(&self, other: &Self) -> bool {
        self.rdns == other.rdns
    }
}

impl Eq for Dn {}

impl Hash for Dn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl PartialOrd for Dn {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dn {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized().cmp(&other.normalized())
    }
}

impl FromStr for Dn {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Dn {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Dn> for String {
    fn from(dn: Dn) -> Self {
        dn.to_string()
    }
}

/// Escape an RDN value per RFC 4514.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (i, ch) in value.chars().enumerate() {
        if ch == '\0' {
            out.push_str("\\00");
            continue;
        }
        let leading = i == 0 && (ch == ' ' || ch == '#');
        let trailing = i == last && ch == ' ';
        if SPECIAL_CHARS.contains(&ch) || leading || trailing {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn validate_attribute_type(attribute: &str) -> TypeResult<()> {
    let valid = !attribute.is_empty()
        && attribute
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(TypeError::InvalidDn {
            dn: attribute.to_string(),
            reason: format!("invalid attribute type {attribute:?}"),
        })
    }
}

/// Accumulates one RDN value while parsing, tracking which trailing spaces
/// were escaped so only unescaped padding is trimmed.
#[derive(Default)]
struct ValueBuf {
    text: String,
    pending: Vec<u8>,
    protected_len: usize,
}

impl ValueBuf {
    fn flush(&mut self, dn: &str) -> TypeResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let bytes = std::mem::take(&mut self.pending);
        let decoded = String::from_utf8(bytes).map_err(|_| invalid(dn, "hex escape is not UTF-8"))?;
        self.text.push_str(&decoded);
        self.protected_len = self.text.len();
        Ok(())
    }

    fn push_plain(&mut self, dn: &str, ch: char) -> TypeResult<()> {
        self.flush(dn)?;
        if self.text.is_empty() && ch == ' ' {
            return Ok(());
        }
        self.text.push(ch);
        Ok(())
    }

    fn push_escaped(&mut self, dn: &str, ch: char) -> TypeResult<()> {
        self.flush(dn)?;
        self.text.push(ch);
        self.protected_len = self.text.len();
        Ok(())
    }

    fn finish(mut self, dn: &str) -> TypeResult<String> {
        self.flush(dn)?;
        let keep = self.text.trim_end_matches(' ').len().max(self.protected_len);
        self.text.truncate(keep);
        Ok(self.text)
    }
}

fn invalid(dn: &str, reason: &str) -> TypeError {
    TypeError::InvalidDn {
        dn: dn.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_dn(s: &str) -> TypeResult<Dn> {
    let input = s.trim();
    if input.is_empty() {
        return Ok(Dn::root());
    }

    let mut rdns = Vec::new();
    let mut attribute = String::new();
    let mut value = ValueBuf::default();
    let mut in_value = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if !in_value {
                    return Err(invalid(s, "escape in attribute type"));
                }
                let next = chars.next().ok_or_else(|| invalid(s, "dangling escape"))?;
                if next.is_ascii_hexdigit() {
                    let lo = chars
                        .next()
                        .filter(char::is_ascii_hexdigit)
                        .ok_or_else(|| invalid(s, "truncated hex escape"))?;
                    let pair: String = [next, lo].iter().collect();
                    let byte = u8::from_str_radix(&pair, 16)
                        .map_err(|_| invalid(s, "malformed hex escape"))?;
                    value.pending.push(byte);
                } else if SPECIAL_CHARS.contains(&next) || next == ' ' || next == '#' {
                    value.push_escaped(s, next)?;
                } else {
                    return Err(invalid(s, "escape of a non-special character"));
                }
            }
            '=' if !in_value => in_value = true,
            '=' => return Err(invalid(s, "unescaped '=' in value")),
            '+' if in_value => return Err(invalid(s, "multi-valued RDNs are not supported")),
            ',' => {
                if !in_value {
                    return Err(invalid(s, "component without '='"));
                }
                let text = std::mem::take(&mut value).finish(s)?;
                rdns.push(Rdn::new(attribute.trim(), text)?);
                attribute.clear();
                in_value = false;
            }
            _ if in_value => value.push_plain(s, ch)?,
            _ => attribute.push(ch),
        }
    }

    if !in_value {
        return Err(invalid(s, "component without '='"));
    }
    let text = value.finish(s)?;
    rdns.push(Rdn::new(attribute.trim(), text)?);

    Ok(Dn { rdns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn base() -> Dn {
        Dn::parse("cn=Tenants,cn=IdentityManager,cn=Services,dc=example,dc=com").unwrap()
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parse_simple() {
        let dn = Dn::parse("cn=acme,dc=example,dc=com").unwrap();
        assert_eq!(dn.depth(), 3);
        assert_eq!(dn.leaf_value(), Some("acme"));
        assert_eq!(dn.rdn().unwrap().attribute(), "cn");
        assert_eq!(dn.to_string(), "cn=acme,dc=example,dc=com");
    }

    #[test]
    fn parse_tolerates_spaces_after_commas() {
        let dn = Dn::parse("cn=acme, dc=example , dc=com").unwrap();
        assert_eq!(dn, Dn::parse("cn=acme,dc=example,dc=com").unwrap());
    }

    #[test]
    fn parse_empty_is_root() {
        assert!(Dn::parse("").unwrap().is_root());
        assert!(Dn::parse("   ").unwrap().is_root());
    }

    #[test]
    fn parse_escaped_specials() {
        let dn = Dn::parse(r"cn=Acme\, Inc.,dc=com").unwrap();
        assert_eq!(dn.leaf_value(), Some("Acme, Inc."));
        let dn = Dn::parse(r"cn=a\=b,dc=com").unwrap();
        assert_eq!(dn.leaf_value(), Some("a=b"));
    }

    #[test]
    fn parse_hex_escapes() {
        let dn = Dn::parse(r"cn=a\2cb,dc=com").unwrap();
        assert_eq!(dn.leaf_value(), Some("a,b"));
        let dn = Dn::parse(r"cn=caf\c3\a9,dc=com").unwrap();
        assert_eq!(dn.leaf_value(), Some("café"));
    }

    #[test]
    fn parse_keeps_escaped_trailing_space() {
        let dn = Dn::parse(r"cn=pad\ ,dc=com").unwrap();
        assert_eq!(dn.leaf_value(), Some("pad "));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(Dn::parse("acme").is_err());
        assert!(Dn::parse("cn=a,dc").is_err());
        assert!(Dn::parse("cn=a=b").is_err());
        assert!(Dn::parse("cn=a+sn=b").is_err());
        assert!(Dn::parse(r"cn=a\").is_err());
        assert!(Dn::parse(r"cn=a\zz").is_err());
        assert!(Dn::parse("c n=a").is_err());
    }

    // -----------------------------------------------------------------------
    // Construction and navigation
    // -----------------------------------------------------------------------

    #[test]
    fn child_and_parent() {
        let tenants = base();
        let acme = tenants.child_cn("acme").unwrap();
        assert_eq!(acme.depth(), tenants.depth() + 1);
        assert_eq!(acme.parent().unwrap(), tenants);
        assert!(acme.is_child_of(&tenants));
        assert!(acme.is_descendant_of(&tenants));
        assert!(!tenants.is_descendant_of(&acme));
        assert!(!acme.is_descendant_of(&acme));
    }

    #[test]
    fn child_cn_escapes_on_display() {
        let dn = base().child_cn("a,b=c").unwrap();
        assert!(dn.to_string().starts_with(r"cn=a\,b\=c,"));
        assert_eq!(Dn::parse(&dn.to_string()).unwrap(), dn);
    }

    #[test]
    fn child_cn_rejects_invalid_names() {
        assert!(base().child_cn("").is_err());
        assert!(base().child_cn("bad\nname").is_err());
    }

    #[test]
    fn grandchild_is_not_child() {
        let tenants = base();
        let deep = tenants.child_cn("acme").unwrap().child_cn("x").unwrap();
        assert!(deep.is_descendant_of(&tenants));
        assert!(!deep.is_child_of(&tenants));
    }

    #[test]
    fn root_has_no_parent() {
        assert!(Dn::root().parent().is_none());
        assert!(Dn::root().leaf_value().is_none());
    }

    // -----------------------------------------------------------------------
    // Comparison
    // -----------------------------------------------------------------------

    #[test]
    fn equality_is_case_insensitive() {
        let a = Dn::parse("CN=Acme,DC=Example").unwrap();
        let b = Dn::parse("cn=acme,dc=example").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.normalized(), b.normalized());

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn display_preserves_spelling() {
        let dn = Dn::parse("CN=Acme,DC=Example").unwrap();
        assert_eq!(dn.to_string(), "CN=Acme,DC=Example");
    }

    #[test]
    fn serde_roundtrip() {
        let dn = base().child_cn("a,b").unwrap();
        let json = serde_json::to_string(&dn).unwrap();
        let parsed: Dn = serde_json::from_str(&json).unwrap();
        assert_eq!(dn, parsed);
    }

    // -----------------------------------------------------------------------
    // Escaping
    // -----------------------------------------------------------------------

    #[test]
    fn escape_leading_and_trailing() {
        assert_eq!(escape_value("#x"), r"\#x");
        assert_eq!(escape_value(" x "), r"\ x\ ");
        assert_eq!(escape_value("plain"), "plain");
        assert_eq!(escape_value("a\0b"), r"a\00b");
    }

    proptest! {
        #[test]
        fn display_parse_roundtrip(value in "[a-zA-Z0-9 ,=+<>;#\"\\\\.-]{1,24}") {
            let dn = Dn::root().child("cn", &value).unwrap().child("dc", "com").unwrap();
            let parsed = Dn::parse(&dn.to_string()).unwrap();
            prop_assert_eq!(parsed.leaf_value(), Some(value.as_str()));
        }
    }
}
