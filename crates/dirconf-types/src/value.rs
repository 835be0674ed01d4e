use serde::{Deserialize, Serialize};

/// The multi-valued raw representation attached to one (DN, attribute) pair.
///
/// Items are opaque byte strings kept in the order they were supplied or
/// returned by the store. An empty value means "no value"; there is no
/// separate sentinel for absence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawValue(#[serde(with = "items_serde")] Vec<Vec<u8>>);

impl RawValue {
    /// The absent value.
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// A single-item value.
    pub fn single(item: impl Into<Vec<u8>>) -> Self {
        Self(vec![item.into()])
    }

    pub fn from_items(items: Vec<Vec<u8>>) -> Self {
        Self(items)
    }

    /// One UTF-8 item per string, in iteration order.
    pub fn from_strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            values
                .into_iter()
                .map(|s| s.as_ref().as_bytes().to_vec())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn items(&self) -> &[Vec<u8>] {
        &self.0
    }

    pub fn into_items(self) -> Vec<Vec<u8>> {
        self.0
    }

    pub fn first(&self) -> Option<&[u8]> {
        self.0.first().map(Vec::as_slice)
    }

    /// Returns `true` if any item equals `value`, ignoring ASCII case.
    pub fn contains_ignore_case(&self, value: &str) -> bool {
        self.0
            .iter()
            .any(|item| item.eq_ignore_ascii_case(value.as_bytes()))
    }

    /// Remove every item equal to `value` (ASCII case-insensitive).
    /// Returns the number of items removed.
    pub fn remove_ignore_case(&mut self, value: &[u8]) -> usize {
        let before = self.0.len();
        self.0.retain(|item| !item.eq_ignore_ascii_case(value));
        before - self.0.len()
    }

    /// Append an item.
    pub fn push(&mut self, item: impl Into<Vec<u8>>) {
        self.0.push(item.into());
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::single(s.as_bytes().to_vec())
    }
}

/// Items serialize as strings: printable UTF-8 verbatim, anything else (and
/// text that itself starts with the prefix) as `hex:<digits>`.
mod items_serde {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    const HEX_PREFIX: &str = "hex:";

    fn encode(item: &[u8]) -> String {
        match std::str::from_utf8(item) {
            Ok(text) if !text.starts_with(HEX_PREFIX) && !text.chars().any(char::is_control) => {
                text.to_string()
            }
            _ => format!("{HEX_PREFIX}{}", hex::encode(item)),
        }
    }

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(items.iter().map(|item| encode(item)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<u8>>, D::Error> {
        let encoded = Vec::<String>::deserialize(d)?;
        encoded
            .into_iter()
            .map(|s| match s.strip_prefix(HEX_PREFIX) {
                Some(digits) => hex::decode(digits).map_err(D::Error::custom),
                None => Ok(s.into_bytes()),
            })
            .collect()
    }
}
