//! Conversions between typed values and [`RawValue`].
//!
//! Scalars occupy a single item and multi-valued types one item per element,
//! in caller order. Absence is the empty value: `Option::None` and empty
//! collections encode to no items, never to an item holding an empty string.

use std::collections::BTreeMap;

use dirconf_types::{Certificate, Dn, PrivateKey, RawValue};

use crate::error::{CodecError, CodecResult};

/// A value that maps to and from a whole [`RawValue`].
pub trait AttributeValue: Sized {
    fn encode(&self) -> RawValue;

    /// Decode a stored value. Fails on type mismatch or wrong cardinality.
    fn decode(raw: &RawValue) -> CodecResult<Self>;
}

/// A value stored as exactly one item.
pub trait ScalarValue: Sized {
    fn encode_item(&self) -> Vec<u8>;

    fn decode_item(item: &[u8]) -> CodecResult<Self>;
}

fn decode_single<T: ScalarValue>(raw: &RawValue) -> CodecResult<T> {
    match raw.items() {
        [item] => T::decode_item(item),
        [] => Err(CodecError::new("missing value")),
        items => Err(CodecError::new(format!(
            "expected a single value, found {}",
            items.len()
        ))),
    }
}

fn utf8(item: &[u8]) -> CodecResult<&str> {
    std::str::from_utf8(item).map_err(|_| CodecError::new("value is not valid UTF-8"))
}

impl ScalarValue for String {
    fn encode_item(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn decode_item(item: &[u8]) -> CodecResult<Self> {
        utf8(item).map(str::to_string)
    }
}

impl ScalarValue for bool {
    fn encode_item(&self) -> Vec<u8> {
        if *self { b"TRUE".to_vec() } else { b"FALSE".to_vec() }
    }

    fn decode_item(item: &[u8]) -> CodecResult<Self> {
        let text = utf8(item)?;
        if text.eq_ignore_ascii_case("TRUE") {
            Ok(true)
        } else if text.eq_ignore_ascii_case("FALSE") {
            Ok(false)
        } else {
            Err(CodecError::new(format!("expected TRUE or FALSE, found {text:?}")))
        }
    }
}

macro_rules! integer_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl ScalarValue for $t {
                fn encode_item(&self) -> Vec<u8> {
                    self.to_string().into_bytes()
                }

                fn decode_item(item: &[u8]) -> CodecResult<Self> {
                    let text = utf8(item)?;
                    text.trim().parse::<$t>().map_err(|e| {
                        CodecError::new(format!(
                            "{text:?} is not a valid {}: {e}",
                            stringify!($t)
                        ))
                    })
                }
            }
        )*
    };
}

integer_scalar!(i32, i64, u32);

impl ScalarValue for Certificate {
    fn encode_item(&self) -> Vec<u8> {
        self.der().to_vec()
    }

    fn decode_item(item: &[u8]) -> CodecResult<Self> {
        Certificate::from_der(item).map_err(|e| CodecError::new(e.to_string()))
    }
}

impl ScalarValue for PrivateKey {
    fn encode_item(&self) -> Vec<u8> {
        self.der().to_vec()
    }

    fn decode_item(item: &[u8]) -> CodecResult<Self> {
        PrivateKey::from_der(item).map_err(|e| CodecError::new(e.to_string()))
    }
}

impl ScalarValue for Dn {
    fn encode_item(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    fn decode_item(item: &[u8]) -> CodecResult<Self> {
        Dn::parse(utf8(item)?).map_err(|e| CodecError::new(e.to_string()))
    }
}

/// String maps are stored as one JSON object.
impl ScalarValue for BTreeMap<String, String> {
    fn encode_item(&self) -> Vec<u8> {
        let object: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::Value::Object(object).to_string().into_bytes()
    }

    fn decode_item(item: &[u8]) -> CodecResult<Self> {
        serde_json::from_slice(item)
            .map_err(|e| CodecError::new(format!("invalid JSON object: {e}")))
    }
}

macro_rules! single_valued {
    ($($t:ty),* $(,)?) => {
        $(
            impl AttributeValue for $t {
                fn encode(&self) -> RawValue {
                    RawValue::single(self.encode_item())
                }

                fn decode(raw: &RawValue) -> CodecResult<Self> {
                    decode_single(raw)
                }
            }
        )*
    };
}

single_valued!(
    String,
    bool,
    i32,
    i64,
    u32,
    Certificate,
    PrivateKey,
    Dn,
    BTreeMap<String, String>,
);

impl<T: ScalarValue> AttributeValue for Option<T> {
    fn encode(&self) -> RawValue {
        match self {
            Some(v) => RawValue::single(v.encode_item()),
            None => RawValue::empty(),
        }
    }

    fn decode(raw: &RawValue) -> CodecResult<Self> {
        if raw.is_empty() {
            return Ok(None);
        }
        decode_single(raw).map(Some)
    }
}

impl<T: ScalarValue> AttributeValue for Vec<T> {
    fn encode(&self) -> RawValue {
        RawValue::from_items(self.iter().map(ScalarValue::encode_item).collect())
    }

    fn decode(raw: &RawValue) -> CodecResult<Self> {
        raw.items().iter().map(|item| T::decode_item(item)).collect()
    }
}

impl AttributeValue for RawValue {
    fn encode(&self) -> RawValue {
        self.clone()
    }

    fn decode(raw: &RawValue) -> CodecResult<Self> {
        Ok(raw.clone())
    }
}
