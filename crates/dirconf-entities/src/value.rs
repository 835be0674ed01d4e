//! Enumerated attribute values stored as their upper-case names.

/// Declare an enum stored as one of a fixed set of names. Parsing ignores
/// ASCII case and surrounding whitespace.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = dirconf_mapper::CodecError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| {
                        dirconf_mapper::CodecError::new(format!(
                            "unknown {} {s:?}",
                            stringify!($name)
                        ))
                    })
            }
        }

        impl dirconf_mapper::ScalarValue for $name {
            fn encode_item(&self) -> Vec<u8> {
                self.as_str().as_bytes().to_vec()
            }

            fn decode_item(item: &[u8]) -> dirconf_mapper::CodecResult<Self> {
                <String as dirconf_mapper::ScalarValue>::decode_item(item)?.parse()
            }
        }

        impl dirconf_mapper::AttributeValue for $name {
            fn encode(&self) -> dirconf_types::RawValue {
                dirconf_types::RawValue::single(
                    <$name as dirconf_mapper::ScalarValue>::encode_item(self),
                )
            }

            fn decode(raw: &dirconf_types::RawValue) -> dirconf_mapper::CodecResult<Self> {
                <String as dirconf_mapper::AttributeValue>::decode(raw)?.parse()
            }
        }
    };
}

pub(crate) use string_enum;

#[cfg(test)]
mod tests {
    use dirconf_mapper::{AttributeValue, ScalarValue};
    use dirconf_types::RawValue;

    string_enum! {
        /// Test enum.
        pub enum Shade {
            Light => "LIGHT",
            Dark => "DARK_SHADE",
        }
    }

    #[test]
    fn names_roundtrip() {
        for shade in Shade::ALL {
            assert_eq!(shade.as_str().parse::<Shade>().unwrap(), *shade);
            assert_eq!(Shade::decode(&shade.encode()).unwrap(), *shade);
        }
        assert_eq!(Shade::Dark.to_string(), "DARK_SHADE");
    }

    #[test]
    fn parse_ignores_case() {
        assert_eq!(" dark_shade ".parse::<Shade>().unwrap(), Shade::Dark);
        assert_eq!(Shade::decode_item(b"light").unwrap(), Shade::Light);
    }

    #[test]
    fn unknown_and_missing_values_fail() {
        assert!("DIM".parse::<Shade>().is_err());
        assert!(Shade::decode(&RawValue::empty()).is_err());
        assert_eq!(Option::<Shade>::decode(&RawValue::empty()).unwrap(), None);
    }
}
