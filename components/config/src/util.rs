use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use std::fmt;
use std::str::FromStr;

pub fn parse<T: FromStr>(s: &str, default: T) -> T {
    s.parse().unwrap_or(default)
}

/// Parses either a plain byte count or a size such as `100 KiB`
pub fn try_parse_bytes(s: &str) -> Option<u64> {
    let s = s.trim();

    match s.parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => bytesize::ByteSize::from_str(s).ok().map(|b| b.0),
    }
}

pub fn parse_bytes(s: &str, default: u64) -> u64 {
    try_parse_bytes(s).unwrap_or(default)
}

/// Byte sizes, written as plain integers and read as integers or `"64 KiB"` strings
pub mod bytes {
    use super::*;

    use bytesize::ByteSize;

    pub fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: TryInto<u64> + Copy,
    {
        match (*value).try_into() {
            Ok(value) => serializer.serialize_u64(value),
            Err(_) => Err(serde::ser::Error::custom("Could not convert field to u64")),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        T: TryFrom<u64>,
        D: Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = u64;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("Unsigned 64-bit integer or byte size string such as `64 KiB`")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<u64, E> {
                Ok(value)
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<u64, E> {
                if value < 0 {
                    Err(E::custom("Negative integer"))
                } else {
                    Ok(value as u64)
                }
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<u64, E> {
                match ByteSize::from_str(value) {
                    Ok(value) => Ok(value.0),
                    Err(e) => Err(E::custom(e)),
                }
            }
        }

        deserializer.deserialize_any(Visitor).and_then(|bytes| {
            bytes.try_into().map_err(|_| {
                de::Error::custom(format!("{} cannot fit into {}", bytes, std::any::type_name::<T>()))
            })
        })
    }
}
