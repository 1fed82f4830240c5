//! Seeds serialize as strings so JavaScript clients never lose precision
//! past 2^53; deserialization accepts either form.

use std::fmt;

use serde::de::{Error, Visitor};
use serde::{Deserializer, Serializer};

pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(value)
}

struct U64OrString;

impl Visitor<'_> for U64OrString {
    type Value = u64;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a u64 or a decimal string")
    }

    fn visit_u64<E: Error>(self, value: u64) -> Result<u64, E> {
        Ok(value)
    }

    fn visit_str<E: Error>(self, raw: &str) -> Result<u64, E> {
        raw.parse::<u64>().map_err(E::custom)
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(U64OrString)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Wrapper {
        #[serde(with = "super")]
        seed: u64,
    }

    #[test]
    fn round_trips_through_a_string() {
        let encoded = serde_json::to_string(&Wrapper { seed: u64::MAX }).expect("encode");
        assert_eq!(encoded, format!(r#"{{"seed":"{}"}}"#, u64::MAX));
        let decoded: Wrapper = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded.seed, u64::MAX);
    }

    #[test]
    fn accepts_a_bare_number() {
        let parsed: Wrapper = serde_json::from_str(r#"{"seed":1337}"#).expect("numeric seed");
        assert_eq!(parsed.seed, 1337);
    }

    #[test]
    fn rejects_a_non_numeric_string() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"seed":"abc"}"#).is_err());
    }
}
