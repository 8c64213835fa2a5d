//! Attribute values in the store's wire format
//!
//! `AttributeValue` is a tagged union; on the wire each value is a single-key
//! object such as `{"S": "hello"}` or `{"N": "42"}`. Numbers are always
//! string-encoded to preserve precision.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ScalarKind;

/// A full item or key: attribute name to value
pub type Item = HashMap<String, AttributeValue>;

/// Store attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String value
    #[serde(rename = "S")]
    S(String),
    /// Number value (string-encoded)
    #[serde(rename = "N")]
    N(String),
    /// Binary value (base64 in JSON)
    #[serde(rename = "B")]
    B(#[serde(with = "base64_bytes")] Vec<u8>),
    /// String set
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    /// Number set (string-encoded)
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    /// Boolean value
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Null marker
    #[serde(rename = "NULL")]
    Null(bool),
    /// List of values
    #[serde(rename = "L")]
    L(Vec<AttributeValue>),
    /// Map of values
    #[serde(rename = "M")]
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Returns the string value if this is an `S` variant
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the raw number string if this is an `N` variant
    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `Bool` variant
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string set if this is an `Ss` variant
    pub fn as_ss(&self) -> Option<&[String]> {
        match self {
            Self::Ss(values) => Some(values),
            _ => None,
        }
    }

    /// Parse an `N` value as an exact decimal
    pub fn as_decimal(&self) -> Option<Decimal> {
        let n = self.as_n()?;
        n.parse::<Decimal>()
            .ok()
            .or_else(|| Decimal::from_scientific(n).ok())
    }

    /// Scalar kind of this value, if it is one of the resolver's categories
    pub fn kind(&self) -> Option<ScalarKind> {
        match self {
            Self::S(_) => Some(ScalarKind::String),
            Self::N(_) => Some(ScalarKind::Number),
            Self::B(_) => Some(ScalarKind::Binary),
            Self::Ss(_) => Some(ScalarKind::StringSet),
            Self::Bool(_) => Some(ScalarKind::Boolean),
            Self::Ns(_) | Self::Null(_) | Self::L(_) | Self::M(_) => None,
        }
    }

    /// Decode back into a plain JSON value.
    ///
    /// Numbers that do not parse as JSON numbers are returned as strings;
    /// binary values come back base64-encoded.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Self::S(s) => Value::String(s.clone()),
            Self::N(n) => number_to_json(n),
            Self::B(bytes) => Value::String(base64_bytes::encode(bytes)),
            Self::Ss(values) => Value::Array(values.iter().cloned().map(Value::String).collect()),
            Self::Ns(values) => Value::Array(values.iter().map(|n| number_to_json(n)).collect()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Null(_) => Value::Null,
            Self::L(values) => Value::Array(values.iter().map(AttributeValue::to_json).collect()),
            Self::M(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn number_to_json(n: &str) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Number>(n) {
        Ok(number) => serde_json::Value::Number(number),
        Err(_) => serde_json::Value::String(n.to_string()),
    }
}

mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn encode(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    pub fn serialize<S, T>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        serializer.serialize_str(&encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
