//! Snapshot records.

use serde::{Deserialize, Serialize};

/// A single key/value pair as stored in a snapshot file.
///
/// Values are opaque bytes. In the JSON form the value is embedded as a
/// string; bytes that are not valid UTF-8 are replaced with U+FFFD when
/// written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Full key path, segments separated by `/`.
    pub key: String,
    /// Raw value.
    #[serde(with = "text_value")]
    pub value: Vec<u8>,
}

impl Record {
    /// Creates a record.
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns the value as text, replacing invalid UTF-8.
    pub fn value_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }
}

mod text_value {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        String::deserialize(deserializer).map(String::into_bytes)
    }
}
