//! Thread slots
//!
//! The capturing tool stores child-process profiles inside the parent's
//! `threads` array as a JSON *string*. A slot is therefore either a thread
//! record or an opaque serialized document, and the two are kept apart here
//! so that decoding only happens where a caller actually needs the child.

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Entry of a profile's `threads` array
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ThreadSlot<T> {
    /// Serialized subprocess profile
    Embedded(EmbeddedProfile),
    /// Thread record of this process
    Record(T),
}

impl<T> ThreadSlot<T> {
    /// Check if slot holds an embedded subprocess profile
    #[inline]
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }

    /// Get thread record, if this slot holds one
    #[inline]
    #[must_use]
    pub fn as_record(&self) -> Option<&T> {
        match self {
            Self::Record(record) => Some(record),
            Self::Embedded(_) => None,
        }
    }

    /// Get embedded profile, if this slot holds one
    #[inline]
    #[must_use]
    pub fn as_embedded(&self) -> Option<&EmbeddedProfile> {
        match self {
            Self::Embedded(embedded) => Some(embedded),
            Self::Record(_) => None,
        }
    }
}

impl<T: DeserializeOwned> ThreadSlot<T> {
    /// Classify one raw `threads` entry
    ///
    /// Strings are embedded profiles; anything else must be a thread record.
    ///
    /// # Errors
    /// Returns the record's own deserialization error, so the failing field
    /// is named
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::String(text) => Ok(Self::Embedded(EmbeddedProfile(text))),
            record => T::deserialize(record).map(Self::Record),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ThreadSlot<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::from_value(Value::deserialize(deserializer)?).map_err(de::Error::custom)
    }
}

/// Deserialize a `threads` array, prefixing errors with the slot index
pub(crate) fn deserialize_slots<'de, D, T>(deserializer: D) -> Result<Vec<ThreadSlot<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Vec::<Value>::deserialize(deserializer)?
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            ThreadSlot::from_value(raw)
                .map_err(|e| de::Error::custom(format!("thread slot {index}: {e}")))
        })
        .collect()
}

/// Serialized subprocess profile, kept as text until decoded
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddedProfile(String);

impl EmbeddedProfile {
    /// Wrap serialized profile text
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Serialize a document into an embedded slot payload
    ///
    /// # Errors
    /// Returns error if the document cannot be serialized
    pub fn encode<D: Serialize>(doc: &D) -> Result<Self, serde_json::Error> {
        serde_json::to_string(doc).map(Self)
    }

    /// Decode the payload into a typed document
    ///
    /// # Errors
    /// Returns error if the text is not valid JSON or does not match `D`
    pub fn decode<D: DeserializeOwned>(&self) -> Result<D, serde_json::Error> {
        serde_json::from_str(&self.0)
    }

    /// Raw serialized text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the raw serialized text
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}
