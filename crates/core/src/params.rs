//! Operation parameter map.
//!
//! The host hands each operation a flat map of named option values. Options
//! are deserialized from it into a typed schema per operation, so missing
//! keys take the schema's defaults and wrongly-typed values are reported as
//! parameter errors.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ExcelError, ExcelResult};
use crate::payload::json_type;

/// Named option values for one operation invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder form of [`Params::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Deserialize the whole map into an options schema.
    pub fn parse<T: DeserializeOwned>(&self) -> ExcelResult<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| ExcelError::invalid(format!("Invalid parameters: {e}")))
    }

    /// Overlay `other` on top of `self`; keys in `other` win.
    pub fn merge(&mut self, other: Params) {
        self.0.extend(other.0);
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Deserialize a text option that may arrive as a number or boolean.
///
/// Hosts hand over scalars as they were typed, so a password `1234` or a
/// worksheet named `2024` can reach a text option as a JSON number. Null
/// reads as the empty string.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    opt_string_or_number(deserializer).map(Option::unwrap_or_default)
}

/// [`string_or_number`] for optional text, where null means unset.
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(D::Error::custom(format!(
            "invalid type: {}, expected a string",
            json_type(&other)
        ))),
    }
}
