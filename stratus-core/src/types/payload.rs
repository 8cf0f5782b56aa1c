//! Opaque weather payload.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{Result, StratusError};

/// A provider response body, kept exactly as received.
///
/// The payload is checked to be well-formed JSON and is otherwise never
/// parsed, so the bytes written to the cache and sent to clients are the bytes
/// the provider returned.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherPayload(Box<RawValue>);

impl WeatherPayload {
    /// Wraps a JSON document.
    ///
    /// # Errors
    /// Returns [`StratusError::InvalidPayload`] if `json` is not valid JSON.
    pub fn from_json(json: String) -> Result<Self> {
        RawValue::from_string(json)
            .map(Self)
            .map_err(|e| StratusError::InvalidPayload(e.to_string()))
    }

    /// Returns the document text.
    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    /// Consumes the payload, returning the document text.
    pub fn into_string(self) -> String {
        let raw: Box<str> = self.0.into();
        raw.into()
    }

    /// Length of the document in bytes.
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    /// Returns true if the document is empty (never the case for valid JSON).
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl PartialEq for WeatherPayload {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for WeatherPayload {}

impl fmt::Display for WeatherPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
