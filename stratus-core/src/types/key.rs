//! Cache key derivation.

use std::fmt;

use crate::constants::CACHE_KEY_PREFIX;

/// Store key for one city's weather payload.
///
/// The city is used verbatim: case and whitespace are significant and special
/// characters are not escaped, so `"Paris"` and `"paris"` are different keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds the key `weather:{city}`.
    pub fn for_city(city: &str) -> Self {
        let mut key = String::with_capacity(CACHE_KEY_PREFIX.len() + city.len());
        key.push_str(CACHE_KEY_PREFIX);
        key.push_str(city);
        Self(key)
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the city part of the key.
    pub fn city(&self) -> &str {
        &self.0[CACHE_KEY_PREFIX.len()..]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
