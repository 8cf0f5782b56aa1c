//! Domain types for Stratus.
//!
//! - [`CacheKey`]: store key derived from the requested city
//! - [`WeatherPayload`]: opaque provider document, kept byte-for-byte

mod key;
mod payload;

pub use key::*;
pub use payload::*;
