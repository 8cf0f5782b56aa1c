//! # Stratus Core
//!
//! Core types, errors, and traits for the Stratus cache-aside weather service.
//!
//! This crate provides the building blocks shared by every other Stratus crate:
//!
//! - **Types**: [`CacheKey`] and the opaque [`WeatherPayload`]
//! - **Errors**: [`StratusError`], covering cache, provider and configuration failures
//! - **Constants**: cache key prefix, TTL, provider defaults
//! - **Traits**: [`CacheStore`] and [`WeatherProvider`], the two seams of the service
//!
//! ## Example
//!
//! ```rust
//! use stratus_core::{CacheKey, WeatherPayload};
//!
//! let key = CacheKey::for_city("Paris");
//! assert_eq!(key.as_str(), "weather:Paris");
//!
//! let payload = WeatherPayload::from_json(r#"{"address":"Paris"}"#.to_string()).unwrap();
//! assert_eq!(payload.as_str(), r#"{"address":"Paris"}"#);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{Result, StratusError};
pub use traits::*;
pub use types::*;
