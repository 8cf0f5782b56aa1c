//! # Stratus Weather Lookup
//!
//! The cache-aside lookup behind `GET /weather/{city}`.
//!
//! This crate provides:
//!
//! - **Lookup**: check the cache, on a miss fetch from the provider and store
//!   the body for 12 hours
//! - **Fail-open caching**: cache errors and corrupt entries fall back to the provider
//! - **Single-flight** (opt-in): concurrent misses for one key share one fetch
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stratus_weather::WeatherService;
//!
//! let service = WeatherService::new(Arc::new(provider))
//!     .with_cache(Arc::new(store))
//!     .with_coalescing(true);
//!
//! let lookup = service.lookup("Paris").await?;
//! println!("{} ({:?})", lookup.payload, lookup.source);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod flight;
pub mod service;

pub use flight::FlightGroup;
pub use service::{Lookup, LookupSource, WeatherService};
