//! Weather provider client for Stratus.
//!
//! Issues the single outbound timeline request behind a cache miss and
//! classifies provider failures.

mod rules;
mod visual_crossing;

pub use rules::UnknownCityRule;
pub use visual_crossing::{ProviderConfig, VisualCrossingClient};
