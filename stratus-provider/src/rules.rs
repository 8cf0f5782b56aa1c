//! Provider status classification.

use reqwest::StatusCode;

use stratus_core::error::StratusError;

/// Maps a non-success provider status to an error.
///
/// Visual Crossing answers `400 Bad Request` when it cannot geocode the
/// location, so a 400 is read as "unknown city". This is provider-specific:
/// a 400 could also mean a malformed query (bad key format, bad parameters)
/// and the body is not inspected to tell the two apart.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnknownCityRule;

impl UnknownCityRule {
    /// Status the provider uses for unresolvable locations.
    pub const STATUS: StatusCode = StatusCode::BAD_REQUEST;

    /// Returns true if `status` is treated as "unknown city".
    pub fn matches(status: StatusCode) -> bool {
        status == Self::STATUS
    }

    /// Classifies a failed response for `city`.
    pub fn classify(status: StatusCode, city: &str, body: String) -> StratusError {
        if Self::matches(status) {
            StratusError::UnknownCity(city.to_string())
        } else {
            StratusError::ProviderStatus {
                status: status.as_u16(),
                body,
            }
        }
    }
}
