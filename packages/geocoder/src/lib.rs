#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for exposure map sample addresses.
//!
//! Converts a free-text street address to latitude/longitude through the
//! [`Geocoder`] trait. The only production provider is Nominatim
//! (`OpenStreetMap`), configured from the TOML embedded by
//! [`service_registry`].
//!
//! Lookups are neither cached nor retried. A failed lookup is reported once
//! and the caller records the address as unresolved.

pub mod nominatim;
pub mod service_registry;

use thiserror::Error;

use crate::nominatim::NominatimGeocoder;
use crate::service_registry::{GeocodingService, ProviderConfig};

/// A geocoding result.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The matched/canonical address returned by the provider.
    pub matched_address: Option<String>,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Resolves a single address to coordinates.
#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    /// Short provider name for log messages.
    fn name(&self) -> &str;

    /// Geocodes one free-text address.
    ///
    /// Returns `Ok(None)` when the provider answered but found no match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn geocode(&self, address: &str) -> Result<Option<GeocodedAddress>, GeocodeError>;
}

/// Builds the geocoder described by `service`, optionally pointing it at a
/// different endpoint (e.g. a self-hosted Nominatim).
///
/// # Errors
///
/// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
pub fn build_geocoder(
    service: &GeocodingService,
    base_url_override: Option<&str>,
) -> Result<Box<dyn Geocoder>, GeocodeError> {
    match &service.provider {
        ProviderConfig::Nominatim {
            base_url,
            user_agent,
            rate_limit_ms,
        } => {
            let base_url = base_url_override.unwrap_or(base_url);
            log::info!("Using {} at {base_url}", service.name);
            Ok(Box::new(NominatimGeocoder::new(
                base_url,
                user_agent,
                std::time::Duration::from_millis(*rate_limit_ms),
            )?))
        }
    }
}
