//! Geocoding pass over freshly parsed samples.

use std::sync::Arc;

use exposure_map_geocoder::Geocoder;
use exposure_map_sample_models::{Coordinates, Sample};

use crate::progress::ProgressCallback;

/// Outcome counts of a geocoding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeocodeSummary {
    /// Rows that received coordinates.
    pub resolved: usize,
    /// Rows the provider answered for but could not match.
    pub unmatched: usize,
    /// Rows whose lookup failed with an error.
    pub failed: usize,
}

/// Resolves coordinates for every sample, one request per row in file
/// order. Rows sharing an address are looked up again.
///
/// Rows with an empty address are skipped. Unmatched addresses and provider
/// errors leave the coordinates unset; nothing is retried.
pub async fn geocode_samples(
    geocoder: &dyn Geocoder,
    samples: &mut [Sample],
    progress: &Arc<dyn ProgressCallback>,
) -> GeocodeSummary {
    let mut summary = GeocodeSummary::default();

    log::info!(
        "Geocoding {} addresses via {}...",
        samples.len(),
        geocoder.name()
    );
    progress.set_total(samples.len() as u64);

    for sample in samples.iter_mut() {
        progress.set_message(format!("Geocoding {}", sample.home_id));

        if sample.address.is_empty() {
            log::warn!("Home {}: no address, skipping geocode", sample.home_id);
            summary.unmatched += 1;
            progress.inc(1);
            continue;
        }

        match geocoder.geocode(&sample.address).await {
            Ok(Some(geocoded)) => {
                log::debug!(
                    "Home {}: '{}' -> ({}, {})",
                    sample.home_id,
                    sample.address,
                    geocoded.latitude,
                    geocoded.longitude
                );
                sample.coordinates = Some(Coordinates::new(geocoded.latitude, geocoded.longitude));
                summary.resolved += 1;
            }
            Ok(None) => {
                log::warn!("Home {}: no match for '{}'", sample.home_id, sample.address);
                summary.unmatched += 1;
            }
            Err(e) => {
                log::warn!(
                    "Home {}: geocoding '{}' failed: {e}",
                    sample.home_id,
                    sample.address
                );
                summary.failed += 1;
            }
        }

        progress.inc(1);
    }

    progress.finish(format!(
        "Geocoded {}/{} addresses",
        summary.resolved,
        samples.len()
    ));

    summary
}
