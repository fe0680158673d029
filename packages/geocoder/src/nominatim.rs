//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance allows at most **1 request per second** and requires
//! an identifying `User-Agent`. [`NominatimGeocoder`] enforces the spacing
//! between consecutive requests itself.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::{GeocodeError, GeocodedAddress, Geocoder};

/// Free-form Nominatim search client.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimGeocoder {
    /// Creates a client for `base_url` (the `/search` endpoint).
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        user_agent: &str,
        min_interval: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            min_interval,
            last_request: Mutex::new(None),
        })
    }

    async fn wait_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait::async_trait]
impl Geocoder for NominatimGeocoder {
    fn name(&self) -> &str {
        "nominatim"
    }

    async fn geocode(&self, address: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        self.wait_turn().await;

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("q", address), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.error_for_status()?.json().await?;
        parse_response(&body)
    }
}

/// Parses Nominatim JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = first["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = first["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    let display_name = first["display_name"].as_str().map(String::from);

    Ok(Some(GeocodedAddress {
        latitude: lat,
        longitude: lon,
        matched_address: display_name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nominatim_result() {
        let body = serde_json::json!([{
            "lat": "40.4406",
            "lon": "-79.9959",
            "display_name": "Grant Street, Pittsburgh, PA, USA"
        }]);
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.latitude - 40.4406).abs() < 1e-4);
        assert!((result.longitude - -79.9959).abs() < 1e-4);
        assert_eq!(
            result.matched_address.as_deref(),
            Some("Grant Street, Pittsburgh, PA, USA")
        );
    }

    #[test]
    fn parses_nominatim_empty() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn rejects_non_array_body() {
        let body = serde_json::json!({ "error": "Unable to geocode" });
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_missing_coordinates() {
        let body = serde_json::json!([{ "lat": "40.1" }]);
        assert!(matches!(
            parse_response(&body),
            Err(GeocodeError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn spaces_consecutive_requests() {
        let geocoder =
            NominatimGeocoder::new("http://localhost/search", "test", Duration::from_millis(50))
                .unwrap();
        let start = Instant::now();
        geocoder.wait_turn().await;
        geocoder.wait_turn().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
