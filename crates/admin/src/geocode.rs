//! Address geocoding via the OpenStreetMap Nominatim API.
//!
//! Nominatim's usage policy allows at most one request per second and
//! requires an identifying User-Agent; callers sleep [`RATE_LIMIT`]
//! between lookups.

use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use register_core::geo::Coordinates;

const SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
const USER_AGENT: &str = "register-admin/0.1 (group importer)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum pause between consecutive Nominatim requests.
pub const RATE_LIMIT: Duration = Duration::from_millis(1100);

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
}

pub struct Geocoder {
    client: reqwest::Client,
}

impl Geocoder {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build geocoder HTTP client")?;
        Ok(Self { client })
    }

    /// Look up coordinates for a free-form address. `Ok(None)` when
    /// Nominatim has no match.
    pub async fn geocode(&self, address: &str) -> anyhow::Result<Option<Coordinates>> {
        if address.trim().is_empty() {
            return Ok(None);
        }

        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .context("geocoding request failed")?
            .error_for_status()
            .context("geocoding request rejected")?;

        let results: Vec<SearchResult> = response
            .json()
            .await
            .context("invalid geocoding response")?;

        let Some(first) = results.first() else {
            return Ok(None);
        };
        let latitude: f64 = first.lat.parse().context("unparseable latitude")?;
        let longitude: f64 = first.lon.parse().context("unparseable longitude")?;
        Ok(Some(Coordinates {
            latitude,
            longitude,
        }))
    }
}
