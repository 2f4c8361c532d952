//! Open-Meteo geocoding client: place name -> coordinates.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{Coordinates, LocationResolver};
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://geocoding-api.open-meteo.com";

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: reqwest::Client,
    base_url: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    // the API drops the field entirely when nothing matches
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    name: String,
    #[serde(default)]
    country: Option<String>,
    latitude: f64,
    longitude: f64,
}

impl GeocodingClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            language: language.into(),
        }
    }
}

#[async_trait]
impl LocationResolver for GeocodingClient {
    async fn resolve_location(&self, name: &str) -> Result<Coordinates> {
        let fail = |message: String| Error::Resolution {
            location: name.to_string(),
            message,
        };

        let url = format!("{}/v1/search", self.base_url);
        debug!("Resolving {} via {}", name, url);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("name", name),
                ("count", "1"),
                ("language", self.language.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| fail(format!("HTTP error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(fail(format!("status code: {}", status.as_u16())));
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| fail(format!("JSON parse error: {e}")))?;

        let place = body
            .results
            .into_iter()
            .next()
            .ok_or_else(|| fail("no matching place".to_string()))?;

        debug!(
            "{} resolved to {} ({}) at {:.4},{:.4}",
            name,
            place.name,
            place.country.as_deref().unwrap_or("?"),
            place.latitude,
            place.longitude
        );

        Ok(Coordinates {
            latitude: place.latitude,
            longitude: place.longitude,
        })
    }
}
