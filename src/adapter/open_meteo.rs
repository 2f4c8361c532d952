//! Open-Meteo forecast client: coordinates -> current temperature.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{ConditionsSource, Coordinates, CurrentConditions};
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Current {
    time: String,
    temperature_2m: f64,
}

impl OpenMeteoClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ConditionsSource for OpenMeteoClient {
    async fn fetch_current(&self, coords: Coordinates) -> Result<CurrentConditions> {
        let url = format!("{}/v1/forecast", self.base_url);
        debug!(
            "Fetching current conditions at {:.4},{:.4} via {}",
            coords.latitude, coords.longitude, url
        );

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("current", "temperature_2m".to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("HTTP error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("status code: {}", status.as_u16())));
        }

        let body: ForecastResponse = resp
            .json()
            .await
            .map_err(|e| Error::Fetch(format!("JSON parse error: {e}")))?;

        Ok(CurrentConditions {
            time: body.current.time,
            temperature: body.current.temperature_2m,
        })
    }
}
