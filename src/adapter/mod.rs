//! Remote lookups feeding the refresh pipeline.
//!
//! Two stages, each failing independently: a place name is resolved to
//! coordinates, then the coordinates are turned into current conditions.

pub mod geocoding;
pub mod open_meteo;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

pub use geocoding::GeocodingClient;
pub use open_meteo::OpenMeteoClient;

/// Stage 1 result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Stage 2 result. `time` is still the remote text and is parsed by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub time: String,
    pub temperature: f64,
}

#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve_location(&self, name: &str) -> Result<Coordinates>;
}

#[async_trait]
pub trait ConditionsSource: Send + Sync {
    async fn fetch_current(&self, coords: Coordinates) -> Result<CurrentConditions>;
}

/// Shared outbound client; `timeout` bounds each remote call.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("weatherpulse/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(2)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::Router;

    /// Serve `app` on an ephemeral local port and return its base URL.
    pub async fn spawn_remote(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
