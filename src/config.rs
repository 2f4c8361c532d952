//! Configuration loader: defaults, then an optional TOML file, then env vars.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::adapter::{geocoding, open_meteo};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Place name refreshed by the scheduler.
    pub location: String,
    pub refresh_interval_secs: u64,
    /// Upper bound for each outbound lookup.
    pub request_timeout_secs: u64,
    pub listen_addr: String,
    /// When set, readings are journaled to `<data_dir>/readings.log` and replayed on start.
    pub data_dir: Option<PathBuf>,
    pub geocoding_url: String,
    pub forecast_url: String,
    pub language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: "Moscow".to_string(),
            refresh_interval_secs: 10,
            request_timeout_secs: 10,
            listen_addr: "0.0.0.0:3000".to_string(),
            data_dir: None,
            geocoding_url: geocoding::DEFAULT_BASE_URL.to_string(),
            forecast_url: open_meteo::DEFAULT_BASE_URL.to_string(),
            language: "ru".to_string(),
        }
    }
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn journal_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("readings.log"))
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .map_err(|_| Error::Config(format!("listen_addr {:?} is not a socket address", self.listen_addr)))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("invalid config file: {e}")))
    }

    /// Apply `WEATHERPULSE_*` overrides from `lookup` (normally the process env).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("WEATHERPULSE_LOCATION") {
            self.location = v;
        }
        if let Some(v) = get("WEATHERPULSE_REFRESH_SECS") {
            self.refresh_interval_secs = parse_secs(&v, "WEATHERPULSE_REFRESH_SECS")?;
        }
        if let Some(v) = get("WEATHERPULSE_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_secs(&v, "WEATHERPULSE_TIMEOUT_SECS")?;
        }
        if let Some(v) = get("WEATHERPULSE_LISTEN_ADDR") {
            self.listen_addr = v;
        }
        if let Some(v) = get("WEATHERPULSE_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(v));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let mut issues: Vec<String> = Vec::new();

        if self.location.trim().is_empty() {
            issues.push("location must not be empty".into());
        }
        if self.refresh_interval_secs == 0 {
            issues.push("refresh_interval_secs must be > 0".into());
        }
        if self.request_timeout_secs == 0 {
            issues.push("request_timeout_secs must be > 0".into());
        }
        if self.listen_addr().is_err() {
            issues.push(format!("listen_addr {:?} is not a socket address", self.listen_addr));
        }
        for (name, url) in [("geocoding_url", &self.geocoding_url), ("forecast_url", &self.forecast_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                issues.push(format!("{name} must be an http(s) URL"));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(issues.join("; ")))
        }
    }
}

fn parse_secs(raw: &str, env_name: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be a whole number of seconds")))
}

/// Load `.env`, the TOML file at `path` (if given and present), then env overrides.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let _ = dotenvy::dotenv();

    let mut config = match path {
        Some(path) if path.exists() => {
            let raw = std::fs::read_to_string(path)?;
            Config::from_toml_str(&raw)?
        }
        Some(path) => {
            return Err(Error::Config(format!("config file {} not found", path.display())));
        }
        None => Config::default(),
    };

    config.apply_env(|name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}
