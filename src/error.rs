//! Error taxonomy shared by the refresh path and the query path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Location name could not be turned into coordinates.
    #[error("location resolution failed for {location}: {message}")]
    Resolution { location: String, message: String },

    /// Coordinates could not be turned into a reading.
    #[error("current conditions fetch failed: {0}")]
    Fetch(String),

    /// Malformed timestamp in an otherwise successful fetch.
    #[error("invalid reading timestamp {text:?}: {source}")]
    Parse {
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("no readings recorded for {0}")]
    NotFound(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
