use reqwest::StatusCode;
use thiserror::Error;

use crate::client::Endpoint;

/// Why a lookup could not produce real data.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("No OpenWeatherMap API key available")]
    MissingApiKey,

    #[error("No location provided: pass a city name or both latitude and longitude")]
    MissingLocation,

    #[error("Failed to send request to OpenWeatherMap ({endpoint}): {source}")]
    Request {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("OpenWeatherMap {endpoint} request failed with status {status}: {body}")]
    Status { endpoint: Endpoint, status: StatusCode, body: String },

    #[error("Failed to parse OpenWeatherMap {endpoint} JSON: {source}")]
    Parse {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
}
