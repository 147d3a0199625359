//! OpenWeatherMap client.
//!
//! Every public lookup degrades instead of failing: current weather falls
//! back to [`CurrentWeather::dummy`], forecasts to `None`, and
//! [`WeatherClient::get_weather`] to an error-tagged [`WeatherResult`].
//! The `fetch_*` methods expose the underlying `Result` for callers that
//! want to branch on the failure themselves.

use std::{env, fmt};

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::{
    config::Config,
    error::WeatherError,
    model::{CurrentWeather, ForecastResponse, NOT_AVAILABLE, Units, WeatherQuery, WeatherResult},
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Environment variable consulted when no key is passed explicitly.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Days requested when enriching a result with tomorrow's outlook.
const ENRICHMENT_FORECAST_DAYS: u8 = 2;

/// Index of the forecast slot read out as "tomorrow".
const NEXT_DAY_ENTRY: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Endpoint::Current => "current weather",
            Endpoint::Forecast => "forecast",
        })
    }
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    api_key: Option<String>,
    base_url: String,
    config: Option<Config>,
    http: Client,
}

impl WeatherClient {
    /// Build a client, taking the key from `api_key`, else `WEATHER_API_KEY`,
    /// else the config file. Without any key the client still works but only
    /// serves placeholder data.
    pub fn new(config: Option<Config>, api_key: Option<String>) -> Self {
        let api_key = resolve_api_key(api_key, env::var(API_KEY_ENV).ok(), config.as_ref());
        Self::from_key(api_key, config)
    }

    /// Build a client from an already resolved key, without reading the environment.
    pub fn from_key(api_key: Option<String>, config: Option<Config>) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!(
                env = API_KEY_ENV,
                "No OpenWeatherMap API key provided. Weather functionality will be limited."
            );
        }

        let base_url = config
            .as_ref()
            .and_then(|c| c.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Self { api_key, base_url, config, http: Client::new() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// True when no API key resolved and every lookup will fall back.
    pub fn is_degraded(&self) -> bool {
        self.api_key.is_none()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Units preferred by the configuration, metric when unconfigured.
    pub fn units(&self) -> Units {
        self.config.as_ref().map(Config::units).unwrap_or_default()
    }

    #[instrument(skip(self), fields(units = %query.units))]
    pub async fn fetch_current(&self, query: &WeatherQuery) -> Result<CurrentWeather, WeatherError> {
        self.fetch(Endpoint::Current, query).await
    }

    /// Current weather, or the placeholder reading on any failure.
    pub async fn get_current_weather(&self, query: &WeatherQuery) -> CurrentWeather {
        match self.fetch_current(query).await {
            Ok(weather) => weather,
            Err(err) => {
                warn!(error = %err, "Error fetching weather, using placeholder data");
                CurrentWeather::dummy()
            }
        }
    }

    /// `days` is informational; the API decides how many slots it returns.
    #[instrument(skip(self), fields(units = %query.units))]
    pub async fn fetch_forecast(
        &self,
        query: &WeatherQuery,
        days: u8,
    ) -> Result<ForecastResponse, WeatherError> {
        self.fetch(Endpoint::Forecast, query).await
    }

    pub async fn get_forecast(&self, query: &WeatherQuery, days: u8) -> Option<ForecastResponse> {
        match self.fetch_forecast(query, days).await {
            Ok(forecast) => Some(forecast),
            Err(err) => {
                warn!(error = %err, "Error fetching forecast");
                None
            }
        }
    }

    /// Look up `location` and build a result for the assistant.
    pub async fn get_weather(&self, location: &str) -> WeatherResult {
        self.get_weather_with(location, |_| {}).await
    }

    /// Same as [`get_weather`](Self::get_weather), invoking `on_complete`
    /// exactly once with the final result before returning it.
    #[instrument(skip(self, on_complete))]
    pub async fn get_weather_with<F>(&self, location: &str, on_complete: F) -> WeatherResult
    where
        F: FnOnce(&WeatherResult),
    {
        let units = self.units();
        let query = WeatherQuery::city(location).with_units(units);

        let result = match self.fetch_current(&query).await {
            Ok(current) => {
                let mut result = WeatherResult::from_current(location, units, current);
                result.forecast = self.next_day_outlook(&query).await;
                result
            }
            Err(err) => {
                warn!(error = %err, "Error getting weather");
                WeatherResult::failed(location, units, &err)
            }
        };

        on_complete(&result);
        result
    }

    async fn next_day_outlook(&self, query: &WeatherQuery) -> Option<String> {
        let forecast = match self.fetch_forecast(query, ENRICHMENT_FORECAST_DAYS).await {
            Ok(forecast) => forecast,
            Err(err) => {
                warn!(error = %err, "Error getting forecast");
                return None;
            }
        };

        let Some(entry) = forecast.list.get(NEXT_DAY_ENTRY) else {
            warn!(entries = forecast.list.len(), "Forecast has no next-day entry");
            return None;
        };

        Some(entry.description().unwrap_or(NOT_AVAILABLE).to_string())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &WeatherQuery,
    ) -> Result<T, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;
        let location = query.location()?;

        let url = format!("{}/{}", self.base_url, endpoint.path());
        let mut params = vec![("appid", api_key.to_string()), ("units", query.units.to_string())];
        params.extend(location.query_pairs());

        debug!(%url, %location, "Requesting OpenWeatherMap {endpoint}");

        let res = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|source| WeatherError::Request { endpoint, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| WeatherError::Request { endpoint, source })?;

        if !status.is_success() {
            return Err(WeatherError::Status { endpoint, status, body: truncate_body(&body) });
        }

        serde_json::from_str(&body).map_err(|source| WeatherError::Parse { endpoint, source })
    }
}

/// Explicit key, then the environment, then the config file. Blank keys are skipped.
fn resolve_api_key(
    explicit: Option<String>,
    from_env: Option<String>,
    config: Option<&Config>,
) -> Option<String> {
    explicit
        .into_iter()
        .chain(from_env)
        .chain(config.and_then(Config::api_key).map(str::to_owned))
        .map(|k| k.trim().to_string())
        .find(|k| !k.is_empty())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
