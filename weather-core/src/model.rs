use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WeatherError;

/// Measurement system requested from OpenWeatherMap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    /// Suffix used when a temperature is read out, e.g. "20°C".
    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
            Units::Standard => "K",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial, Units::Standard]
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "standard" => Ok(Units::Standard),
            _ => Err(anyhow::anyhow!(
                "Unknown units '{value}'. Supported units: metric, imperial, standard."
            )),
        }
    }
}

/// A lookup request: a city name or a coordinate pair, plus units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherQuery {
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub units: Units,
}

impl WeatherQuery {
    pub fn city(name: impl Into<String>) -> Self {
        Self { city: Some(name.into()), ..Self::default() }
    }

    pub fn coordinates(latitude: f64, longitude: f64) -> Self {
        Self { latitude: Some(latitude), longitude: Some(longitude), ..Self::default() }
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Resolve the query into a concrete location. A non-empty city wins
    /// over coordinates; coordinates need both halves.
    pub fn location(&self) -> Result<Location, WeatherError> {
        if let Some(city) = self.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            return Ok(Location::City(city.to_string()));
        }

        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Ok(Location::Coordinates { lat, lon }),
            _ => Err(WeatherError::MissingLocation),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

impl Location {
    /// Query parameters identifying this location to OpenWeatherMap.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Location::City(name) => vec![("q", name.clone())],
            Location::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::City(name) => f.write_str(name),
            Location::Coordinates { lat, lon } => write!(f, "{lat},{lon}"),
        }
    }
}

/// Fields the API sends that are not modeled, e.g. `pressure` or `coord`.
pub type Extra = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainReadings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wind {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deg: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Payload of `GET /weather`. Every field may be missing; the accessors
/// return `None` rather than failing. Unmodeled fields are kept in `extra`,
/// so serializing gives back what the API sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentWeather {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dt: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<MainReadings>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub weather: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind: Option<Wind>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl CurrentWeather {
    /// Fixed reading served when real data cannot be obtained.
    pub fn dummy() -> Self {
        Self {
            name: Some("Example City".to_string()),
            main: Some(MainReadings {
                temp: Some(20.0),
                feels_like: Some(19.0),
                temp_min: Some(18.0),
                temp_max: Some(22.0),
                humidity: Some(70.0),
                ..Default::default()
            }),
            weather: vec![Condition {
                main: Some("Clear".to_string()),
                description: Some("clear sky".to_string()),
                ..Default::default()
            }],
            wind: Some(Wind { speed: Some(3.5), ..Default::default() }),
            ..Default::default()
        }
    }

    pub fn location_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn temperature(&self) -> Option<f64> {
        self.main.as_ref().and_then(|m| m.temp)
    }

    pub fn feels_like(&self) -> Option<f64> {
        self.main.as_ref().and_then(|m| m.feels_like)
    }

    pub fn humidity(&self) -> Option<f64> {
        self.main.as_ref().and_then(|m| m.humidity)
    }

    pub fn wind_speed(&self) -> Option<f64> {
        self.wind.as_ref().and_then(|w| w.speed)
    }

    /// Description of the primary condition, e.g. "clear sky".
    pub fn description(&self) -> Option<&str> {
        self.weather.first().and_then(|w| w.description.as_deref())
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.dt.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastCity {
    pub name: Option<String>,
    pub country: Option<String>,
}

/// One three-hourly slot of `GET /forecast`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastEntry {
    pub dt: Option<i64>,
    pub main: Option<MainReadings>,
    pub weather: Vec<Condition>,
    pub wind: Option<Wind>,
}

impl ForecastEntry {
    pub fn temperature(&self) -> Option<f64> {
        self.main.as_ref().and_then(|m| m.temp)
    }

    pub fn description(&self) -> Option<&str> {
        self.weather.first().and_then(|w| w.description.as_deref())
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.dt.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastResponse {
    pub city: Option<ForecastCity>,
    pub list: Vec<ForecastEntry>,
}

/// Outcome of [`crate::WeatherClient::get_weather`], handed to the caller's
/// completion callback and returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub success: bool,
    pub location: String,
    pub temperature: Option<f64>,
    pub description: String,
    pub units: Units,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<CurrentWeather>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub(crate) const NOT_AVAILABLE: &str = "N/A";

impl WeatherResult {
    pub(crate) fn from_current(location: &str, units: Units, current: CurrentWeather) -> Self {
        Self {
            success: true,
            location: location.to_string(),
            temperature: current.temperature(),
            description: current.description().unwrap_or(NOT_AVAILABLE).to_string(),
            units,
            raw: Some(current),
            forecast: None,
            error: None,
        }
    }

    /// Error-tagged result carrying the placeholder reading.
    pub(crate) fn failed(location: &str, units: Units, error: &WeatherError) -> Self {
        let dummy = CurrentWeather::dummy();
        Self {
            success: false,
            location: location.to_string(),
            temperature: dummy.temperature(),
            description: dummy.description().unwrap_or(NOT_AVAILABLE).to_string(),
            units,
            raw: None,
            forecast: None,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_parse_case_insensitively() {
        for units in Units::all() {
            let parsed: Units = units.as_str().to_uppercase().parse().expect("known units");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn unknown_units_error() {
        let err = "kelvinish".parse::<Units>().unwrap_err();
        assert!(err.to_string().contains("Unknown units"));
    }

    #[test]
    fn query_prefers_city_over_coordinates() {
        let query = WeatherQuery {
            city: Some("London,UK".into()),
            latitude: Some(1.0),
            longitude: Some(2.0),
            units: Units::Metric,
        };

        assert_eq!(query.location().unwrap(), Location::City("London,UK".into()));
    }

    #[test]
    fn query_with_coordinates_only() {
        let location = WeatherQuery::coordinates(51.5, -0.12).location().unwrap();

        assert_eq!(
            location.query_pairs(),
            vec![("lat", "51.5".to_string()), ("lon", "-0.12".to_string())]
        );
    }

    #[test]
    fn query_without_location_is_rejected() {
        let half = WeatherQuery { latitude: Some(10.0), ..WeatherQuery::default() };
        let blank = WeatherQuery::city("   ");

        assert!(matches!(WeatherQuery::default().location(), Err(WeatherError::MissingLocation)));
        assert!(matches!(half.location(), Err(WeatherError::MissingLocation)));
        assert!(matches!(blank.location(), Err(WeatherError::MissingLocation)));
    }

    #[test]
    fn empty_payload_has_no_readings() {
        let weather: CurrentWeather = serde_json::from_str("{}").unwrap();

        assert_eq!(weather, CurrentWeather::default());
        assert_eq!(weather.temperature(), None);
        assert_eq!(weather.description(), None);
        assert_eq!(weather.wind_speed(), None);
    }

    #[test]
    fn payload_accessors_read_nested_fields() {
        let weather: CurrentWeather = serde_json::from_value(serde_json::json!({
            "name": "Paris",
            "dt": 1_700_000_000,
            "main": { "temp": 12.5, "feels_like": 11, "humidity": 81 },
            "weather": [{ "main": "Clouds", "description": "broken clouds" }],
            "wind": { "speed": 4.1, "deg": 200 },
            "visibility": 10000
        }))
        .unwrap();

        assert_eq!(weather.location_name(), Some("Paris"));
        assert_eq!(weather.temperature(), Some(12.5));
        assert_eq!(weather.feels_like(), Some(11.0));
        assert_eq!(weather.humidity(), Some(81.0));
        assert_eq!(weather.wind_speed(), Some(4.1));
        assert_eq!(weather.description(), Some("broken clouds"));
        assert_eq!(weather.observed_at().map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn unmodeled_fields_survive_reserialization() {
        let body = serde_json::json!({
            "name": "London",
            "coord": { "lon": -0.13, "lat": 51.51 },
            "main": { "temp": 15.0, "pressure": 1012 },
            "wind": { "speed": 4.1, "gust": 7.2 },
            "visibility": 10000,
            "timezone": 0
        });

        let weather: CurrentWeather = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(weather.temperature(), Some(15.0));

        assert_eq!(serde_json::to_value(&weather).unwrap(), body);
    }

    #[test]
    fn empty_payload_serializes_without_nulls() {
        let value = serde_json::to_value(CurrentWeather::default()).unwrap();

        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn failed_result_uses_placeholder_reading() {
        let result = WeatherResult::failed("Nowhere", Units::Imperial, &WeatherError::MissingApiKey);

        assert!(!result.success);
        assert_eq!(result.location, "Nowhere");
        assert_eq!(result.temperature, Some(20.0));
        assert_eq!(result.description, "clear sky");
        assert_eq!(result.units, Units::Imperial);
        assert!(result.error.as_deref().is_some_and(|e| !e.is_empty()));
    }

    #[test]
    fn result_description_defaults_when_missing() {
        let result = WeatherResult::from_current("Oslo", Units::Metric, CurrentWeather::default());

        assert!(result.success);
        assert_eq!(result.description, NOT_AVAILABLE);
        assert_eq!(result.temperature, None);
    }
}
