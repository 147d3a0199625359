//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - An OpenWeatherMap client that never fails the caller
//! - Shared domain models (queries, payloads, results)
//! - Speech-ready formatting of weather readings
//!
//! It is used by `weather-cli`, but can also be embedded in a voice assistant.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod speech;

pub use client::{API_KEY_ENV, DEFAULT_BASE_URL, Endpoint, WeatherClient};
pub use config::{Config, WeatherSettings};
pub use error::WeatherError;
pub use model::{
    CurrentWeather, ForecastEntry, ForecastResponse, Location, Units, WeatherQuery, WeatherResult,
};
pub use speech::{format_json_for_speech, format_weather_for_speech, summarize_for_speech};
