//! Sentences handed to the text-to-speech engine.

use std::fmt::Write as _;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::model::{CurrentWeather, NOT_AVAILABLE, WeatherResult};

pub const NO_DATA_APOLOGY: &str = "I couldn't retrieve the weather information at the moment.";
pub const MALFORMED_DATA_APOLOGY: &str =
    "I'm having trouble interpreting the weather data right now.";
pub const LOOKUP_FAILED_APOLOGY: &str =
    "Sorry, I couldn't get the weather information. Please try again later.";

const UNKNOWN: &str = "unknown";

/// Read out a current-weather payload, substituting placeholders for
/// missing fields.
pub fn format_weather_for_speech(weather: Option<&CurrentWeather>) -> String {
    let Some(weather) = weather else {
        return NO_DATA_APOLOGY.to_string();
    };

    let location = weather.location_name().unwrap_or("unknown location");
    let description = weather.description().unwrap_or("unknown conditions");

    format!(
        "The current weather in {location} is {} degrees with {description}. \
         It feels like {} degrees. \
         Humidity is at {}% and wind speed is {} meters per second.",
        spoken(weather.temperature(), UNKNOWN),
        spoken(weather.feels_like(), UNKNOWN),
        spoken(weather.humidity(), UNKNOWN),
        spoken(weather.wind_speed(), UNKNOWN),
    )
}

/// Like [`format_weather_for_speech`], for a payload that has not been
/// decoded yet. `null` means no data. Missing keys read as placeholders, but
/// keys that are present with the wrong shape (`"main": null`, an empty
/// `weather` list, ...) get a separate apology.
pub fn format_json_for_speech(payload: &Value) -> String {
    if payload.is_null() {
        return NO_DATA_APOLOGY.to_string();
    }

    if let Some(problem) = structural_problem(payload) {
        warn!(problem, "Error formatting weather data");
        return MALFORMED_DATA_APOLOGY.to_string();
    }

    match CurrentWeather::deserialize(payload) {
        Ok(weather) => format_weather_for_speech(Some(&weather)),
        Err(err) => {
            warn!(error = %err, "Error formatting weather data");
            MALFORMED_DATA_APOLOGY.to_string()
        }
    }
}

fn structural_problem(payload: &Value) -> Option<&'static str> {
    let Some(fields) = payload.as_object() else {
        return Some("payload is not an object");
    };

    for key in ["main", "wind"] {
        if fields.get(key).is_some_and(|v| !v.is_object()) {
            return Some("reading group is not an object");
        }
    }

    match fields.get("weather") {
        None => None,
        Some(Value::Array(conditions)) => match conditions.first() {
            None => Some("weather list is empty"),
            Some(first) if !first.is_object() => Some("weather entry is not an object"),
            Some(_) => None,
        },
        Some(_) => Some("weather is not a list"),
    }
}

/// Short reply for a finished [`WeatherResult`], mentioning tomorrow when known.
pub fn summarize_for_speech(result: &WeatherResult) -> String {
    if !result.success {
        return LOOKUP_FAILED_APOLOGY.to_string();
    }

    let mut reply = format!(
        "The weather in {} is {} with a temperature of {}{}.",
        result.location,
        result.description,
        spoken(result.temperature, NOT_AVAILABLE),
        result.units.temperature_symbol(),
    );

    if let Some(forecast) = &result.forecast {
        // Writing into a String cannot fail.
        let _ = write!(reply, " Tomorrow's forecast: {forecast}");
    }

    reply
}

// f64's Display drops a zero fraction, so 15.0 reads as "15".
fn spoken(value: Option<f64>, placeholder: &str) -> String {
    value.map_or_else(|| placeholder.to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MainReadings, Units};
    use serde_json::json;

    #[test]
    fn no_data_apology() {
        assert_eq!(
            format_weather_for_speech(None),
            "I couldn't retrieve the weather information at the moment."
        );
        assert_eq!(format_json_for_speech(&Value::Null), NO_DATA_APOLOGY);
    }

    #[test]
    fn reads_out_a_full_payload() {
        let text = format_weather_for_speech(Some(&CurrentWeather::dummy()));

        assert_eq!(
            text,
            "The current weather in Example City is 20 degrees with clear sky. \
             It feels like 19 degrees. \
             Humidity is at 70% and wind speed is 3.5 meters per second."
        );
    }

    #[test]
    fn empty_payload_uses_placeholders() {
        let text = format_json_for_speech(&json!({}));

        assert_eq!(
            text,
            "The current weather in unknown location is unknown degrees with unknown conditions. \
             It feels like unknown degrees. \
             Humidity is at unknown% and wind speed is unknown meters per second."
        );
    }

    #[test]
    fn partial_payload_mixes_values_and_placeholders() {
        let weather = CurrentWeather {
            name: Some("Reykjavik".into()),
            main: Some(MainReadings { temp: Some(-3.5), ..Default::default() }),
            ..Default::default()
        };

        let text = format_weather_for_speech(Some(&weather));

        assert!(text.starts_with("The current weather in Reykjavik is -3.5 degrees with unknown conditions."));
        assert!(text.contains("It feels like unknown degrees."));
    }

    #[test]
    fn malformed_payload_gets_its_own_apology() {
        assert_eq!(format_json_for_speech(&json!({ "main": "hot" })), MALFORMED_DATA_APOLOGY);
        assert_eq!(format_json_for_speech(&json!("sunny")), MALFORMED_DATA_APOLOGY);
    }

    #[test]
    fn present_but_unusable_fields_are_malformed() {
        for payload in [
            json!({ "name": "X", "weather": [] }),
            json!({ "name": "X", "weather": null }),
            json!({ "name": "X", "weather": ["clear"] }),
            json!({ "name": "X", "main": null }),
            json!({ "name": "X", "main": [20, 19] }),
            json!({ "name": "X", "wind": 3.5 }),
        ] {
            assert_eq!(format_json_for_speech(&payload), MALFORMED_DATA_APOLOGY, "{payload}");
        }
    }

    #[test]
    fn missing_groups_still_use_placeholders() {
        let text = format_json_for_speech(&json!({
            "name": "X",
            "main": {},
            "weather": [{}]
        }));

        assert!(text.starts_with("The current weather in X is unknown degrees with unknown conditions."));
    }

    #[test]
    fn summary_mentions_tomorrow_when_known() {
        let mut result = WeatherResult::from_current("Paris", Units::Metric, CurrentWeather::dummy());
        assert_eq!(
            summarize_for_speech(&result),
            "The weather in Paris is clear sky with a temperature of 20°C."
        );

        result.forecast = Some("light rain".into());
        result.units = Units::Imperial;
        assert_eq!(
            summarize_for_speech(&result),
            "The weather in Paris is clear sky with a temperature of 20°F. Tomorrow's forecast: light rain"
        );
    }

    #[test]
    fn failed_lookup_summary_apologizes() {
        let result = WeatherResult::failed(
            "Nowhere",
            Units::Metric,
            &crate::error::WeatherError::MissingApiKey,
        );

        assert_eq!(summarize_for_speech(&result), LOOKUP_FAILED_APOLOGY);
    }
}
