use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use weather_core::{
    Config, ForecastResponse, Units, WeatherClient, WeatherQuery, format_weather_for_speech,
    summarize_for_speech,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Speech-ready weather reports")]
pub struct Cli {
    /// Log requests and fallbacks (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Where to look: a city, a coordinate pair, or the configured default.
#[derive(Debug, Args)]
pub struct LocationArgs {
    /// City name, e.g. "London,UK".
    city: Option<String>,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// metric, imperial or standard; defaults to the configured units.
    #[arg(long)]
    units: Option<Units>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively store the API key, units and default location.
    Configure,

    /// Read out the current weather.
    Current(LocationArgs),

    /// List upcoming forecast slots.
    Forecast {
        #[command(flatten)]
        location: LocationArgs,

        /// Days of forecast wanted.
        #[arg(long, default_value_t = 5)]
        days: u8,
    },

    /// Current weather plus tomorrow's outlook, as the assistant would say it.
    Show {
        /// Location name; defaults to the configured one.
        location: Option<String>,

        /// Print the full result as JSON instead of a sentence.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config)?,
            Command::Current(args) => {
                let query = args.into_query(&config)?;
                let client = WeatherClient::new(Some(config), None);
                let weather = client.get_current_weather(&query).await;
                println!("{}", format_weather_for_speech(Some(&weather)));
            }
            Command::Forecast { location, days } => {
                let query = location.into_query(&config)?;
                let client = WeatherClient::new(Some(config), None);
                match client.get_forecast(&query, days).await {
                    Some(forecast) => print_forecast(&forecast, query.units),
                    None => println!("No forecast available right now."),
                }
            }
            Command::Show { location, json } => {
                let location = location
                    .or_else(|| config.default_location().map(str::to_owned))
                    .ok_or_else(no_location)?;
                let client = WeatherClient::new(Some(config), None);

                let result = client
                    .get_weather_with(&location, |result| {
                        if !json {
                            println!("{}", summarize_for_speech(result));
                        }
                    })
                    .await;

                if json {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
            }
        }

        Ok(())
    }
}

impl LocationArgs {
    fn into_query(self, config: &Config) -> anyhow::Result<WeatherQuery> {
        let units = self.units.unwrap_or_else(|| config.units());

        let query = match (self.city, self.lat, self.lon) {
            (Some(city), _, _) => WeatherQuery::city(city),
            (None, Some(lat), Some(lon)) => WeatherQuery::coordinates(lat, lon),
            _ => WeatherQuery::city(config.default_location().ok_or_else(no_location)?),
        };

        Ok(query.with_units(units))
    }
}

fn no_location() -> anyhow::Error {
    anyhow!(
        "No location given and no default location configured.\n\
         Hint: pass a city or run `weather configure`."
    )
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeatherMap API key (leave empty to keep current):")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }

    let current = config.units();
    let mut options = vec![current];
    options.extend(Units::all().iter().copied().filter(|u| *u != current));
    config.weather.units = Select::new("Units:", options).prompt().context("Failed to read units")?;

    let location = Text::new("Default location (e.g. London,UK):")
        .with_default(config.default_location().unwrap_or_default())
        .prompt()
        .context("Failed to read default location")?;
    config.weather.default_location =
        Some(location.trim().to_string()).filter(|l| !l.is_empty());

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

fn print_forecast(forecast: &ForecastResponse, units: Units) {
    if let Some(name) = forecast.city.as_ref().and_then(|c| c.name.as_deref()) {
        println!("Forecast for {name}:");
    }

    for entry in &forecast.list {
        let time = entry
            .time()
            .map(|t| t.format("%a %d %b %H:%M UTC").to_string())
            .unwrap_or_else(|| "unknown time".to_string());
        let temp = entry
            .temperature()
            .map(|t| format!("{t}{}", units.temperature_symbol()))
            .unwrap_or_else(|| "?".to_string());

        println!("  {time}  {temp:>8}  {}", entry.description().unwrap_or("unknown conditions"));
    }
}
