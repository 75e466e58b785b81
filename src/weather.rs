use crate::config::Config;
use anyhow::{anyhow, bail, Context};
use log::{error, info};
use serde::Deserialize;
use std::fmt::{self, Display, Formatter};

/// Offset between Kelvin, which the API reports in, and Celsius
const KELVIN_OFFSET: f64 = 273.15;

/// Anything that can tell us what the weather is doing right now
pub trait WeatherSource {
    /// Fetch the current conditions. Every failure, including a bad status
    /// code from the API, is an error here.
    fn fetch(&self) -> anyhow::Result<WeatherReading>;
}

/// Current conditions, as reported by the weather API
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherReading {
    /// Location the reading is for, e.g. `Amsterdam, NL`
    pub location: String,
    /// Lowercased primary condition, e.g. `clear`, `rain`
    pub condition: String,
    /// Human description, e.g. `light intensity drizzle`
    pub description: String,
    /// °C
    pub temperature: f64,
    /// °C
    pub feels_like: f64,
    /// %
    pub humidity: f64,
    /// m/s
    pub wind_speed: f64,
}

impl Display for WeatherReading {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Weather Statistics ===")?;
        writeln!(f, "Location: {}", self.location)?;
        writeln!(f, "Temperature: {:.1}°C", self.temperature)?;
        writeln!(f, "Feels like: {:.1}°C", self.feels_like)?;
        writeln!(f, "Weather: {} ({})", self.condition, self.description)?;
        writeln!(f, "Humidity: {}%", self.humidity)?;
        writeln!(f, "Wind Speed: {} m/s", self.wind_speed)?;
        write!(f, "==========================")
    }
}

/// Get the current condition keyword from a weather source, or `None` if
/// there's no data this time. Failures are logged, never returned.
pub fn classify(source: &impl WeatherSource) -> Option<String> {
    match source.fetch() {
        Ok(reading) => {
            info!("\n{reading}");
            Some(reading.condition)
        }
        Err(err) => {
            error!("Error fetching weather: {err:?}");
            None
        }
    }
}

/// Client for the OpenWeather current weather API
/// https://openweathermap.org/current
#[derive(Debug)]
pub struct OpenWeather {
    agent: ureq::Agent,
    url: String,
    city: String,
    country_code: String,
    api_key: String,
}

impl OpenWeather {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new().user_agent("skyloom").build();
        Self {
            agent,
            url: format!(
                "{}/data/2.5/weather",
                config.api_host.trim_end_matches('/')
            ),
            city: config.city.clone(),
            country_code: config.country_code.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn location(&self) -> String {
        format!("{}, {}", self.city, self.country_code)
    }
}

impl WeatherSource for OpenWeather {
    fn fetch(&self) -> anyhow::Result<WeatherReading> {
        if self.api_key.is_empty() {
            bail!("No API key configured");
        }

        info!("Fetching weather for {}", self.location());
        let query = format!("{},{}", self.city, self.country_code);
        let result = self
            .agent
            .get(&self.url)
            .query("q", &query)
            .query("appid", &self.api_key)
            .call();
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                // The API puts a human-readable reason in the error body
                let message = response
                    .into_json::<ErrorResponse>()
                    .ok()
                    .and_then(|body| body.message)
                    .unwrap_or_else(|| "Unknown error".into());
                return Err(anyhow!("API returned {status}: {message}"));
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Error fetching weather from {}", self.url)
                });
            }
        };

        let body: CurrentWeather = response
            .into_json()
            .context("Error parsing weather as JSON")?;
        body.into_reading(self.location())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    weather: Vec<Condition>,
    main: Main,
    wind: Wind,
}

#[derive(Debug, Deserialize)]
struct Condition {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct Main {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

impl CurrentWeather {
    fn into_reading(self, location: String) -> anyhow::Result<WeatherReading> {
        // The first condition is the primary one
        let condition = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Weather response has no conditions"))?;
        Ok(WeatherReading {
            location,
            condition: condition.main.to_lowercase(),
            description: condition.description,
            temperature: self.main.temp - KELVIN_OFFSET,
            feels_like: self.main.feels_like - KELVIN_OFFSET,
            humidity: self.main.humidity,
            wind_speed: self.wind.speed,
        })
    }
}
