use crate::util::Color;
use anyhow::{bail, Context};
use chrono_tz::Tz;
use indexmap::IndexMap;
use log::{info, warn};
use serde::Deserialize;
use std::{env, fs::File, io, path::PathBuf};

/// Static app configuration, loaded once at startup
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// City to fetch weather for
    pub city: String,
    /// ISO 3166 country code of the city
    pub country_code: String,
    /// OpenWeather API key. Falls back to the environment if blank
    pub api_key: String,
    pub api_host: String,
    /// Timezone used to decide whether it's night
    pub timezone: Tz,
    /// Canvas width, in pixels
    pub width: u32,
    /// Canvas height, in pixels
    pub height: u32,
    /// Edge length of a block, in pixels
    pub block_size: u32,
    /// Color of a fresh canvas
    pub background: Color,
    /// Where the canvas is saved after each update
    pub output: PathBuf,
    /// Start from the existing output file instead of a blank canvas
    pub resume: bool,
    /// Maximum random offset applied to each color channel
    pub jitter: u8,
    /// Pause after the loop hits an unexpected error
    pub retry_delay_secs: u64,
    /// Extra palettes, or replacements for built-in ones
    pub palettes: IndexMap<String, Vec<Color>>,
}

impl Config {
    const PATH: &'static str = "./config.json";
    const API_KEY_VARIABLE: &'static str = "OPENWEATHER_API_KEY";

    /// Load config from the config file, falling back to defaults if there
    /// is no file
    pub fn load() -> anyhow::Result<Self> {
        info!("Loading config from `{}`", Self::PATH);
        let mut config: Self = match File::open(Self::PATH) {
            Ok(file) => serde_json::from_reader(file).with_context(|| {
                format!("Error parsing config file {}", Self::PATH)
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("No config file at `{}`, using defaults", Self::PATH);
                Self::default()
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Error opening config file {}", Self::PATH)
                })
            }
        };

        if config.api_key.is_empty() {
            config.api_key =
                env::var(Self::API_KEY_VARIABLE).unwrap_or_default();
        }
        config.validate()?;
        Ok(config)
    }

    /// Check for values that would make the canvas unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.block_size == 0 {
            bail!("block_size must be positive");
        }
        if self.width < self.block_size || self.height < self.block_size {
            bail!(
                "Canvas {}x{} is smaller than one {}px block",
                self.width,
                self.height,
                self.block_size
            );
        }
        if let Some((key, _)) =
            self.palettes.iter().find(|(_, colors)| colors.is_empty())
        {
            bail!("Palette `{key}` is empty");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            city: "Amsterdam".into(),
            country_code: "NL".into(),
            api_key: String::new(),
            api_host: "https://api.openweathermap.org".into(),
            timezone: Tz::Europe__Amsterdam,
            width: 1920,
            height: 1080,
            block_size: 1,
            background: Color::WHITE,
            output: "weather_art.png".into(),
            resume: false,
            jitter: 10,
            retry_delay_secs: 5,
            palettes: IndexMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial() {
        let config: Config = serde_json::from_str(
            r##"{
                "city": "Zutphen",
                "timezone": "America/New_York",
                "block_size": 4,
                "background": "#000000",
                "palettes": {"rain": ["#0000ff", "#000080"]}
            }"##,
        )
        .unwrap();
        assert_eq!(config.city, "Zutphen");
        assert_eq!(config.country_code, "NL");
        assert_eq!(config.timezone, Tz::America__New_York);
        assert_eq!(config.block_size, 4);
        assert_eq!(config.background, Color::BLACK);
        assert_eq!(config.width, 1920);
        assert_eq!(
            config.palettes["rain"],
            [Color::new(0, 0, 255), Color::new(0, 0, 128)]
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_errors() {
        assert!(serde_json::from_str::<Config>(r#"{"citty": "Oops"}"#)
            .is_err());
        assert!(serde_json::from_str::<Config>(r#"{"timezone": "Mars/Base"}"#)
            .is_err());
        assert!(serde_json::from_str::<Config>(r#"{"background": "red"}"#)
            .is_err());
    }

    #[test]
    fn test_validate() {
        Config::default().validate().unwrap();

        let config = Config {
            block_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            width: 4,
            block_size: 8,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            palettes: IndexMap::from([("rain".to_owned(), vec![])]),
            ..Config::default()
        };
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "Palette `rain` is empty"
        );
    }
}
