//! Mapping from weather conditions to the colors they paint with

use crate::util::Color;
use chrono::{DateTime, TimeZone, Timelike};
use indexmap::IndexMap;

/// Palette keys with special meaning. Everything else is looked up by the
/// condition keyword directly.
pub const CLEAR: &str = "clear";
pub const CLEAR_DAY: &str = "clear_day";
pub const CLEAR_NIGHT: &str = "clear_night";
pub const DEFAULT: &str = "default";

/// Is the given local hour (0-23) part of the night?
pub fn is_night(hour: u32) -> bool {
    hour < 6 || hour > 20
}

/// Is it night at the given instant, as seen from the given timezone?
pub fn is_night_at<Tz: TimeZone>(now: DateTime<Tz>) -> bool {
    is_night(now.hour())
}

/// Immutable table of palettes, keyed by weather condition
#[derive(Clone, Debug)]
pub struct PaletteTable {
    palettes: IndexMap<String, Vec<Color>>,
}

impl PaletteTable {
    /// Build the table from the built-in palettes, with any overrides laid
    /// on top. An override replaces the built-in palette of the same key.
    pub fn new(overrides: &IndexMap<String, Vec<Color>>) -> Self {
        let mut palettes = Self::default().palettes;
        palettes.extend(
            overrides
                .iter()
                .map(|(key, colors)| (key.clone(), colors.clone())),
        );
        Self { palettes }
    }

    /// Get the palette for a condition keyword. `clear` splits into a day
    /// and night palette, unknown keywords get the default palette.
    pub fn select(&self, condition: &str, night: bool) -> &[Color] {
        let key = match condition {
            CLEAR if night => CLEAR_NIGHT,
            CLEAR => CLEAR_DAY,
            other => other,
        };
        self.palettes
            .get(key)
            .or_else(|| self.palettes.get(DEFAULT))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl '_ + Iterator<Item = (&str, &[Color])> {
        self.palettes
            .iter()
            .map(|(key, colors)| (key.as_str(), colors.as_slice()))
    }
}

impl Default for PaletteTable {
    fn default() -> Self {
        let palettes = [
            (
                CLEAR_DAY,
                vec![
                    Color::new(135, 206, 235), // Sky blue
                    Color::new(173, 216, 230), // Light blue
                    Color::new(176, 224, 230), // Powder blue
                    Color::new(240, 255, 255), // Light cyan
                    Color::new(224, 255, 255), // Light sky cyan
                    Color::new(250, 250, 210), // Light goldenrod
                ],
            ),
            (
                CLEAR_NIGHT,
                vec![
                    Color::new(25, 25, 112), // Midnight blue
                    Color::new(0, 0, 139),   // Dark blue
                    Color::new(18, 10, 143), // Twilight blue
                ],
            ),
            (
                "clouds",
                vec![
                    Color::new(169, 169, 169),
                    Color::new(190, 190, 190),
                    Color::new(211, 211, 211),
                ],
            ),
            (
                "rain",
                vec![
                    Color::new(105, 105, 105), // Stormy
                    Color::new(119, 136, 153),
                    Color::new(47, 79, 79), // Heavy rain teal
                ],
            ),
            (
                "snow",
                vec![
                    Color::new(255, 250, 250),
                    Color::new(240, 248, 255),
                    Color::new(245, 245, 245),
                ],
            ),
            (
                "mist",
                vec![
                    Color::new(169, 169, 169), // Fog
                    Color::new(128, 128, 128),
                    Color::new(220, 220, 220),
                ],
            ),
            (
                DEFAULT,
                vec![
                    Color::new(176, 224, 230), // Powder blue
                    Color::new(255, 250, 250), // Snow
                    Color::new(240, 248, 255), // Alice blue
                    Color::new(245, 245, 245), // White smoke
                    Color::new(220, 220, 220), // Gainsboro
                ],
            ),
        ];
        Self {
            palettes: palettes
                .into_iter()
                .map(|(key, colors)| (key.to_owned(), colors))
                .collect(),
        }
    }
}
