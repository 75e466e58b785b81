//! Weather-driven generative art. Every so often, fetch the current weather,
//! pick a palette to match, and blend some of its colors into a persistent
//! canvas.

pub mod canvas;
pub mod config;
pub mod mutator;
pub mod palette;
pub mod prompt;
pub mod runner;
pub mod util;
pub mod weather;
