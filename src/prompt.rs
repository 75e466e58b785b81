//! Interactive startup questions

use anyhow::{anyhow, bail, Context};
use log::warn;
use std::{
    io::{BufRead, Write},
    time::Duration,
};

/// Settings chosen by the user on startup
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Settings {
    /// Fraction of blocks to modify per update. 0.1 = 10%
    pub modification_fraction: f64,
    /// Time between updates
    pub interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            modification_fraction: 0.3,
            interval: Duration::from_secs(15),
        }
    }
}

/// Ask the user for settings. If either answer is invalid, *both* fall back
/// to the defaults.
pub fn ask(input: &mut impl BufRead, output: &mut impl Write) -> Settings {
    match try_ask(input, output) {
        Ok(settings) => settings,
        Err(err) => {
            warn!("Invalid input ({err}), using default values");
            Settings::default()
        }
    }
}

fn try_ask(
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> anyhow::Result<Settings> {
    let fraction = question(
        input,
        output,
        "Enter fraction of pixels to modify (0.1 = 10%, 0.5 = 50%, etc.): ",
    )?;
    let modification_fraction: f64 = fraction
        .parse()
        .with_context(|| format!("`{fraction}` is not a number"))?;
    if !modification_fraction.is_finite() || modification_fraction < 0.0 {
        bail!("`{fraction}` is not a valid fraction");
    }

    let interval =
        question(input, output, "Enter update interval in seconds: ")?;
    let interval: u64 = interval
        .parse()
        .with_context(|| format!("`{interval}` is not a whole number"))?;

    Ok(Settings {
        modification_fraction,
        interval: Duration::from_secs(interval),
    })
}

/// Print a question and read one trimmed line of answer
fn question(
    input: &mut impl BufRead,
    output: &mut impl Write,
    text: &str,
) -> anyhow::Result<String> {
    write!(output, "{text}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(anyhow!("end of input"));
    }
    Ok(line.trim().to_owned())
}
