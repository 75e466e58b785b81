use crate::{
    canvas::Canvas,
    config::Config,
    mutator::{Entropy, Mutator},
    palette::{self, PaletteTable},
    prompt::Settings,
    weather::{self, WeatherSource},
};
use chrono::Utc;
use log::{error, info};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::mpsc::{Receiver, RecvTimeoutError},
    time::Duration,
};

/// Drives the fetch → mutate → save cycle on a fixed interval
#[derive(Debug)]
pub struct Runner<S, E> {
    config: Config,
    settings: Settings,
    weather: S,
    entropy: E,
    mutator: Mutator,
    canvas: Canvas,
}

impl<S: WeatherSource, E: Entropy> Runner<S, E> {
    pub fn new(
        config: Config,
        settings: Settings,
        weather: S,
        entropy: E,
        canvas: Canvas,
    ) -> Self {
        let mutator = Mutator::new(
            PaletteTable::new(&config.palettes),
            settings.modification_fraction,
            config.jitter,
        );
        Self {
            config,
            settings,
            weather,
            entropy,
            mutator,
            canvas,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Run until a message arrives on the shutdown channel (or every sender
    /// is dropped). Shutdown is only checked between cycles.
    pub fn run(&mut self, shutdown: &Receiver<()>) {
        info!(
            "Modifying {}% of blocks every {}s",
            self.settings.modification_fraction * 100.0,
            self.settings.interval.as_secs()
        );
        loop {
            // Anything that escapes a cycle is treated as transient. The
            // canvas keeps whatever state the cycle left it in.
            let result =
                panic::catch_unwind(AssertUnwindSafe(|| self.cycle()));
            let pause = match result {
                Ok(()) => self.settings.interval,
                Err(payload) => {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".into());
                    error!("Error in main loop: {message}");
                    Duration::from_secs(self.config.retry_delay_secs)
                }
            };

            info!("Waiting {}s until next update...", pause.as_secs());
            match shutdown.recv_timeout(pause) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    info!("Program stopped by user. Goodbye!");
                    return;
                }
            }
        }
    }

    /// One fetch → mutate → save pass. A cycle with no weather data leaves
    /// the canvas and the output file alone.
    pub fn cycle(&mut self) {
        let Some(condition) = weather::classify(&self.weather) else {
            return;
        };
        info!("Current weather: {condition}");

        let night = palette::is_night_at(
            Utc::now().with_timezone(&self.config.timezone),
        );
        match self.mutator.mutate(
            &mut self.canvas,
            &condition,
            night,
            &mut self.entropy,
        ) {
            Ok(count) => info!("Modified {count} blocks"),
            Err(err) => error!("Error modifying blocks: {err:?}"),
        }

        match self.canvas.save(&self.config.output) {
            Ok(()) => {
                info!("Saved image: {}", self.config.output.display())
            }
            Err(err) => error!("Error saving image: {err:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mutator::RandomSource, util::Color, weather::WeatherReading};
    use anyhow::anyhow;
    use rand::{rngs::StdRng, SeedableRng};
    use std::{
        cell::Cell,
        path::Path,
        sync::mpsc::{self, Sender},
    };

    /// Replays a script of weather results. Once the script runs out, it
    /// requests shutdown and reports no data.
    struct Script {
        steps: Vec<Step>,
        calls: Cell<usize>,
        shutdown: Sender<()>,
    }

    #[derive(Copy, Clone)]
    enum Step {
        Reading(&'static str),
        Failure,
        Panic,
    }

    impl WeatherSource for Script {
        fn fetch(&self) -> anyhow::Result<WeatherReading> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            match self.steps.get(call) {
                Some(Step::Reading(condition)) => Ok(WeatherReading {
                    location: "Amsterdam, NL".into(),
                    condition: (*condition).into(),
                    description: String::new(),
                    temperature: 10.0,
                    feels_like: 8.0,
                    humidity: 80.0,
                    wind_speed: 3.0,
                }),
                Some(Step::Failure) => Err(anyhow!("API returned 401")),
                Some(Step::Panic) => panic!("weather exploded"),
                None => {
                    self.shutdown.send(()).unwrap();
                    Err(anyhow!("done"))
                }
            }
        }
    }

    fn runner(
        output: &Path,
        steps: Vec<Step>,
    ) -> (Runner<Script, RandomSource<StdRng>>, Receiver<()>) {
        let (sender, receiver) = mpsc::channel();
        let config = Config {
            width: 4,
            height: 4,
            block_size: 1,
            background: Color::BLACK,
            output: output.to_owned(),
            retry_delay_secs: 0,
            ..Config::default()
        };
        let settings = Settings {
            modification_fraction: 1.0,
            interval: Duration::ZERO,
        };
        let canvas = Canvas::new(4, 4, 1, Color::BLACK);
        let script = Script {
            steps,
            calls: Cell::new(0),
            shutdown: sender,
        };
        let entropy = RandomSource(StdRng::seed_from_u64(1));
        (
            Runner::new(config, settings, script, entropy, canvas),
            receiver,
        )
    }

    fn is_blank(canvas: &Canvas) -> bool {
        canvas.pixels().all(|color| color == Color::BLACK)
    }

    #[test]
    fn test_cycle_saves() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("art.png");
        let (mut runner, _shutdown) =
            runner(&path, vec![Step::Reading("rain")]);

        runner.cycle();
        assert!(!is_blank(runner.canvas()));
        let saved = Canvas::load(&path, 1).unwrap();
        assert_eq!(
            saved.pixels().collect::<Vec<_>>(),
            runner.canvas().pixels().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_cycle_no_data() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("art.png");
        let (mut runner, _shutdown) = runner(&path, vec![Step::Failure]);

        runner.cycle();
        assert!(is_blank(runner.canvas()));
        assert!(!path.exists());
    }

    #[test]
    fn test_cycle_save_failure() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("missing").join("art.png");
        let (mut runner, _shutdown) =
            runner(&path, vec![Step::Reading("snow")]);

        // Save fails, but the in-memory canvas keeps its changes
        runner.cycle();
        assert!(!is_blank(runner.canvas()));
        assert!(!path.exists());
    }

    #[test]
    fn test_run_until_shutdown() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("art.png");
        let (mut runner, shutdown) = runner(
            &path,
            vec![Step::Reading("rain"), Step::Failure, Step::Reading("mist")],
        );

        runner.run(&shutdown);
        assert_eq!(runner.weather.calls.get(), 4);
        assert!(path.exists());
    }

    #[test]
    fn test_run_survives_panic() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("art.png");
        let (mut runner, shutdown) =
            runner(&path, vec![Step::Panic, Step::Reading("clouds")]);

        runner.run(&shutdown);
        // The loop kept going after the panic and finished the script
        assert_eq!(runner.weather.calls.get(), 3);
        assert!(path.exists());
    }

    #[test]
    fn test_run_disconnected() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("art.png");
        let (mut runner, shutdown) =
            runner(&path, vec![Step::Reading("rain")]);
        // Drop the only sender, so the first sleep ends the loop
        let (sender, _) = mpsc::channel();
        runner.weather.shutdown = sender;

        runner.run(&shutdown);
        assert_eq!(runner.weather.calls.get(), 1);
    }
}
