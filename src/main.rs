use anyhow::Context;
use log::{info, warn, LevelFilter};
use skyloom::{
    canvas::Canvas, config::Config, mutator::RandomSource, prompt,
    runner::Runner, weather::OpenWeather,
};
use std::{io, sync::mpsc};

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_module("skyloom", LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = Config::load()?;
    info!(
        "Creating artwork based on {}, {} weather conditions",
        config.city, config.country_code
    );
    let settings = prompt::ask(&mut io::stdin().lock(), &mut io::stdout());

    let canvas = initial_canvas(&config);
    let weather = OpenWeather::new(&config);

    // Ctrl-c just flags the loop, which stops at the next sleep
    let (sender, receiver) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = sender.send(());
    })
    .context("Error setting Ctrl-c handler")?;

    Runner::new(
        config,
        settings,
        weather,
        RandomSource(rand::thread_rng()),
        canvas,
    )
    .run(&receiver);
    Ok(())
}

/// Pick up where the last run left off if asked to, otherwise start blank
fn initial_canvas(config: &Config) -> Canvas {
    let blank = || {
        Canvas::new(
            config.width,
            config.height,
            config.block_size,
            config.background,
        )
    };
    if !config.resume || !config.output.exists() {
        return blank();
    }
    match Canvas::resume(
        &config.output,
        config.width,
        config.height,
        config.block_size,
    ) {
        Ok(canvas) => {
            info!("Resuming from {}", config.output.display());
            canvas
        }
        Err(err) => {
            warn!("Can't resume, starting a blank canvas: {err:?}");
            blank()
        }
    }
}
