mod cli;
mod input;
mod logging_setup;

use anyhow::{Context, Result};
use beatlight_control::Backend;
use beatlight_core::AudioOutput;
use clap::Parser;
use cli::Cli;
use input::{PcmReader, CHUNK_PAIRS};
use std::fs::File;
use std::io::{self, Read};
use tracing::{error, info};

fn open_input(input: &str) -> Result<Box<dyn Read>> {
    if input == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(input).with_context(|| format!("Failed to open input {}", input))?;
    Ok(Box::new(file))
}

/// Feed the whole input to `backend` between `start` and `stop`.
fn play(backend: &mut Backend, input: Box<dyn Read>, sample_rate: u32) -> Result<u64> {
    let mut pcm = PcmReader::new(input, CHUNK_PAIRS);
    backend.start(sample_rate);

    let result = loop {
        match pcm.next_chunk() {
            Ok(Some(samples)) => backend.play(samples),
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    backend.flush();
    backend.stop();
    result.context("Failed to read PCM input")?;
    Ok(pcm.total_pairs())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    let _log_guard = logging_setup::init(&config.logging)?;

    info!("=== Beatlight session started ===");
    config.validate().context("Invalid configuration")?;

    let sample_rate = config.audio.sample_rate;
    let input = open_input(&cli.input)?;
    let mut backend = Backend::init(config).context("Failed to initialise output backend")?;
    info!(
        "Playing {} at {} Hz through {}",
        cli.input,
        sample_rate,
        backend.kind()
    );

    let result = play(&mut backend, input, sample_rate);
    backend.deinit();

    match &result {
        Ok(pairs) => info!(
            "Input finished after {} frames ({:.1} s)",
            pairs,
            *pairs as f64 / f64::from(sample_rate)
        ),
        Err(e) => error!("{:#}", e),
    }
    result.map(|_| ())
}
