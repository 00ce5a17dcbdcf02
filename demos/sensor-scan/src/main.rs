//! Fetches the resource directory once, reads every advertised sensor
//! concurrently and prints the raw payloads.

use std::path::PathBuf;

use clap::Parser;

use pulse_controller::config::LoopConfig;
use pulse_controller::control::ControlLoop;
use pulse_controller::error::Error;
use pulse_controller::transport::HttpTransport;

use tracing::{Level, error};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resource directory URI. Overrides the configuration file.
    #[arg(short, long, env = "PULSE_DIRECTORY")]
    directory: Option<String>,

    /// Request timeout in milliseconds. Overrides the configuration file.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log level.
    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

impl Cli {
    fn loop_config(&self) -> Result<LoopConfig, Error> {
        let mut config = match &self.config {
            Some(path) => LoopConfig::from_file(path)?,
            None => LoopConfig::default(),
        };

        if let Some(directory) = &self.directory {
            config.directory.clone_from(directory);
        }

        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).init();

    let config = cli.loop_config()?;
    let transport = HttpTransport::new(&config.directory, config.timeout())?;
    let control = ControlLoop::new(transport, &config)?;

    println!("Requesting sensor endpoints...\n");

    let samples = control.scan().await.inspect_err(|e| {
        error!("Failed to fetch resource: {e}");
    })?;

    for sample in samples {
        println!("{sample}");
    }

    Ok(())
}
