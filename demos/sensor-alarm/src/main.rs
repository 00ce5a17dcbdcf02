//! Polls the sensors advertised by a resource directory on a fixed interval
//! and switches every advertised led to red when a reading reaches the
//! threshold, to white otherwise.
//!
//! The loop runs until Ctrl-C is pressed.

use std::path::PathBuf;

use clap::Parser;

use pulse_controller::config::LoopConfig;
use pulse_controller::control::ControlLoop;
use pulse_controller::error::Error;
use pulse_controller::transport::HttpTransport;

use tokio_util::sync::CancellationToken;

use tracing::{Level, error, info};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resource directory URI. Overrides the configuration file.
    #[arg(short, long, env = "PULSE_DIRECTORY")]
    directory: Option<String>,

    /// Readings greater than or equal to this value switch the leds to red.
    /// Overrides the configuration file.
    #[arg(short, long, env = "PULSE_THRESHOLD", allow_negative_numbers = true)]
    threshold: Option<i64>,

    /// Pause between two cycles in milliseconds. Overrides the configuration
    /// file.
    #[arg(short, long)]
    interval_ms: Option<u64>,

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

        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }

        if let Some(interval_ms) = self.interval_ms {
            config.interval_ms = interval_ms;
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

    let cancellation_token = CancellationToken::new();

    let shutdown = cancellation_token.clone();
    let _signal = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping after the current cycle");
                shutdown.cancel();
            }
            Err(e) => error!("Unable to listen for the shutdown signal: {e}"),
        }
    });

    let cycles = control.run(cancellation_token).await;
    info!("Ran {cycles} cycles");

    Ok(())
}
