use std::time::Duration;

use pulse::command::Command;
use pulse::decision::decide;
use pulse::endpoint::Snapshot;
use pulse::reading::{DecodeError, Reading, ReadingsSummary, extract_y};

use tokio_util::sync::CancellationToken;

use tracing::{debug, error, info};

use crate::actuator::{WriteAck, apply_all};
use crate::config::LoopConfig;
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::poller::{Sample, poll_all, scan_all};
use crate::transport::Transport;

/// A function extracting a numeric value from a sensor payload.
pub type Extractor = fn(&str) -> std::result::Result<i64, DecodeError>;

/// The states of a continuous control loop.
///
/// A cycle goes through the states in declaration order, then the loop
/// sleeps and starts over. A failed discovery jumps straight to
/// [`LoopState::Sleeping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Fetching the resource directory.
    Discovering,
    /// Reading every sensor.
    Polling,
    /// Reducing the readings to a command.
    Deciding,
    /// Writing the command to every actuator.
    Acting,
    /// Waiting for the next cycle.
    Sleeping,
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Discovering => "DISCOVERING",
            Self::Polling => "POLLING",
            Self::Deciding => "DECIDING",
            Self::Acting => "ACTING",
            Self::Sleeping => "SLEEPING",
        })
    }
}

#[inline]
fn transition(state: LoopState) {
    debug!("Control loop state: {state}");
}

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The directory could not be fetched, no other stage ran.
    Skipped(Error),
    /// The directory advertised neither sensors nor actuators.
    Idle,
    /// The command was acknowledged by every actuator.
    Applied(Vec<WriteAck>),
    /// At least one write failed. Every write of the cycle was still issued.
    ActuationFailed(Error),
}

/// The result of a single discovery, poll, decide and act pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// The endpoints discovered in this cycle.
    pub snapshot: Snapshot,
    /// One reading per sensor of the snapshot.
    pub readings: Vec<Reading>,
    /// The decided command, if the decision stage ran.
    pub command: Option<Command>,
    /// How the cycle ended.
    pub outcome: CycleOutcome,
}

impl CycleReport {
    fn skipped(error: Error) -> Self {
        Self {
            snapshot: Snapshot::default(),
            readings: Vec::new(),
            command: None,
            outcome: CycleOutcome::Skipped(error),
        }
    }

    /// Summarizes the readings of the cycle.
    #[must_use]
    pub fn summary(&self) -> ReadingsSummary {
        ReadingsSummary::new(&self.readings)
    }
}

/// A control loop bound to a [`Transport`].
///
/// Each cycle discovers the endpoints advertised by the resource directory,
/// reads all sensors concurrently, decides a [`Command`] through the
/// threshold rule and writes it to all actuators concurrently. Sensors and
/// actuators of a cycle always come from the same directory fetch.
#[derive(Debug)]
pub struct ControlLoop<T> {
    transport: T,
    directory: Directory,
    scan_directory: Directory,
    threshold: i64,
    interval: Duration,
    extractor: Extractor,
}

impl<T: Transport> ControlLoop<T> {
    /// Creates a [`ControlLoop`] from a [`Transport`] and a [`LoopConfig`].
    ///
    /// Sensor payloads are decoded with [`extract_y`].
    ///
    /// # Errors
    ///
    /// An error is returned if the configuration is invalid.
    pub fn new(transport: T, config: &LoopConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            transport,
            directory: Directory::new(config.directory.as_str()).markers(config.markers.clone()),
            scan_directory: Directory::new(config.directory.as_str())
                .markers(config.scan_markers.clone()),
            threshold: config.threshold,
            interval: config.interval(),
            extractor: extract_y,
        })
    }

    /// Sets the [`Extractor`] used to decode sensor payloads.
    #[must_use]
    #[inline]
    pub fn extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Returns the [`Transport`].
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Discovers the endpoints and reads the raw payload of every sensor
    /// once, without deciding nor actuating anything.
    ///
    /// Sensors are selected by the scan markers of the configuration, so
    /// a scan may read sensors the continuous loop ignores.
    ///
    /// # Errors
    ///
    /// An error is returned if the directory cannot be fetched. Sensor
    /// failures are reported inside the returned samples.
    pub async fn scan(&self) -> Result<Vec<Sample>> {
        let snapshot = self.scan_directory.snapshot(&self.transport).await?;
        info!("Requesting {} sensor endpoints", snapshot.sensors.len());

        Ok(scan_all(&self.transport, &snapshot.sensors).await)
    }

    /// Runs a single cycle.
    ///
    /// A cycle never fails as a whole: a directory failure skips the other
    /// stages, sensor failures become sentinel readings, and an actuator
    /// failure fails the actuation stage. Every failure is logged and
    /// recorded in the returned [`CycleReport`].
    pub async fn cycle(&self) -> CycleReport {
        transition(LoopState::Discovering);
        let snapshot = match self.directory.snapshot(&self.transport).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Skip cycle: {e}");
                return CycleReport::skipped(e);
            }
        };

        if snapshot.is_empty() {
            info!("No sensors nor actuators advertised, nothing to do");
            return CycleReport {
                snapshot,
                readings: Vec::new(),
                command: None,
                outcome: CycleOutcome::Idle,
            };
        }

        transition(LoopState::Polling);
        let readings = poll_all(&self.transport, &snapshot.sensors, self.extractor).await;

        transition(LoopState::Deciding);
        let command = decide(&readings, self.threshold);
        let summary = ReadingsSummary::new(&readings);
        info!(
            "Readings: {} valid, {} invalid, max {:?}, threshold {} -> {command}",
            summary.valid, summary.invalid, summary.max, self.threshold
        );

        transition(LoopState::Acting);
        let outcome = match apply_all(&self.transport, &snapshot.actuators, command).await {
            Ok(acks) => CycleOutcome::Applied(acks),
            Err(e) => {
                error!("Actuation stopped: {e}");
                CycleOutcome::ActuationFailed(e)
            }
        };

        CycleReport {
            snapshot,
            readings,
            command: Some(command),
            outcome,
        }
    }

    /// Runs cycles until the cancellation token is cancelled, returning the
    /// number of completed cycles.
    ///
    /// After each cycle the loop sleeps for the configured interval,
    /// whatever the duration of the cycle itself. Cancellation is observed
    /// before a cycle starts and while sleeping: requests of a running cycle
    /// are never interrupted.
    pub async fn run(&self, cancellation_token: CancellationToken) -> usize {
        info!(
            "Control loop started on `{}`, interval {:?}",
            self.directory.uri(),
            self.interval
        );

        let mut cycles = 0;
        while !cancellation_token.is_cancelled() {
            let report = self.cycle().await;
            cycles += 1;
            debug!("Cycle {cycles} ended with {:?}", report.outcome);

            transition(LoopState::Sleeping);
            tokio::select! {
                // Use the cancellation token to stop the loop
                () = cancellation_token.cancelled() => { break; }
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Control loop stopped after {cycles} cycles");
        cycles
    }
}
