use std::path::Path;
use std::time::Duration;

use pulse::decision::DEFAULT_THRESHOLD;
use pulse::endpoint::RoleMarkers;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};

/// The resource directory used when none is configured.
///
/// The CoAP directory of the deployment, reached through an HTTP-CoAP proxy
/// listening on `localhost:8080` with the default `/hc/` mapping.
pub const DEFAULT_DIRECTORY: &str =
    "http://localhost:8080/hc/coap://[2001:67c:254:b0b2:affe:2000:0:1]/resource-lookup/";

/// The pause between two cycles, in milliseconds, used when none is
/// configured.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// The request timeout, in milliseconds, used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Control loop configuration.
///
/// Every field has a default, so a configuration file only needs the
/// fields it changes:
///
/// ```json
/// {
///     "directory": "http://[2001:db8::1]/resource-lookup/",
///     "threshold": 350,
///     "markers": { "sensors/accel": "Sensor", "led/color": "Actuator" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// The resource directory URI.
    ///
    /// Either a plain `http` URI of the directory, or the URI of an
    /// HTTP-CoAP proxy followed by the CoAP URI of the directory, as in
    /// `http://proxy:8080/hc/coap://[2001:db8::1]/resource-lookup/`. In the
    /// latter case the CoAP links advertised by the directory are requested
    /// through the same proxy prefix.
    pub directory: String,
    /// Readings greater than or equal to this value raise an alert.
    pub threshold: i64,
    /// The pause between the end of a cycle and the start of the next one,
    /// in milliseconds.
    pub interval_ms: u64,
    /// The request timeout, in milliseconds.
    pub timeout_ms: u64,
    /// The markers used to assign a role to each advertised path.
    pub markers: RoleMarkers,
    /// The markers selecting the sensors read by a single scan.
    pub scan_markers: RoleMarkers,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            directory: DEFAULT_DIRECTORY.into(),
            threshold: DEFAULT_THRESHOLD,
            interval_ms: DEFAULT_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            markers: RoleMarkers::default(),
            scan_markers: RoleMarkers::sensors(),
        }
    }
}

impl LoopConfig {
    /// Parses a [`LoopConfig`] from a JSON text.
    ///
    /// # Errors
    ///
    /// An error of kind [`ErrorKind::Config`] is returned if the text is not
    /// a valid configuration.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a [`LoopConfig`] from a JSON file.
    ///
    /// # Errors
    ///
    /// An error of kind [`ErrorKind::Config`] is returned if the file cannot
    /// be read or does not contain a valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Returns the pause between two cycles.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// An error of kind [`ErrorKind::Config`] is returned if the directory
    /// URI is empty, if either set of markers is empty, or if the interval or the
    /// timeout are zero.
    pub fn validate(&self) -> Result<()> {
        let error = |description: &'static str| -> Result<()> {
            Err(Error::new(ErrorKind::Config, description))
        };

        if self.directory.trim().is_empty() {
            return error("The directory URI is empty");
        }

        if self.markers.is_empty() {
            return error("No role markers defined");
        }

        if self.scan_markers.is_empty() {
            return error("No scan markers defined");
        }

        if self.interval_ms == 0 {
            return error("The interval must be greater than zero");
        }

        if self.timeout_ms == 0 {
            return error("The timeout must be greater than zero");
        }

        Ok(())
    }
}
