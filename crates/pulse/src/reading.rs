use std::sync::LazyLock;

use regex::Regex;

use crate::endpoint::Endpoint;

/// The value carried by a reading that could not be obtained.
pub const SENTINEL_VALUE: i64 = 0;

// Key which precedes the value extracted from a sensor payload.
const VALUE_KEY: &str = "y:";

static VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"y:([+-]?[0-9]+)").expect("valid value regex"));

/// Errors raised while decoding a sensor payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload does not contain a value.
    MissingValue,
    /// The value does not fit in a 64-bit signed integer.
    OutOfRange,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingValue => write!(f, "no `{VALUE_KEY}<integer>` value in payload"),
            Self::OutOfRange => write!(f, "value out of range"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Errors which turn a reading into an invalid one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The request could not be performed.
    Request(String),
    /// The endpoint answered with a failure status code.
    Status(u16),
    /// The payload could not be decoded.
    Decode(DecodeError),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(e) => write!(f, "request failed: {e}"),
            Self::Status(code) => write!(f, "failure status code {code}"),
            Self::Decode(e) => write!(f, "decode failed: {e}"),
        }
    }
}

impl std::error::Error for ReadError {}

impl From<DecodeError> for ReadError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

/// Extracts the value following `y:` from a sensor payload.
///
/// The value is an optional sign followed by one or more decimal digits.
/// The first `y:` followed by a well-formed integer is used, so payloads
/// such as `x:0, y:-12, z:1003` produce `-12`.
///
/// # Errors
///
/// [`DecodeError::MissingValue`] if no `y:` is followed by an integer,
/// [`DecodeError::OutOfRange`] if the integer overflows an `i64`.
pub fn extract_y(payload: &str) -> Result<i64, DecodeError> {
    let value = VALUE_RE
        .captures(payload)
        .and_then(|captures| captures.get(1))
        .ok_or(DecodeError::MissingValue)?;

    value
        .as_str()
        .parse::<i64>()
        .map_err(|_| DecodeError::OutOfRange)
}

/// A value read from a sensor endpoint.
///
/// A reading is always traceable to its endpoint. When the value could not
/// be obtained, the reading is kept as invalid and reports
/// [`SENTINEL_VALUE`] so that it still counts in every aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    endpoint: Endpoint,
    outcome: Result<i64, ReadError>,
}

impl Reading {
    /// Creates a valid [`Reading`].
    #[must_use]
    #[inline]
    pub const fn new(endpoint: Endpoint, value: i64) -> Self {
        Self {
            endpoint,
            outcome: Ok(value),
        }
    }

    /// Creates an invalid [`Reading`] carrying the sentinel value.
    #[must_use]
    #[inline]
    pub const fn failed(endpoint: Endpoint, error: ReadError) -> Self {
        Self {
            endpoint,
            outcome: Err(error),
        }
    }

    /// Creates a [`Reading`] from the outcome of a read.
    #[must_use]
    #[inline]
    pub fn from_outcome(endpoint: Endpoint, outcome: Result<i64, ReadError>) -> Self {
        Self { endpoint, outcome }
    }

    /// Returns the source [`Endpoint`].
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the value, or [`SENTINEL_VALUE`] for an invalid reading.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.outcome.as_ref().map_or(SENTINEL_VALUE, |value| *value)
    }

    /// Checks whether the value was obtained.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Returns the error of an invalid reading.
    #[must_use]
    pub fn error(&self) -> Option<&ReadError> {
        self.outcome.as_ref().err()
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            Ok(value) => write!(f, "{} -> {value}", self.endpoint),
            Err(e) => write!(f, "{} -> ERROR: {e}", self.endpoint),
        }
    }
}

/// Aggregate counters over the readings of a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadingsSummary {
    /// Number of readings.
    pub total: usize,
    /// Number of valid readings.
    pub valid: usize,
    /// Number of invalid readings.
    pub invalid: usize,
    /// Highest value, invalid readings counting as [`SENTINEL_VALUE`].
    pub max: Option<i64>,
}

impl ReadingsSummary {
    /// Summarizes a set of readings.
    #[must_use]
    pub fn new(readings: &[Reading]) -> Self {
        let valid = readings.iter().filter(|reading| reading.is_valid()).count();
        Self {
            total: readings.len(),
            valid,
            invalid: readings.len() - valid,
            max: readings.iter().map(Reading::value).max(),
        }
    }
}
