use crate::command::Command;
use crate::reading::Reading;

/// The threshold used when none is configured.
pub const DEFAULT_THRESHOLD: i64 = 500;

/// Reduces the readings of a cycle to a [`Command`].
///
/// The result is [`Command::Alert`] if any reading value is greater than or
/// equal to `threshold`, [`Command::Normal`] otherwise.
///
/// Invalid readings take part with the sentinel value `0`. With a positive
/// threshold, a cycle where every sensor fails, or where there are no
/// sensors at all, therefore yields [`Command::Normal`]: a failed sensor
/// never raises an alert on its own.
#[must_use]
pub fn decide(readings: &[Reading], threshold: i64) -> Command {
    if readings.iter().any(|reading| reading.value() >= threshold) {
        Command::Alert
    } else {
        Command::Normal
    }
}
