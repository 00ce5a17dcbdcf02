//! The data shared by every stage of a `pulse` control loop.
//!
//! This crate provides APIs to:
//!
//! - Parse the link-format document published by a resource directory and
//!   classify each advertised path as a sensor or an actuator endpoint.
//! - Extract a numeric value from the textual payload of a sensor and keep
//!   track of the readings that could not be obtained.
//! - Reduce a set of readings to an actuation command through a threshold
//!   rule, and encode that command as the payload sent to actuators.
//!
//! All functions in this crate are pure: they never perform network
//! requests, so every parser and the decision rule can be tested on their
//! own. The network side lives in the `pulse-controller` crate.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Actuation commands and their payloads.
pub mod command;
/// The threshold decision rule.
pub mod decision;
/// Endpoints, roles and directory snapshots.
pub mod endpoint;
/// Link-format parsing.
pub mod link;
/// Sensor readings and value extraction.
pub mod reading;
