//! The `pulse-controller` library crate provides the network side of a
//! `pulse` control loop.
//!
//! A control loop periodically:
//!
//! - Fetches the link-format document published by a resource directory and
//!   derives the sensor and actuator endpoints it advertises
//! - Reads every sensor concurrently, tolerating individual failures
//! - Decides an actuation command from the readings through a threshold rule
//! - Writes the command to every actuator concurrently
//!
//! The wire protocol is not part of this crate: requests go through the
//! [`transport::Transport`] trait, and an HTTP implementation backed by
//! `reqwest` is provided for deployments reachable through an HTTP proxy.
//!
//! Concurrent requests of a stage are driven on the calling task, so a cycle
//! never needs shared mutable state. `tokio` provides the timer and the
//! runtime.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// The actuator driver.
pub mod actuator;
/// Control loop configuration.
pub mod config;
/// The control loop.
pub mod control;
/// The resource directory client.
pub mod directory;
/// Error management.
pub mod error;
/// The concurrent sensor poller.
pub mod poller;
/// Requests, responses and the transport they travel on.
pub mod transport;
