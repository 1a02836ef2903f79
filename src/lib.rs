//! Core library for the `trafficgen` CLI.
//!
//! This crate provides the building blocks used by the binary: CLI argument
//! types, configuration loading and presets, the weighted endpoint catalog,
//! the rate dispatcher and HTTP transport, window metrics, and the run
//! lifecycle. The primary user-facing interface is the `trafficgen`
//! command-line application; library APIs may evolve as the CLI grows.
pub mod args;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod logger;
pub mod metrics;
pub mod shutdown;
pub mod shutdown_handlers;

#[cfg(test)]
mod test_support;

#[cfg(feature = "fuzzing")]
pub mod fuzzing;
