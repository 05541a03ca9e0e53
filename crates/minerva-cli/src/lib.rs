//! Minerva CLI - command-line interface for the Minerva OER harvester
//!
//! [`config`] holds the clap definitions and [`pipeline`] the per-source
//! steps the `minerva` binary strings together.

pub mod config;
pub mod pipeline;

pub use config::{Command, Config, DEFAULT_TARGET_TEMPLATE};
pub use pipeline::OutputLayout;
