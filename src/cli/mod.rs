//! CLI module for the Airlift deploy tool.
//!
//! This module provides the command-line interface for deploying
//! applications to the hosting platform.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
