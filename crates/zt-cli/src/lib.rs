//! Time tracker CLI library.
//!
//! This crate provides the `zt` command-line interface and the configuration
//! it shares with the HTTP server.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, EditArgs, PeriodArgs, RefArgs};
pub use config::{Config, Session};
