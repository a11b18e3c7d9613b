//! CLI subcommand implementations.

pub mod catalog;
pub mod entries;
pub mod export;
pub mod report;
pub mod serve;
pub mod timer;
mod util;
