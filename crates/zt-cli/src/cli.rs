//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Time tracker with a single running timer, manual entries, reports and
/// CSV/PDF exports.
#[derive(Debug, Parser)]
#[command(name = "zt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API.
    Serve {
        /// Address to bind, overriding the configured one.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Start a timer.
    Start {
        #[command(flatten)]
        refs: RefArgs,

        /// What you are working on.
        #[arg(short, long)]
        description: Option<String>,

        /// Track a break instead of work.
        #[arg(long = "break")]
        is_break: bool,
    },

    /// Stop the running timer.
    Stop {
        /// Entry to stop. Defaults to the running timer.
        #[arg(long)]
        id: Option<String>,

        /// Replace the description.
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Show the running timer.
    Status,

    /// Add a completed entry.
    Add {
        /// Start, e.g. `2024-03-04 09:00` or `2 hours ago`.
        #[arg(long)]
        start: String,

        /// End, e.g. `2024-03-04 10:30` or `now`.
        #[arg(long)]
        end: String,

        #[command(flatten)]
        refs: RefArgs,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long = "break")]
        is_break: bool,
    },

    /// Change an entry.
    Edit(EditArgs),

    /// Delete an entry.
    Rm {
        /// Entry to delete.
        id: String,
    },

    /// List entries.
    List {
        #[command(flatten)]
        period: PeriodArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show an aggregated report.
    Report {
        #[command(flatten)]
        period: PeriodArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export entries as CSV, or as report data for PDF rendering.
    Export {
        #[command(flatten)]
        period: PeriodArgs,

        /// `csv` or `pdf`.
        #[arg(long, default_value = "csv")]
        format: String,

        /// File to write, `-` for stdout. CSV defaults to
        /// `zeiterfassung_<date>.csv`, report data to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show totals for today, this week and this month.
    Stats {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Register or rename a project.
    Project {
        id: String,
        name: String,

        /// Display color, e.g. `#0d6efd`.
        #[arg(long)]
        color: Option<String>,
    },

    /// Register or rename a task.
    Task { id: String, title: String },
}

/// Optional project and task references.
#[derive(Debug, Clone, Default, Args)]
pub struct RefArgs {
    #[arg(short, long)]
    pub project: Option<String>,

    #[arg(short, long)]
    pub task: Option<String>,
}

/// Period selection shared by list, report and export.
#[derive(Debug, Clone, Default, Args)]
pub struct PeriodArgs {
    /// today, yesterday, week, last_week, month, last_month, year or custom.
    #[arg(long)]
    pub period: Option<String>,

    /// First day of a custom period (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<String>,

    /// Last day of a custom period (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<String>,

    /// Only entries of this project.
    #[arg(short, long)]
    pub project: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct EditArgs {
    /// Entry to change.
    pub id: String,

    #[arg(long)]
    pub start: Option<String>,

    #[arg(long)]
    pub end: Option<String>,

    #[arg(short, long, conflicts_with = "clear_project")]
    pub project: Option<String>,

    /// Remove the project reference.
    #[arg(long)]
    pub clear_project: bool,

    #[arg(short, long, conflicts_with = "clear_task")]
    pub task: Option<String>,

    /// Remove the task reference.
    #[arg(long)]
    pub clear_task: bool,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Mark as break (`true`) or work (`false`).
    #[arg(long = "break")]
    pub is_break: Option<bool>,
}
