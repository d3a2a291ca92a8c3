//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::error::{PlanError, Result};

/// safe-apply - Decide which pending infrastructure changes are safe to apply together.
#[derive(Parser, Debug)]
#[command(name = "safe-apply")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the deployment declaration.
    #[arg(short, long, global = true, env = "SAFE_APPLY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, table, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the safe partial-apply plan and print the report.
    Plan {
        /// Planning inputs.
        #[command(flatten)]
        inputs: PlanInputs,

        /// Also print the -target flags to stdout.
        #[arg(short, long)]
        targets: bool,
    },

    /// Print only the -target flags for the next apply.
    Targets {
        /// Planning inputs.
        #[command(flatten)]
        inputs: PlanInputs,

        /// Exit with a failure status when changes were deferred.
        #[arg(long)]
        fail_on_deferred: bool,
    },

    /// Show the changes parsed from the plan output.
    Changes {
        /// Plan output file, or '-' for stdin.
        #[arg(long, default_value = "-")]
        changes: PathBuf,
    },

    /// Show the dependency path from the root to a resource.
    Graph {
        /// Graph export file, or '-' for stdin.
        #[arg(long)]
        graph: PathBuf,

        /// Resource address to look up.
        address: String,

        /// Start of the path (defaults to the root node).
        #[arg(long)]
        from: Option<String>,
    },

    /// Validate the deployment declaration.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },
}

/// Inputs shared by the planning commands.
#[derive(Args, Debug)]
pub struct PlanInputs {
    /// Plan output file, or '-' for stdin.
    #[arg(long, default_value = "-")]
    pub changes: PathBuf,

    /// Graph export file. Without it, dependents are not deferred.
    #[arg(long)]
    pub graph: Option<PathBuf>,
}

impl PlanInputs {
    /// Checks that at most one input is read from stdin.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::StdinConflict`] when both the plan output and
    /// the graph export are `-`.
    pub fn check_sources(&self) -> Result<()> {
        let stdin = Path::new("-");
        if self.changes == stdin && self.graph.as_deref() == Some(stdin) {
            return Err(PlanError::StdinConflict.into());
        }
        Ok(())
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Grouped, human-readable report.
    #[default]
    Text,
    /// Table of plan items.
    Table,
    /// JSON output for scripting.
    Json,
}
