//! CLI argument definitions using clap
//!
//! Commands:
//! - policy-resolver resolve --config <path> <short_name> <version_spec>
//! - policy-resolver validate --config <path> <name>
//! - policy-resolver list --config <path> [short_name]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Resolve policy versions and validate payloads against their schemas
#[derive(Parser, Debug)]
#[command(name = "policy-resolver")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the version that serves a request
    Resolve {
        /// Path to configuration file
        #[arg(long, default_value = "./policy-resolver.json")]
        config: PathBuf,

        /// Policy short name
        short_name: String,

        /// "major", "major.minor" or "major.minor.patch"
        version_spec: String,
    },

    /// Validate a JSON document read from stdin against a policy schema
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./policy-resolver.json")]
        config: PathBuf,

        /// Schema name, usually a resolved full name's short name
        name: String,
    },

    /// List registered policy versions
    List {
        /// Path to configuration file
        #[arg(long, default_value = "./policy-resolver.json")]
        config: PathBuf,

        /// Only this policy
        short_name: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
