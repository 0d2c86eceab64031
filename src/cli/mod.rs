//! CLI module
//!
//! Provides command-line access to:
//! - resolve: pick the version serving a request
//! - validate: check a payload against a policy schema
//! - list: show registered versions

mod args;
mod catalog;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use catalog::{Catalog, PolicyManifest};
pub use commands::{list, resolve, run, run_command, validate, Runtime};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_document, write_error, write_response};
