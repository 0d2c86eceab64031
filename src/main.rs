//! policy-resolver CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`; all wiring lives there.
//! Prints errors to stderr and exits non-zero on failure.

use policy_resolver::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
