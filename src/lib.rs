//! policy-resolver - version resolution and schema validation for a policy runtime
//!
//! - [`registry`]: which loaded version of a policy serves a request
//! - [`schema`]: compiled, cached JSON schemas for request payloads
//! - [`observability`]: tracing setup and counters
//! - [`config`]: runtime configuration file
//! - [`cli`]: command-line front end

pub mod cli;
pub mod config;
pub mod observability;
pub mod registry;
pub mod schema;
