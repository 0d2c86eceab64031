//! Observability for the policy runtime
//!
//! - Structured logging through `tracing`
//! - Passive counters for the version index and schema cache
//!
//! # Usage
//!
//! ```ignore
//! use policy_resolver::observability::{init_logging, LogFormat, MetricsRegistry};
//!
//! init_logging("info", LogFormat::Json);
//!
//! let metrics = std::sync::Arc::new(MetricsRegistry::new());
//! // hand clones of `metrics` to VersionIndex::with_metrics / SchemaCache::with_metrics
//! println!("{:?}", metrics.snapshot());
//! ```

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
