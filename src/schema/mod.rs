//! Schema validation cache
//!
//! Every policy version may carry a JSON schema for its request payloads.
//! Fetching and compiling a schema is expensive and may have side effects, so
//! compiled schemas are memoized per policy name.
//!
//! # Guarantees
//!
//! - At most one concurrent fetch per name
//! - Failed fetches are never cached
//! - Bounded size with LRU eviction
//! - `purge_cache` forces a fresh fetch on next access

mod cache;
mod entry;
mod errors;
mod source;
mod validator;

pub use cache::{SchemaCache, SchemaCacheConfig, DEFAULT_CAPACITY};
pub use entry::SchemaCacheEntry;
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use source::{DirectorySchemaSource, SchemaSource, SourceError};
pub use validator::Validator;
