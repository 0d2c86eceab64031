//! Version resolution registry
//!
//! Many versions of the same policy can be loaded at once. The dynamic loader
//! registers and removes them as they appear on or vanish from disk; the
//! request path asks the index which concrete version should serve a call.
//!
//! # Resolution rules
//!
//! - `"1.2"` or `"1.2.3"`: highest patch among exact matches, served when it is
//!   `ACTIVE` or `AVAILABLE`. A lower patch is never used as a fallback.
//! - `"1"`: opt-in. Per minor line take the highest patch, keep it only when
//!   `ACTIVE`, then serve the highest minor line left.
//! - A short name and version are bound to a single full name at a time.

mod errors;
mod index;
mod record;

pub use errors::{RegistryError, RegistryResult};
pub use index::{ResolverConfig, VersionIndex};
pub use record::{ActivationStatus, VersionRecord, VersionSpec};
