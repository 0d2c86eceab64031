//! Policy catalog
//!
//! Startup list of policy versions, registered into the index in file order.
//!
//! ```json
//! {"policies": [
//!   {"short_name": "svc_a", "version": "1.2.0", "status": "ACTIVE"},
//!   {"short_name": "svc_a", "full_name": "svc_a-canary/1.3.0", "version": "1.3.0", "status": "AVAILABLE"}
//! ]}
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::errors::{CliError, CliResult};
use crate::registry::{ActivationStatus, RegistryResult, VersionIndex, VersionRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub policies: Vec<PolicyManifest>,
}

/// One policy version as declared in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyManifest {
    pub short_name: String,

    /// Defaults to `<short_name>/<version>`
    #[serde(default)]
    pub full_name: Option<String>,

    /// `major.minor.patch`
    pub version: String,

    pub status: ActivationStatus,
}

impl PolicyManifest {
    pub fn to_record(&self) -> RegistryResult<VersionRecord> {
        match &self.full_name {
            Some(full_name) => VersionRecord::new(&self.short_name, full_name, &self.version),
            None => VersionRecord::versioned(&self.short_name, &self.version),
        }
    }
}

impl Catalog {
    /// Load a catalog file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::catalog_error(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| CliError::catalog_error(format!("Invalid catalog JSON: {}", e)))
    }

    /// Register every policy; stops at the first invalid or conflicting entry.
    pub fn register_all(&self, index: &VersionIndex) -> CliResult<usize> {
        for manifest in &self.policies {
            let record = manifest.to_record()?;
            index.register(record, manifest.status)?;
        }
        info!(policies = self.policies.len(), "catalog registered");
        Ok(self.policies.len())
    }
}
