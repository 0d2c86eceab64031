//! Request payload validation
//!
//! Thin facade over [`SchemaCache`]: the request path resolves a policy
//! version, then validates the payload against that version's schema before
//! running it.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::cache::SchemaCache;
use super::errors::{SchemaError, SchemaResult};

/// Validates documents against cached policy schemas.
///
/// Cloning is cheap; clones share the cache.
#[derive(Clone)]
pub struct Validator {
    cache: Arc<SchemaCache>,
}

impl Validator {
    pub fn new(cache: Arc<SchemaCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// Violation messages for `document` under the schema of `name`.
    ///
    /// An empty set means the document conforms. Fetch failures are errors,
    /// never an empty set.
    pub fn validate(&self, name: &str, document: &Value) -> SchemaResult<BTreeSet<String>> {
        let violations = self.cache.validate(name, document)?;
        debug!(name, violations = violations.len(), "document validated");
        Ok(violations)
    }

    /// Like [`Validator::validate`], but any violation is an error.
    ///
    /// # Errors
    ///
    /// `POLICY_SCHEMA_VALIDATION_FAILED` carrying the violations, or any
    /// error from fetching the schema.
    pub fn ensure_valid(&self, name: &str, document: &Value) -> SchemaResult<()> {
        let violations = self.validate(name, document)?;
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::validation_failed(name, violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DirectorySchemaSource, SchemaCacheConfig, SchemaErrorCode};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn setup_validator() -> (TempDir, Validator) {
        let temp_dir = TempDir::new().unwrap();
        let schema = json!({
            "type": "object",
            "required": ["user", "active"],
            "properties": {
                "user": { "type": "string" },
                "active": { "type": "boolean" }
            },
            "additionalProperties": false
        });
        fs::write(temp_dir.path().join("users.json"), schema.to_string()).unwrap();

        let source = Arc::new(DirectorySchemaSource::new(temp_dir.path()));
        let cache = Arc::new(SchemaCache::new(source, SchemaCacheConfig::default()));
        (temp_dir, Validator::new(cache))
    }

    #[test]
    fn test_valid_document_passes() {
        let (_temp_dir, validator) = setup_validator();

        let doc = json!({ "user": "alice", "active": true });
        assert!(validator.validate("users", &doc).unwrap().is_empty());
        assert!(validator.ensure_valid("users", &doc).is_ok());
    }

    #[test]
    fn test_extra_field_rejected() {
        let (_temp_dir, validator) = setup_validator();

        let doc = json!({ "user": "alice", "active": true, "unknown_field": 1 });
        let violations = validator.validate("users", &doc).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations.iter().next().unwrap().contains("unknown_field"));
    }

    #[test]
    fn test_ensure_valid_reports_all_violations() {
        let (_temp_dir, validator) = setup_validator();

        let doc = json!({ "user": 123, "active": "yes" });
        let err = validator.ensure_valid("users", &doc).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::PolicySchemaValidationFailed);
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_unknown_schema_is_not_a_violation() {
        let (_temp_dir, validator) = setup_validator();

        let err = validator.validate("nonexistent", &json!({})).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::PolicySchemaNotFound);
    }

    #[test]
    fn test_clones_share_cache() {
        let (_temp_dir, validator) = setup_validator();
        let other = validator.clone();

        validator.validate("users", &json!({ "user": "a", "active": false })).unwrap();
        assert!(other.cache().contains("users"));
    }
}
