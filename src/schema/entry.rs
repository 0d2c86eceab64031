//! Compiled schema entries

use std::collections::BTreeSet;
use std::fmt;

use jsonschema::JSONSchema;
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};

/// A compiled schema and the raw text it was compiled from.
///
/// Built once per cache fill and never mutated; the cache hands out
/// `Arc<SchemaCacheEntry>` so concurrent validators share one instance.
pub struct SchemaCacheEntry {
    name: String,
    source: String,
    compiled: JSONSchema,
}

impl SchemaCacheEntry {
    /// Parse and compile raw schema text for `name`.
    pub fn compile(name: impl Into<String>, source: String) -> SchemaResult<Self> {
        let name = name.into();
        let document: Value = serde_json::from_str(&source)
            .map_err(|e| SchemaError::invalid_schema(&name, format!("invalid JSON: {}", e)))?;
        let compiled = JSONSchema::compile(&document)
            .map_err(|e| SchemaError::invalid_schema(&name, e.to_string()))?;
        Ok(Self {
            name,
            source,
            compiled,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw schema text as returned by the source
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn compiled(&self) -> &JSONSchema {
        &self.compiled
    }

    /// Violation messages for `document`; empty when it conforms.
    pub fn validate(&self, document: &Value) -> BTreeSet<String> {
        match self.compiled.validate(document) {
            Ok(()) => BTreeSet::new(),
            Err(errors) => errors.map(|e| e.to_string()).collect(),
        }
    }
}

impl fmt::Debug for SchemaCacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCacheEntry")
            .field("name", &self.name)
            .field("source_len", &self.source.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaErrorCode;
    use serde_json::json;

    const ORDER_SCHEMA: &str = r#"{
        "type": "object",
        "required": ["order_id", "amount"],
        "properties": {
            "order_id": { "type": "string" },
            "amount": { "type": "number", "minimum": 0 }
        }
    }"#;

    #[test]
    fn test_compile_and_validate() {
        let entry = SchemaCacheEntry::compile("orders", ORDER_SCHEMA.to_string()).unwrap();
        assert_eq!(entry.name(), "orders");
        assert_eq!(entry.source(), ORDER_SCHEMA);

        let ok = json!({ "order_id": "o-1", "amount": 12.5 });
        assert!(entry.validate(&ok).is_empty());
    }

    #[test]
    fn test_violations_reported() {
        let entry = SchemaCacheEntry::compile("orders", ORDER_SCHEMA.to_string()).unwrap();

        let bad = json!({ "order_id": 7, "amount": -1 });
        let violations = entry.validate(&bad);
        assert_eq!(violations.len(), 2);

        let missing = json!({ "order_id": "o-1" });
        let violations = entry.validate(&missing);
        assert_eq!(violations.len(), 1);
        assert!(violations.iter().next().unwrap().contains("amount"));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let err = SchemaCacheEntry::compile("orders", "{not json".to_string()).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::PolicySchemaFetchFailed);
        assert!(err.cause().unwrap().contains("invalid JSON"));
    }

    #[test]
    fn test_invalid_schema_rejected() {
        let err = SchemaCacheEntry::compile("orders", r#"{"type": 12}"#.to_string()).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::PolicySchemaFetchFailed);
        assert_eq!(err.name(), Some("orders"));
    }
}
