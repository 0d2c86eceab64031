//! CLI command implementations
//!
//! Each command boots a fresh runtime from the config file: logging, the
//! version index filled from the catalog, and the schema cache. Boot failures
//! abort the command; request-level failures are written as error responses.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::RuntimeConfig;
use crate::observability::{init_logging, MetricsRegistry};
use crate::registry::{ActivationStatus, RegistryError, VersionIndex, VersionRecord};
use crate::schema::{DirectorySchemaSource, SchemaCache, Validator};

use super::args::Command;
use super::catalog::Catalog;
use super::errors::CliResult;
use super::io::{read_document, write_error, write_response};

/// Everything a command needs, wired from one config file
pub struct Runtime {
    pub index: VersionIndex,
    pub validator: Validator,
    pub metrics: Arc<MetricsRegistry>,
}

impl Runtime {
    /// Build the runtime without touching the global logger
    pub fn from_config(config: &RuntimeConfig) -> CliResult<Self> {
        let metrics = Arc::new(MetricsRegistry::new());

        let index = VersionIndex::with_metrics(config.resolver_config(), Arc::clone(&metrics));
        Catalog::load(&config.catalog_path)?.register_all(&index)?;

        let source = Arc::new(DirectorySchemaSource::new(&config.schema_dir));
        let cache = SchemaCache::with_metrics(source, config.schema_cache_config(), Arc::clone(&metrics));

        Ok(Self {
            index,
            validator: Validator::new(Arc::new(cache)),
            metrics,
        })
    }
}

fn boot(config_path: &Path) -> CliResult<Runtime> {
    let config = RuntimeConfig::load(config_path)?;
    init_logging(&config.log_level, config.log_format);
    Runtime::from_config(&config)
}

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Resolve {
            config,
            short_name,
            version_spec,
        } => resolve(&boot(&config)?, &short_name, &version_spec),
        Command::Validate { config, name } => {
            let runtime = boot(&config)?;
            let document = read_document()?;
            validate(&runtime, &name, &document)
        }
        Command::List { config, short_name } => list(&boot(&config)?, short_name.as_deref()),
    }
}

/// Resolve a version spec and print the chosen version, or null.
pub fn resolve(runtime: &Runtime, short_name: &str, version_spec: &str) -> CliResult<()> {
    match runtime.index.resolve(short_name, version_spec) {
        Ok(resolved) => {
            let status = match &resolved {
                Some(record) => runtime.index.status(record)?,
                None => None,
            };
            write_response(json!({
                "short_name": short_name,
                "version_spec": version_spec,
                "resolved": resolved.as_ref().map(|r| record_json(r, status)),
            }))
        }
        Err(e @ RegistryError::InvalidVersionSpec { .. }) => {
            write_error("POLICY_INVALID_VERSION_SPEC", &e.to_string())
        }
        Err(e) => write_error("POLICY_REGISTRY_INTERNAL", &e.to_string()),
    }
}

/// Validate a document and print the violations.
pub fn validate(runtime: &Runtime, name: &str, document: &Value) -> CliResult<()> {
    match runtime.validator.validate(name, document) {
        Ok(violations) => write_response(json!({
            "name": name,
            "valid": violations.is_empty(),
            "violations": violations,
        })),
        Err(e) => write_error(e.code().code(), &e.to_string()),
    }
}

/// List registered versions of one policy, or of every policy.
pub fn list(runtime: &Runtime, short_name: Option<&str>) -> CliResult<()> {
    let names = match short_name {
        Some(name) => vec![name.to_string()],
        None => runtime.index.short_names()?,
    };

    let mut policies = serde_json::Map::new();
    for name in names {
        let versions: Vec<Value> = runtime
            .index
            .versions(&name)?
            .iter()
            .map(|(record, status)| record_json(record, Some(*status)))
            .collect();
        policies.insert(name, Value::Array(versions));
    }
    write_response(Value::Object(policies))
}

fn record_json(record: &VersionRecord, status: Option<ActivationStatus>) -> Value {
    json!({
        "short_name": record.short_name(),
        "full_name": record.full_name(),
        "version": record.patch_version_string(),
        "status": status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn setup(ambiguous: bool) -> (TempDir, RuntimeConfig) {
        let temp_dir = TempDir::new().unwrap();
        let schema_dir = temp_dir.path().join("schemas");
        fs::create_dir_all(&schema_dir).unwrap();
        fs::write(schema_dir.join("svc_a.json"), r#"{"type":"object","required":["id"]}"#).unwrap();

        let catalog_path = temp_dir.path().join("catalog.json");
        fs::write(
            &catalog_path,
            r#"{"policies":[
                {"short_name":"svc_a","version":"1.0.3","status":"ACTIVE"},
                {"short_name":"svc_a","version":"1.1.0","status":"AVAILABLE"}
            ]}"#,
        )
        .unwrap();

        let config = RuntimeConfig {
            catalog_path,
            schema_dir,
            ambiguous_major_resolution: ambiguous,
            schema_cache_capacity: 10,
            log_level: "info".into(),
            log_format: Default::default(),
        };
        (temp_dir, config)
    }

    #[test]
    fn test_runtime_wires_flag_and_catalog() {
        let (_temp_dir, config) = setup(true);
        let runtime = Runtime::from_config(&config).unwrap();

        let resolved = runtime.index.resolve("svc_a", "1").unwrap().unwrap();
        assert_eq!(resolved.patch_version_string(), "1.0.3");
        assert_eq!(runtime.metrics.snapshot().registrations, 2);
    }

    #[test]
    fn test_runtime_validator_reads_schema_dir() {
        let (_temp_dir, config) = setup(false);
        let runtime = Runtime::from_config(&config).unwrap();

        let violations = runtime.validator.validate("svc_a", &json!({})).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(runtime.metrics.snapshot().schema_fetches, 1);
    }

    #[test]
    fn test_missing_catalog_fails_boot() {
        let (_temp_dir, mut config) = setup(false);
        config.catalog_path = PathBuf::from("/nonexistent/catalog.json");

        let err = Runtime::from_config(&config).err().unwrap();
        assert_eq!(err.code_str(), "POLICY_CLI_CATALOG_ERROR");
    }

    #[test]
    fn test_record_json_shape() {
        let record = VersionRecord::versioned("svc_a", "1.2.3").unwrap();
        let value = record_json(&record, Some(ActivationStatus::Available));
        assert_eq!(value["full_name"], "svc_a/1.2.3");
        assert_eq!(value["version"], "1.2.3");
        assert_eq!(value["status"], "AVAILABLE");
    }
}
