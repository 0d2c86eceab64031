//! Schema error types
//!
//! Error codes:
//! - POLICY_SCHEMA_NOT_FOUND (404)
//! - POLICY_SCHEMA_FETCH_FAILED (502)
//! - POLICY_SCHEMA_VALIDATION_FAILED (422)
//! - POLICY_SCHEMA_INTERNAL (500)

use std::collections::BTreeSet;
use std::fmt;

use super::source::SourceError;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// No schema exists for the policy name
    PolicySchemaNotFound,
    /// The fetch pipeline failed, or returned text that does not compile
    PolicySchemaFetchFailed,
    /// Document violates the schema
    PolicySchemaValidationFailed,
    /// Cache bookkeeping failure
    PolicySchemaInternal,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::PolicySchemaNotFound => "POLICY_SCHEMA_NOT_FOUND",
            SchemaErrorCode::PolicySchemaFetchFailed => "POLICY_SCHEMA_FETCH_FAILED",
            SchemaErrorCode::PolicySchemaValidationFailed => "POLICY_SCHEMA_VALIDATION_FAILED",
            SchemaErrorCode::PolicySchemaInternal => "POLICY_SCHEMA_INTERNAL",
        }
    }

    /// HTTP status the request layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            SchemaErrorCode::PolicySchemaNotFound => 404,
            SchemaErrorCode::PolicySchemaFetchFailed => 502,
            SchemaErrorCode::PolicySchemaValidationFailed => 422,
            SchemaErrorCode::PolicySchemaInternal => 500,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    /// Error code
    code: SchemaErrorCode,
    /// Human-readable message
    message: String,
    /// Policy name the schema belongs to
    name: Option<String>,
    /// Underlying failure, rendered
    cause: Option<String>,
    /// Violation messages for validation failures
    violations: BTreeSet<String>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, name: Option<String>, message: String) -> Self {
        Self {
            code,
            message,
            name,
            cause: None,
            violations: BTreeSet::new(),
        }
    }

    /// No schema can be fetched for `name`
    pub fn not_found(name: impl Into<String>) -> Self {
        let name = name.into();
        let message = format!("No schema found for policy '{}'", name);
        Self::new(SchemaErrorCode::PolicySchemaNotFound, Some(name), message)
    }

    /// The fetch pipeline reported a domain failure; the message is kept as-is
    pub fn fetch_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(SchemaErrorCode::PolicySchemaFetchFailed, Some(name.into()), message.into())
    }

    /// Any other failure on the fetch path, wrapped into a fetch failure
    pub fn infrastructure(name: impl Into<String>, cause: impl fmt::Display) -> Self {
        let name = name.into();
        let mut err = Self::new(
            SchemaErrorCode::PolicySchemaFetchFailed,
            Some(name.clone()),
            format!("Failed to fetch schema for policy '{}'", name),
        );
        err.cause = Some(cause.to_string());
        err
    }

    /// The fetched text is not a usable JSON schema
    pub fn invalid_schema(name: impl Into<String>, reason: impl fmt::Display) -> Self {
        let name = name.into();
        let mut err = Self::new(
            SchemaErrorCode::PolicySchemaFetchFailed,
            Some(name.clone()),
            format!("Schema for policy '{}' does not compile", name),
        );
        err.cause = Some(reason.to_string());
        err
    }

    /// The document has at least one violation
    pub fn validation_failed(name: impl Into<String>, violations: BTreeSet<String>) -> Self {
        let name = name.into();
        let mut err = Self::new(
            SchemaErrorCode::PolicySchemaValidationFailed,
            Some(name.clone()),
            format!(
                "Document violates schema of policy '{}' ({} violation(s))",
                name,
                violations.len()
            ),
        );
        err.violations = violations;
        err
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SchemaErrorCode::PolicySchemaInternal, None, message.into())
    }

    pub(crate) fn poisoned() -> Self {
        Self::internal("Schema cache lock poisoned")
    }

    /// Map a schema source failure for `name`.
    ///
    /// Not-found and business failures keep their meaning; infrastructure
    /// failures collapse into a fetch failure carrying the cause.
    pub fn from_source(name: &str, err: SourceError) -> Self {
        match err {
            SourceError::NotFound => Self::not_found(name),
            SourceError::Business(message) => Self::fetch_failed(name, message),
            SourceError::Infrastructure(cause) => Self::infrastructure(name, cause),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the policy name if applicable
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the wrapped cause if applicable
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    /// Returns the violations of a validation failure
    pub fn violations(&self) -> &BTreeSet<String> {
        &self.violations
    }

    pub fn is_not_found(&self) -> bool {
        self.code == SchemaErrorCode::PolicySchemaNotFound
    }

    pub fn status_code(&self) -> u16 {
        self.code.status_code()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        if let Some(ref cause) = self.cause {
            write!(f, " (caused by: {})", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
