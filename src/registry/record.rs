//! # Version Records
//!
//! Identity of one loaded policy version, its lifecycle status, and the
//! caller-supplied version spec used to look it up.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{RegistryError, RegistryResult};

/// Lifecycle tag attached to a version at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivationStatus {
    /// Promoted and serving traffic
    Active,
    /// Loaded but not yet promoted
    Available,
    /// Loaded but switched off
    Inactive,
    /// Kept for audit, never served
    Deprecated,
}

impl ActivationStatus {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationStatus::Active => "ACTIVE",
            ActivationStatus::Available => "AVAILABLE",
            ActivationStatus::Inactive => "INACTIVE",
            ActivationStatus::Deprecated => "DEPRECATED",
        }
    }

    /// Eligible for pinned (`major.minor` or `major.minor.patch`) lookups.
    pub fn is_eligible(&self) -> bool {
        matches!(self, ActivationStatus::Active | ActivationStatus::Available)
    }

    /// Eligible for ambiguous major-only lookups.
    pub fn is_promoted(&self) -> bool {
        matches!(self, ActivationStatus::Active)
    }
}

impl fmt::Display for ActivationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable identity of one registered policy version.
///
/// The derived strings (`version_string`, `patch_version_string`) are always
/// consistent with the numeric fields; records can only be built through the
/// constructors below.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VersionRecord {
    short_name: String,
    full_name: String,
    major_version: u32,
    minor_version: u32,
    patch_version: u32,
    version_string: String,
    patch_version_string: String,
}

impl VersionRecord {
    /// Build a record from a `major.minor.patch` version string.
    pub fn new(
        short_name: impl Into<String>,
        full_name: impl Into<String>,
        version: &str,
    ) -> RegistryResult<Self> {
        let (major, minor, patch) = parse_full_version(version)?;
        Ok(Self::from_parts(short_name, full_name, major, minor, patch))
    }

    /// Build a record whose full name is `<short_name>/<major.minor.patch>`.
    pub fn versioned(short_name: impl Into<String>, version: &str) -> RegistryResult<Self> {
        let short_name = short_name.into();
        let (major, minor, patch) = parse_full_version(version)?;
        let full_name = format!("{}/{}.{}.{}", short_name, major, minor, patch);
        Ok(Self::from_parts(short_name, full_name, major, minor, patch))
    }

    pub fn from_parts(
        short_name: impl Into<String>,
        full_name: impl Into<String>,
        major_version: u32,
        minor_version: u32,
        patch_version: u32,
    ) -> Self {
        Self {
            short_name: short_name.into(),
            full_name: full_name.into(),
            major_version,
            minor_version,
            patch_version,
            version_string: format!("{}.{}", major_version, minor_version),
            patch_version_string: format!("{}.{}.{}", major_version, minor_version, patch_version),
        }
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn major_version(&self) -> u32 {
        self.major_version
    }

    pub fn minor_version(&self) -> u32 {
        self.minor_version
    }

    pub fn patch_version(&self) -> u32 {
        self.patch_version
    }

    /// `major.minor`, e.g. "1.2"
    pub fn version_string(&self) -> &str {
        &self.version_string
    }

    /// `major.minor.patch`, e.g. "1.2.3"
    pub fn patch_version_string(&self) -> &str {
        &self.patch_version_string
    }
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.full_name, self.patch_version_string)
    }
}

fn parse_full_version(version: &str) -> RegistryResult<(u32, u32, u32)> {
    let mut parts = version.trim().split('.');
    let mut next = || -> RegistryResult<u32> {
        parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(|| RegistryError::InvalidVersion(version.to_string()))
    };
    let major = next()?;
    let minor = next()?;
    let patch = next()?;
    if parts.next().is_some() {
        return Err(RegistryError::InvalidVersion(version.to_string()));
    }
    Ok((major, minor, patch))
}

/// A caller-supplied version request.
///
/// Only the dot/no-dot branching is interpreted: dotted specs are matched
/// verbatim against the registered version strings, undotted specs must parse
/// as a major version number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec<'a> {
    /// `"1"`
    Major(u32),
    /// `"1.2"`
    Minor(&'a str),
    /// `"1.2.3"`
    Patch(&'a str),
    /// Three or more dots; never matches a bucket
    Unmatched(&'a str),
}

impl<'a> VersionSpec<'a> {
    pub fn parse(spec: &'a str) -> RegistryResult<Self> {
        match spec.matches('.').count() {
            0 => spec
                .parse::<u32>()
                .map(VersionSpec::Major)
                .map_err(|source| RegistryError::InvalidVersionSpec {
                    spec: spec.to_string(),
                    source,
                }),
            1 => Ok(VersionSpec::Minor(spec)),
            2 => Ok(VersionSpec::Patch(spec)),
            _ => Ok(VersionSpec::Unmatched(spec)),
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, VersionSpec::Major(_))
    }
}
