//! Sanitization configuration
//!
//! The declarative configuration controlling erasure strength. It is
//! supplied once, already validated, and read-only for the rest of the run.

use serde::{Deserialize, Serialize};

// =============================================================================
// Method
// =============================================================================

/// Erasure method to apply to each device region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizeMethod {
    /// Fast container destroy. Removes the volume-manager metadata that makes
    /// the device usable, but is not a cryptographic-grade overwrite.
    #[default]
    Quick,
    /// Full multi-pass overwrite of the device contents.
    Complete,
}

impl std::fmt::Display for SanitizeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SanitizeMethod::Quick => write!(f, "quick"),
            SanitizeMethod::Complete => write!(f, "complete"),
        }
    }
}

impl std::str::FromStr for SanitizeMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" => Ok(SanitizeMethod::Quick),
            "complete" => Ok(SanitizeMethod::Complete),
            other => Err(format!("unknown sanitize method {other:?}")),
        }
    }
}

// =============================================================================
// Data source
// =============================================================================

/// Source of the pass data used by the complete method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizeDataSource {
    /// Deterministic zero-fill passes.
    #[default]
    Zero,
    /// Passes fed from the kernel random source.
    Random,
}

impl SanitizeDataSource {
    /// Device node backing this data source.
    pub fn device_path(&self) -> String {
        format!("/dev/{self}")
    }
}

impl std::fmt::Display for SanitizeDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SanitizeDataSource::Zero => write!(f, "zero"),
            SanitizeDataSource::Random => write!(f, "random"),
        }
    }
}

impl std::str::FromStr for SanitizeDataSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zero" => Ok(SanitizeDataSource::Zero),
            "random" => Ok(SanitizeDataSource::Random),
            other => Err(format!("unknown sanitize data source {other:?}")),
        }
    }
}

// =============================================================================
// Sanitize spec
// =============================================================================

/// Declarative erasure configuration for a sanitization run.
///
/// `iterations` is only meaningful for [`SanitizeMethod::Complete`]; the
/// quick method ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizeSpec {
    /// Erasure method.
    #[serde(default)]
    pub method: SanitizeMethod,

    /// Pass-data source for the complete method.
    #[serde(default)]
    pub data_source: SanitizeDataSource,

    /// Number of overwrite passes for the complete method.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

fn default_iterations() -> u32 {
    1
}

impl Default for SanitizeSpec {
    fn default() -> Self {
        Self {
            method: SanitizeMethod::default(),
            data_source: SanitizeDataSource::default(),
            iterations: default_iterations(),
        }
    }
}

// =============================================================================
// Sanitizer config
// =============================================================================

/// Runtime configuration for the sanitizer engine.
#[derive(Debug, Clone, Default)]
pub struct SanitizerConfig {
    /// Log every command that would run without executing it.
    pub dry_run: bool,
}
