//! Domain Ports (Port/Adapter Pattern)
//!
//! Core abstractions the sanitizer depends on. Infrastructure adapters
//! implement these traits against the real system tools; tests swap in
//! recording fakes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       DiskSanitizer                          │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                    Ports (Traits)                      │  │
//! │  │ UnitDiscovery │ CommandExecutor │ Resolver │ PvLookup  │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   Infrastructure Layer                       │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                   Adapters (Impls)                     │  │
//! │  │ CephVolumeDiscovery │ SystemCommandExecutor │          │  │
//! │  │ CryptsetupResolver  │ LvsPvLookup                      │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// =============================================================================
// Value Objects
// =============================================================================

/// Backend kind a storage unit was provisioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Sits atop a volume-manager abstraction (volume group → logical volume).
    Lvm,
    /// Maps directly to a block device.
    Raw,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Lvm => write!(f, "lvm"),
            BackendKind::Raw => write!(f, "raw"),
        }
    }
}

/// Descriptor for one data-serving storage unit to be erased.
///
/// Constructed by the discovery collaborator at orchestration start and
/// read-only afterwards. Not every unit separates its metadata and write-log
/// regions from the data region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUnit {
    /// Unit identifier within the cluster.
    pub id: i32,
    /// Primary data region device path.
    pub data_path: String,
    /// Separate metadata region, if the unit has one.
    pub metadata_path: Option<String>,
    /// Separate write-log region, if the unit has one.
    pub log_path: Option<String>,
    /// Whether `data_path` is an encrypted mapping rather than the raw device.
    pub encrypted: bool,
}

impl StorageUnit {
    /// Descriptor with only a data region, unencrypted.
    pub fn data_only(id: i32, data_path: impl Into<String>) -> Self {
        Self {
            id,
            data_path: data_path.into(),
            metadata_path: None,
            log_path: None,
            encrypted: false,
        }
    }

    /// Device regions to erase, in fixed order: data, metadata, write-log.
    pub fn regions(&self) -> Vec<&str> {
        let mut regions = vec![self.data_path.as_str()];
        if let Some(metadata) = self.metadata_path.as_deref() {
            regions.push(metadata);
        }
        if let Some(log) = self.log_path.as_deref() {
            regions.push(log);
        }
        regions.retain(|r| !r.is_empty());
        regions
    }
}

// =============================================================================
// Discovery Port
// =============================================================================

/// Port for enumerating the storage units backed by this node's devices.
///
/// A failure for one backend kind must not prevent the other kind from being
/// sanitized; the orchestrator logs and skips the failing kind.
#[async_trait]
pub trait UnitDiscovery: Send + Sync {
    /// List units provisioned on raw block devices.
    async fn list_raw_units(&self) -> Result<Vec<StorageUnit>>;

    /// List units provisioned on logical volumes.
    async fn list_lvm_units(&self) -> Result<Vec<StorageUnit>>;
}

// =============================================================================
// Executor Port
// =============================================================================

/// Port for running external erase utilities.
///
/// Synchronous from the caller's point of view: `run` resolves once the
/// process has exited. The returned string is the combined stdout and stderr
/// regardless of exit status; a non-zero exit or spawn failure surfaces as an
/// error that still carries the captured output.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn run(&self, program: &str, args: &[&str]) -> Result<String>;
}

// =============================================================================
// Encrypted Device Port
// =============================================================================

/// Port for unwrapping encrypted block devices.
#[async_trait]
pub trait EncryptedDeviceResolver: Send + Sync {
    /// Resolve an encrypted mapping to the block device backing it.
    async fn resolve_backing_device(&self, encrypted_path: &str) -> Result<String>;

    /// Remove the device-mapper entry for an encrypted mapping.
    async fn teardown_mapping(&self, encrypted_path: &str) -> Result<()>;
}

// =============================================================================
// Physical Volume Lookup Port
// =============================================================================

/// Port for querying the physical-volume segments under a logical volume.
#[async_trait]
pub trait PvLookup: Send + Sync {
    /// Raw colon-delimited segment-range string for the given logical volume.
    async fn query_pv_segments(&self, lv_path: &str) -> Result<String>;
}
