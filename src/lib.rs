//! Sanistor - Cluster Storage Device Sanitizer
//!
//! Node-local, irreversible erasure of the devices that backed a storage
//! cluster's data-serving units, before the devices are returned to a pool
//! or decommissioned. Every on-disk artifact of a unit is erased: the main
//! data region plus any separately located metadata and write-log regions.
//!
//! # Architecture
//!
//! ```text
//! Discovery (inventory) → DiskSanitizer (orchestrator) → Erase utilities
//! ```
//!
//! The orchestrator enumerates storage units per backend kind, resolves
//! encrypted devices to their backing block devices, builds the erase
//! command sequence from the declarative [`SanitizeSpec`], and fans the work
//! out one task per unit with barriers between dependent phases. A
//! logical-volume-backed unit must be destroyed by the volume manager before
//! the leftover volume-group metadata on its physical volume is wiped; that
//! destroy-before-residual-wipe barrier is the one ordering invariant the
//! run depends on.
//!
//! Failures are best-effort by design: a failing device never blocks the
//! rest of the set. The run always completes and reports per-device outcomes
//! in a [`RunReport`].
//!
//! # Modules
//!
//! - [`adapters`] - Infrastructure adapters implementing domain ports
//! - [`commands`] - Erase command construction
//! - [`config`] - Declarative sanitization configuration
//! - [`domain`] - Domain layer with ports and value objects
//! - [`error`] - Error types
//! - [`sanitizer`] - Orchestration engine, task groups, and run reports

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod sanitizer;

// Re-export commonly used types
pub use commands::{build_shred_commands, ShredCommand};
pub use config::{SanitizeDataSource, SanitizeMethod, SanitizeSpec, SanitizerConfig};
pub use domain::ports::{
    BackendKind, CommandExecutor, EncryptedDeviceResolver, PvLookup, StorageUnit, UnitDiscovery,
};
pub use error::{Error, Result};
pub use sanitizer::{DiskSanitizer, RunPhase, RunReport};
