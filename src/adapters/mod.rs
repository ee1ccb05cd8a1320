//! Infrastructure Adapters
//!
//! Adapter implementations for the domain ports, following the Port/Adapter
//! (Hexagonal) architecture pattern. Every adapter that shells out does so
//! through the [`CommandExecutor`](crate::domain::ports::CommandExecutor)
//! port, so the whole stack runs against a recording fake in tests.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use sanistor::adapters::{CephVolumeDiscovery, SystemCommandExecutor};
//!
//! let executor = Arc::new(SystemCommandExecutor::new());
//! let discovery = CephVolumeDiscovery::new(executor.clone(), None);
//! let units = discovery.list_raw_units().await?;
//! ```

mod ceph_volume;
mod cryptsetup;
mod executor;
mod lvm;

pub use ceph_volume::CephVolumeDiscovery;
pub use cryptsetup::CryptsetupResolver;
pub use executor::SystemCommandExecutor;
pub use lvm::LvsPvLookup;
