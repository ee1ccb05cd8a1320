//! Physical Volume Lookup
//!
//! Implements the `PvLookup` port with `lvs`. The segment query must run
//! before the owning logical volume is destroyed, because it reads the
//! volume-group metadata the destroy removes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{CommandExecutor, PvLookup};
use crate::error::Result;

/// Lookup resolving a logical volume to its physical-volume segment ranges.
pub struct LvsPvLookup {
    executor: Arc<dyn CommandExecutor>,
}

impl LvsPvLookup {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }
}

impl std::fmt::Debug for LvsPvLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LvsPvLookup").finish()
    }
}

#[async_trait]
impl PvLookup for LvsPvLookup {
    async fn query_pv_segments(&self, lv_path: &str) -> Result<String> {
        let output = self
            .executor
            .run("lvs", &[lv_path, "-o", "seg_pe_ranges", "--noheadings"])
            .await?;

        let ranges = output.trim().to_string();
        debug!(lv = lv_path, ranges = %ranges, "queried physical volume segments");
        Ok(ranges)
    }
}
