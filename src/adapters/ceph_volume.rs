//! Storage Unit Discovery
//!
//! Implements the `UnitDiscovery` port by querying the volume manager's
//! inventory (`ceph-volume ... list --format json`) and mapping the JSON
//! into [`StorageUnit`] descriptors. The two backend kinds use different
//! inventory layouts, handled by separate converters.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::domain::ports::{BackendKind, CommandExecutor, StorageUnit, UnitDiscovery};
use crate::error::{Error, Result};

const VOLUME_MANAGER_UTILITY: &str = "ceph-volume";

/// Discovery adapter backed by the volume-manager inventory commands.
pub struct CephVolumeDiscovery {
    executor: Arc<dyn CommandExecutor>,
    /// When set, only units tagged with this cluster id are returned.
    cluster_id: Option<String>,
}

impl CephVolumeDiscovery {
    pub fn new(executor: Arc<dyn CommandExecutor>, cluster_id: Option<String>) -> Self {
        Self {
            executor,
            cluster_id,
        }
    }

    async fn inventory(&self, backend: BackendKind) -> Result<Value> {
        let output = self
            .executor
            .run(
                VOLUME_MANAGER_UTILITY,
                &[&backend.to_string(), "list", "--format", "json"],
            )
            .await
            .map_err(|e| Error::Discovery {
                backend: backend.to_string(),
                reason: e.to_string(),
            })?;

        serde_json::from_str(&output).map_err(|e| Error::OutputParse {
            tool: VOLUME_MANAGER_UTILITY.to_string(),
            reason: e.to_string(),
        })
    }

    fn matches_cluster(&self, fsid: Option<&str>) -> bool {
        match (&self.cluster_id, fsid) {
            (Some(wanted), Some(found)) => wanted == found,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

impl std::fmt::Debug for CephVolumeDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CephVolumeDiscovery")
            .field("cluster_id", &self.cluster_id)
            .finish()
    }
}

#[async_trait]
impl UnitDiscovery for CephVolumeDiscovery {
    #[instrument(skip(self))]
    async fn list_raw_units(&self) -> Result<Vec<StorageUnit>> {
        let inventory = self.inventory(BackendKind::Raw).await?;

        let Value::Object(entries) = inventory else {
            return Err(Error::OutputParse {
                tool: VOLUME_MANAGER_UTILITY.to_string(),
                reason: "raw inventory is not a JSON object".to_string(),
            });
        };

        let mut units = Vec::new();
        for (uuid, entry) in &entries {
            match convert_raw_entry(entry) {
                Some((unit, fsid)) if self.matches_cluster(fsid.as_deref()) => units.push(unit),
                Some(_) => debug!(uuid = %uuid, "skipping raw unit from another cluster"),
                None => warn!(uuid = %uuid, "skipping malformed raw inventory entry"),
            }
        }

        debug!(count = units.len(), "discovered raw storage units");
        Ok(units)
    }

    #[instrument(skip(self))]
    async fn list_lvm_units(&self) -> Result<Vec<StorageUnit>> {
        let inventory = self.inventory(BackendKind::Lvm).await?;

        let Value::Object(entries) = inventory else {
            return Err(Error::OutputParse {
                tool: VOLUME_MANAGER_UTILITY.to_string(),
                reason: "lvm inventory is not a JSON object".to_string(),
            });
        };

        let mut units = Vec::new();
        for (id, entry) in &entries {
            match convert_lvm_entry(id, entry) {
                Some((unit, fsid)) if self.matches_cluster(fsid.as_deref()) => units.push(unit),
                Some(_) => debug!(unit = %id, "skipping lvm unit from another cluster"),
                None => warn!(unit = %id, "skipping malformed lvm inventory entry"),
            }
        }

        debug!(count = units.len(), "discovered lvm storage units");
        Ok(units)
    }
}

// =============================================================================
// Inventory converters
// =============================================================================

/// Convert one raw-mode inventory entry into a descriptor plus cluster id.
///
/// Raw entries are keyed by unit uuid and carry the device paths directly.
fn convert_raw_entry(entry: &Value) -> Option<(StorageUnit, Option<String>)> {
    let id = entry.get("osd_id")?.as_i64()? as i32;
    let data_path = non_empty_string(entry.get("device"))?;

    let unit = StorageUnit {
        id,
        data_path,
        metadata_path: non_empty_string(entry.get("device_db")),
        log_path: non_empty_string(entry.get("device_wal")),
        encrypted: entry
            .get("encrypted")
            .and_then(Value::as_i64)
            .map(|v| v != 0)
            .unwrap_or(false),
    };
    let fsid = non_empty_string(entry.get("ceph_fsid"));

    Some((unit, fsid))
}

/// Convert one lvm-mode inventory entry into a descriptor plus cluster id.
///
/// Lvm entries are keyed by unit id; the value is the list of logical
/// volumes belonging to that unit, each tagged with its role.
fn convert_lvm_entry(id: &str, entry: &Value) -> Option<(StorageUnit, Option<String>)> {
    let id: i32 = id.parse().ok()?;
    let volumes = entry.as_array()?;

    let block = volumes
        .iter()
        .find(|v| v.get("type").and_then(Value::as_str) == Some("block"))?;
    let tags = block.get("tags");

    let unit = StorageUnit {
        id,
        data_path: non_empty_string(block.get("lv_path"))?,
        metadata_path: lv_path_for_role(volumes, "db")
            .or_else(|| tag_string(tags, "ceph.db_device")),
        log_path: lv_path_for_role(volumes, "wal")
            .or_else(|| tag_string(tags, "ceph.wal_device")),
        encrypted: tag_string(tags, "ceph.encrypted").as_deref() == Some("1"),
    };
    let fsid = tag_string(tags, "ceph.cluster_fsid");

    Some((unit, fsid))
}

fn lv_path_for_role(volumes: &[Value], role: &str) -> Option<String> {
    volumes
        .iter()
        .find(|v| v.get("type").and_then(Value::as_str) == Some(role))
        .and_then(|v| non_empty_string(v.get("lv_path")))
}

fn tag_string(tags: Option<&Value>, key: &str) -> Option<String> {
    non_empty_string(tags.and_then(|t| t.get(key)))
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convert_raw_entry() {
        let entry = json!({
            "osd_id": 4,
            "device": "/dev/sdb",
            "device_db": "/dev/sdc1",
            "ceph_fsid": "a7f64266-0894-4f1e-a635-d0aeaca0e993",
        });

        let (unit, fsid) = convert_raw_entry(&entry).unwrap();

        assert_eq!(unit.id, 4);
        assert_eq!(unit.data_path, "/dev/sdb");
        assert_eq!(unit.metadata_path.as_deref(), Some("/dev/sdc1"));
        assert_eq!(unit.log_path, None);
        assert!(!unit.encrypted);
        assert_eq!(fsid.as_deref(), Some("a7f64266-0894-4f1e-a635-d0aeaca0e993"));
    }

    #[test]
    fn test_convert_raw_entry_missing_device() {
        let entry = json!({ "osd_id": 4 });
        assert!(convert_raw_entry(&entry).is_none());
    }

    #[test]
    fn test_convert_lvm_entry_with_tags() {
        let entry = json!([
            {
                "type": "block",
                "lv_path": "/dev/ceph-vg/block-lv",
                "tags": {
                    "ceph.encrypted": "1",
                    "ceph.cluster_fsid": "fsid-1",
                    "ceph.wal_device": "/dev/sdd2",
                }
            }
        ]);

        let (unit, fsid) = convert_lvm_entry("2", &entry).unwrap();

        assert_eq!(unit.id, 2);
        assert_eq!(unit.data_path, "/dev/ceph-vg/block-lv");
        assert_eq!(unit.log_path.as_deref(), Some("/dev/sdd2"));
        assert!(unit.encrypted);
        assert_eq!(fsid.as_deref(), Some("fsid-1"));
    }

    #[test]
    fn test_convert_lvm_entry_prefers_dedicated_volumes() {
        let entry = json!([
            { "type": "block", "lv_path": "/dev/vg/block", "tags": {} },
            { "type": "db", "lv_path": "/dev/vg/db" },
            { "type": "wal", "lv_path": "/dev/vg/wal" },
        ]);

        let (unit, _) = convert_lvm_entry("0", &entry).unwrap();

        assert_eq!(unit.metadata_path.as_deref(), Some("/dev/vg/db"));
        assert_eq!(unit.log_path.as_deref(), Some("/dev/vg/wal"));
    }

    #[test]
    fn test_convert_lvm_entry_without_block_volume() {
        let entry = json!([{ "type": "db", "lv_path": "/dev/vg/db" }]);
        assert!(convert_lvm_entry("0", &entry).is_none());
    }
}
