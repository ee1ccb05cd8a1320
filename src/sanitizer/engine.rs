//! Sanitizer Engine
//!
//! Drives secure erasure of every storage-unit device on this node.
//!
//! # Ordering Guarantees
//!
//! 1. Within a phase, units are erased fully in parallel with no ordering
//!    between them
//! 2. A logical-volume-backed unit is destroyed by the volume manager before
//!    the generic erase path touches the underlying physical volume
//! 3. Physical-volume lookups run before the destroy tasks start, because
//!    they read volume-group metadata the destroy removes
//!
//! Failures never abort the run: each one is logged with the device path and
//! captured output, recorded in the [`RunReport`], and the run continues.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error, info, instrument, warn};

use crate::commands::{build_shred_commands, ShredCommand};
use crate::config::{SanitizeSpec, SanitizerConfig};
use crate::domain::ports::{
    BackendKind, CommandExecutor, EncryptedDeviceResolver, PvLookup, StorageUnit, UnitDiscovery,
};
use crate::error::Result;

use super::report::{RunPhase, RunReport};
use super::task_group::{TaskGroup, TaskOutcome};

// =============================================================================
// Disk Sanitizer
// =============================================================================

/// Erases the devices behind this node's storage units.
pub struct DiskSanitizer {
    config: SanitizerConfig,
    spec: SanitizeSpec,
    discovery: Arc<dyn UnitDiscovery>,
    executor: Arc<dyn CommandExecutor>,
    resolver: Arc<dyn EncryptedDeviceResolver>,
    pv_lookup: Arc<dyn PvLookup>,
    /// Device paths with a sanitize task currently in flight.
    in_flight: DashMap<String, ()>,
}

impl DiskSanitizer {
    pub fn new(
        config: SanitizerConfig,
        spec: SanitizeSpec,
        discovery: Arc<dyn UnitDiscovery>,
        executor: Arc<dyn CommandExecutor>,
        resolver: Arc<dyn EncryptedDeviceResolver>,
        pv_lookup: Arc<dyn PvLookup>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            spec,
            discovery,
            executor,
            resolver,
            pv_lookup,
            in_flight: DashMap::new(),
        })
    }

    /// Check if a device currently has a sanitize task in flight.
    pub fn is_sanitizing(&self, device: &str) -> bool {
        self.in_flight.contains_key(device)
    }

    /// Number of devices currently being sanitized.
    pub fn active_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Run the full sanitization sequence for this node.
    ///
    /// Always completes; per-device failures and skipped backend kinds are
    /// recorded in the returned report rather than propagated.
    #[instrument(skip(self), fields(method = %self.spec.method))]
    pub async fn run(self: &Arc<Self>) -> RunReport {
        let mut report = RunReport::new();

        info!(
            method = %self.spec.method,
            data_source = %self.spec.data_source,
            iterations = self.spec.iterations,
            dry_run = self.config.dry_run,
            "starting disk sanitization"
        );

        // Raw based units
        match self.discovery.list_raw_units().await {
            Ok(units) => {
                report.transition(
                    RunPhase::SanitizingRaw,
                    &format!("sanitizing {} raw unit(s)", units.len()),
                );
                let outcomes = self.sanitize_raw_units(units).await;
                report.record_outcomes(&outcomes);
            }
            Err(e) => {
                error!("failed to list raw storage units, skipping backend: {e}");
                report.record_skipped_backend(&BackendKind::Raw.to_string());
            }
        }

        // Logical-volume based units
        match self.discovery.list_lvm_units().await {
            Ok(units) => self.sanitize_lvm_units(units, &mut report).await,
            Err(e) => {
                error!("failed to list lvm storage units, skipping backend: {e}");
                report.record_skipped_backend(&BackendKind::Lvm.to_string());
            }
        }

        report.transition(RunPhase::Done, "sanitization run complete");

        let failed = report.failed_devices();
        if failed.is_empty() {
            info!(
                devices = report.per_device.len(),
                "sanitization run complete"
            );
        } else {
            warn!(
                devices = report.per_device.len(),
                failed = failed.len(),
                "sanitization run complete with failures: {failed:?}"
            );
        }

        report
    }

    // =========================================================================
    // Raw pipeline
    // =========================================================================

    /// One concurrent erase task per raw unit; returns after all finish.
    async fn sanitize_raw_units(self: &Arc<Self>, units: Vec<StorageUnit>) -> Vec<TaskOutcome> {
        let mut group = TaskGroup::new();

        for unit in units {
            info!(unit = unit.id, device = %unit.data_path, "sanitizing raw unit");
            let sanitizer = self.clone();
            group.spawn(async move { sanitizer.sanitize_unit(unit).await });
        }

        group.wait().await
    }

    // =========================================================================
    // LVM pipeline
    // =========================================================================

    /// Two-phase erase for logical-volume-backed units.
    ///
    /// Phase 1 destroys each unit through the volume manager; phase 2 wipes
    /// the residual volume-group metadata off the physical volumes collected
    /// beforehand. The barrier between them is load-bearing.
    async fn sanitize_lvm_units(
        self: &Arc<Self>,
        units: Vec<StorageUnit>,
        report: &mut RunReport,
    ) {
        report.transition(
            RunPhase::DestroyingLogicalVolumes,
            &format!("destroying {} lvm unit(s)", units.len()),
        );

        let mut physical_volumes = Vec::new();
        let mut group = TaskGroup::new();

        for unit in units {
            // Synchronous pre-barrier step: the lookup reads volume-group
            // metadata that the destroy below removes.
            match self.pv_lookup.query_pv_segments(&unit.data_path).await {
                Ok(segments) => match first_pv_segment(&unit.data_path, &segments) {
                    Some(pv) => physical_volumes.push(pv),
                    None => warn!(
                        lv = %unit.data_path,
                        "no physical volume found for logical volume"
                    ),
                },
                Err(e) => {
                    error!(
                        lv = %unit.data_path,
                        "failed to query physical volume segments: {e}"
                    );
                }
            }

            let sanitizer = self.clone();
            group.spawn(async move { sanitizer.destroy_lvm_unit(&unit).await });
        }

        // Wait for the volume manager to finish before wiping the remaining
        // physical volume data.
        let outcomes = group.wait().await;
        report.record_outcomes(&outcomes);

        report.transition(
            RunPhase::WipingPhysicalVolumes,
            &format!("wiping {} physical volume(s)", physical_volumes.len()),
        );

        let mut group = TaskGroup::new();
        for pv in physical_volumes {
            let sanitizer = self.clone();
            group.spawn(async move { sanitizer.sanitize_device(&pv, None).await });
        }

        let outcomes = group.wait().await;
        report.record_outcomes(&outcomes);
    }

    /// Destroy one logical-volume-backed unit through the volume manager.
    async fn destroy_lvm_unit(&self, unit: &StorageUnit) -> TaskOutcome {
        if self
            .in_flight
            .insert(unit.data_path.clone(), ())
            .is_some()
        {
            return TaskOutcome::failed(
                &unit.data_path,
                Some(unit.id),
                "device is already being sanitized",
            );
        }

        let id = unit.id.to_string();
        // stdbuf keeps the destroy output line-buffered so interleaved logs
        // from parallel destroys stay readable.
        let command = ShredCommand::new(
            "stdbuf",
            vec![
                "-oL".to_string(),
                "ceph-volume".to_string(),
                "lvm".to_string(),
                "zap".to_string(),
                "--osd-id".to_string(),
                id,
                "--destroy".to_string(),
            ],
        );

        let outcome = match self.execute(&command).await {
            Ok(output) => {
                debug!(unit = unit.id, "{output}");
                info!(unit = unit.id, "successfully destroyed lvm unit");
                TaskOutcome::succeeded(&unit.data_path, Some(unit.id))
            }
            Err(e) => {
                error!(unit = unit.id, device = %unit.data_path, "failed to destroy lvm unit: {e}");
                TaskOutcome::failed(&unit.data_path, Some(unit.id), e.to_string())
            }
        };

        self.in_flight.remove(&unit.data_path);
        outcome
    }

    // =========================================================================
    // Per-unit erase
    // =========================================================================

    /// Erase every region of one unit, unwrapping encryption first.
    async fn sanitize_unit(&self, mut unit: StorageUnit) -> TaskOutcome {
        let guard_key = unit.data_path.clone();
        if self.in_flight.insert(guard_key.clone(), ()).is_some() {
            return TaskOutcome::failed(
                &unit.data_path,
                Some(unit.id),
                "device is already being sanitized",
            );
        }

        // If the device is encrypted, erase the backing device and drop the
        // dm mapping. Both steps degrade rather than fail the unit.
        if unit.encrypted {
            match self.resolver.resolve_backing_device(&unit.data_path).await {
                Ok(backing) => {
                    if let Err(e) = self.resolver.teardown_mapping(&unit.data_path).await {
                        warn!(device = %unit.data_path, "failed to remove encrypted mapping: {e}");
                    }
                    debug!(mapping = %unit.data_path, device = %backing, "erasing backing device");
                    unit.data_path = backing;
                }
                Err(e) => {
                    error!(
                        device = %unit.data_path,
                        "failed to resolve backing device, erasing the mapping itself: {e}"
                    );
                }
            }
        }

        let regions: Vec<String> = unit.regions().iter().map(|r| r.to_string()).collect();
        let mut failures = Vec::new();

        for region in &regions {
            if let Err(message) = self.erase_region(region).await {
                failures.push(message);
            }
        }

        let outcome = if failures.is_empty() {
            TaskOutcome::succeeded(&unit.data_path, Some(unit.id))
        } else {
            TaskOutcome::failed(&unit.data_path, Some(unit.id), failures.join("; "))
        };

        self.in_flight.remove(&guard_key);
        outcome
    }

    /// Erase a bare device path outside any unit descriptor.
    async fn sanitize_device(&self, device: &str, unit_id: Option<i32>) -> TaskOutcome {
        if self.in_flight.insert(device.to_string(), ()).is_some() {
            return TaskOutcome::failed(device, unit_id, "device is already being sanitized");
        }

        let outcome = match self.erase_region(device).await {
            Ok(()) => TaskOutcome::succeeded(device, unit_id),
            Err(message) => TaskOutcome::failed(device, unit_id, message),
        };

        self.in_flight.remove(device);
        outcome
    }

    /// Run the erase command sequence for one device region.
    ///
    /// A failing command is logged and skipped; the remaining commands still
    /// run. Returns a summary of what failed, if anything.
    async fn erase_region(&self, device: &str) -> std::result::Result<(), String> {
        let mut failures = Vec::new();

        for command in build_shred_commands(device, &self.spec) {
            match self.execute(&command).await {
                Ok(output) => {
                    debug!(device, "{output}");
                    info!(device, "successfully executed sanitization command");
                }
                Err(e) => {
                    error!(
                        device,
                        output = e.command_output().unwrap_or_default(),
                        "failed to execute sanitization command: {e}"
                    );
                    failures.push(format!("{device}: {e}"));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.join("; "))
        }
    }

    async fn execute(&self, command: &ShredCommand) -> Result<String> {
        if self.config.dry_run {
            info!(command = %command, "[DRY-RUN] skipping command execution");
            return Ok(String::new());
        }

        let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
        self.executor.run(&command.program, &args).await
    }
}

impl std::fmt::Debug for DiskSanitizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskSanitizer")
            .field("config", &self.config)
            .field("spec", &self.spec)
            .field("active", &self.in_flight.len())
            .finish()
    }
}

// =============================================================================
// PV segment parsing
// =============================================================================

/// First physical-volume path in a colon-delimited segment-range string.
///
/// A logical volume is assumed to map to a single physical-volume range;
/// additional segments are logged and left alone rather than silently
/// dropped, since their ranges would stay un-sanitized.
fn first_pv_segment(lv: &str, segments: &str) -> Option<String> {
    let trimmed = segments.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut fields = trimmed.split(':');
    let first = fields.next()?.trim();
    if first.is_empty() {
        return None;
    }

    if trimmed.split_whitespace().count() > 1 {
        warn!(
            lv,
            segments = trimmed,
            "logical volume spans multiple segments, only the first physical volume is wiped"
        );
    }

    Some(first.to_string())
}
