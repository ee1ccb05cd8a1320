//! Run reporting
//!
//! Collect-all, fail-none result aggregation for a sanitization run. Every
//! device's outcome lands in the report; callers decide whether any failure
//! matters instead of the engine aborting on the first one.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::task_group::TaskOutcome;

// =============================================================================
// Run phases
// =============================================================================

/// States a sanitization run moves through.
///
/// Phases are strictly sequential barriers; within a phase, work is fully
/// parallel across units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    /// Initial state
    Idle,
    /// Erasing raw-backed units
    SanitizingRaw,
    /// Destroying logical-volume-backed units via the volume manager
    DestroyingLogicalVolumes,
    /// Wiping residual volume-group metadata off the physical volumes
    WipingPhysicalVolumes,
    /// Run finished; reached unconditionally
    Done,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "Idle"),
            RunPhase::SanitizingRaw => write!(f, "SanitizingRaw"),
            RunPhase::DestroyingLogicalVolumes => write!(f, "DestroyingLogicalVolumes"),
            RunPhase::WipingPhysicalVolumes => write!(f, "WipingPhysicalVolumes"),
            RunPhase::Done => write!(f, "Done"),
        }
    }
}

/// A phase transition in the run log.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseStep {
    pub phase: RunPhase,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub duration_ms: Option<u64>,
}

// =============================================================================
// Device outcomes
// =============================================================================

/// Final outcome for one device path.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceOutcome {
    /// Unit identifier, when the device maps to a discovered unit.
    pub unit_id: Option<i32>,
    /// Whether every erase command for the device succeeded.
    pub success: bool,
    /// Summary, including failure detail.
    pub message: String,
}

impl From<&TaskOutcome> for DeviceOutcome {
    fn from(outcome: &TaskOutcome) -> Self {
        Self {
            unit_id: outcome.unit_id,
            success: outcome.success,
            message: outcome.message.clone(),
        }
    }
}

// =============================================================================
// Run report
// =============================================================================

/// Aggregated result of one sanitization run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Current (or final) phase.
    pub phase: RunPhase,

    /// Outcome per device path.
    pub per_device: BTreeMap<String, DeviceOutcome>,

    /// Backend kinds whose discovery failed and were skipped.
    pub skipped_backends: Vec<String>,

    /// When the run started.
    pub start_time: DateTime<Utc>,

    /// When the run ended.
    pub end_time: DateTime<Utc>,

    /// Total wall-clock duration.
    #[serde(skip)]
    pub duration: Duration,

    /// Phase-by-phase log.
    pub steps: Vec<PhaseStep>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            phase: RunPhase::Idle,
            per_device: BTreeMap::new(),
            skipped_backends: Vec::new(),
            start_time: now,
            end_time: now,
            duration: Duration::ZERO,
            steps: Vec::new(),
        }
    }

    /// Record a phase transition.
    pub fn transition(&mut self, phase: RunPhase, message: &str) {
        let now = Utc::now();
        let last_step_time = self
            .steps
            .last()
            .map(|s| s.timestamp)
            .unwrap_or(self.start_time);
        let duration_ms = (now - last_step_time).num_milliseconds() as u64;

        self.phase = phase;
        self.steps.push(PhaseStep {
            phase,
            timestamp: now,
            message: message.to_string(),
            duration_ms: Some(duration_ms),
        });

        self.end_time = now;
        self.duration = (now - self.start_time).to_std().unwrap_or(Duration::ZERO);
    }

    /// Fold one phase's task outcomes into the per-device map.
    pub fn record_outcomes(&mut self, outcomes: &[TaskOutcome]) {
        for outcome in outcomes {
            self.per_device
                .insert(outcome.device.clone(), DeviceOutcome::from(outcome));
        }
    }

    /// Record a backend kind skipped because discovery failed.
    pub fn record_skipped_backend(&mut self, backend: &str) {
        self.skipped_backends.push(backend.to_string());
    }

    /// True when every recorded device succeeded and no backend was skipped.
    pub fn is_success(&self) -> bool {
        self.skipped_backends.is_empty() && self.per_device.values().all(|o| o.success)
    }

    /// Device paths whose sanitization failed.
    pub fn failed_devices(&self) -> Vec<&str> {
        self.per_device
            .iter()
            .filter(|(_, o)| !o.success)
            .map(|(device, _)| device.as_str())
            .collect()
    }
}
