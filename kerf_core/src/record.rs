//! Experiment records and the parameter domain they live in.
//!
//! Records arrive from the data-store collaborator as JSON documents with
//! camelCase field names; serde does the boundary validation of shape, and
//! `crate::quality::validate_experiment` the domain validation of values.
//! Everything downstream treats records as read-only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

/// Diode laser wattage accepted for experiment sources.
pub const LASER_POWER_W: RangeInclusive<f32> = 2.0..=40.0;
/// Material thickness accepted for experiment records (mm).
pub const THICKNESS_MM: RangeInclusive<f32> = 0.1..=10.0;
/// Stored per-process power percentage.
pub const PARAM_POWER_PCT: RangeInclusive<f32> = 5.0..=100.0;
/// Per-process speed (unit per process domain, mm/min for cutting).
pub const PARAM_SPEED: RangeInclusive<f32> = 50.0..=500.0;
/// Per-process pass count.
pub const PARAM_PASSES: RangeInclusive<u32> = 1..=20;

/// Clamp a predicted power percentage into the emit range.
///
/// The emit floor is 10% (below that a diode laser marks rather than cuts),
/// tighter than the 5% floor accepted for stored records. Non-finite values
/// map to the floor instead of poisoning downstream math.
#[inline]
pub fn clamp_power_pct(p: f32) -> f32 {
    if !p.is_finite() {
        return 10.0;
    }
    p.clamp(10.0, 100.0)
}

/// Clamp a predicted speed into the emit range.
#[inline]
pub fn clamp_speed(s: f32) -> f32 {
    if !s.is_finite() {
        return *PARAM_SPEED.start();
    }
    s.clamp(*PARAM_SPEED.start(), *PARAM_SPEED.end())
}

/// Clamp a pass count into the emit range.
#[inline]
pub fn clamp_passes(p: i64) -> u32 {
    p.clamp(1, 20) as u32
}

/// A distinct laser operation mode with its own parameter ranges.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProcessKind {
    Cutting,
    Engraving,
    Scoring,
}

impl ProcessKind {
    pub const ALL: [ProcessKind; 3] = [
        ProcessKind::Cutting,
        ProcessKind::Engraving,
        ProcessKind::Scoring,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessKind::Cutting => "cutting",
            ProcessKind::Engraving => "engraving",
            ProcessKind::Scoring => "scoring",
        }
    }
}

impl fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a record came from. Unknown tags from older clients deserialize to
/// `Unknown` instead of failing the whole document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    #[default]
    User,
    Researcher,
    ResearcherImport,
    #[serde(other)]
    Unknown,
}

/// Machine settings for one process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessParams {
    /// Laser power percentage.
    #[serde(rename = "power")]
    pub power_pct: f32,
    pub speed: f32,
    pub passes: u32,
}

/// One observed or crowdsourced data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub material_type: String,
    /// Thickness in mm.
    pub material_thickness: f32,
    /// Source machine laser power in W.
    pub laser_power: f32,
    #[serde(default)]
    pub machine_brand: String,
    #[serde(default)]
    pub processes: BTreeMap<ProcessKind, ProcessParams>,
    /// Crowdsourced 0-10 rating per process.
    #[serde(default)]
    pub quality_scores: BTreeMap<ProcessKind, f32>,
    #[serde(default)]
    pub approve_count: u32,
    #[serde(default)]
    pub reject_count: u32,
    #[serde(default)]
    pub data_source: Provenance,
    /// Set on augmentation-derived copies; such records are never persisted
    /// back without external approval and never count as gold standard.
    #[serde(default)]
    pub synthetic: bool,
}

impl ExperimentRecord {
    pub fn params_for(&self, process: ProcessKind) -> Option<&ProcessParams> {
        self.processes.get(&process)
    }

    /// Quality score for a process; absent scores read as the neutral 5.0
    /// the upstream store uses for unrated parameter sets.
    pub fn quality_for(&self, process: ProcessKind) -> f32 {
        self.quality_scores.get(&process).copied().unwrap_or(5.0)
    }

    /// Vetted researcher contribution, weighted more heavily than anonymous
    /// entries. Synthetic derivatives lose the status.
    pub fn is_gold_standard(&self) -> bool {
        !self.synthetic
            && matches!(
                self.data_source,
                Provenance::Researcher | Provenance::ResearcherImport
            )
    }
}
