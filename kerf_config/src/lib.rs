#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and the material reference table for the prediction core.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `MaterialTable` holds the physical material descriptors the encoder and
//!   predictor consult; a CSV loader enforces headers and validates rows
//!   before the built-in table is replaced.

pub mod materials;

pub use materials::{
    DEFAULT_MATERIAL, MaterialGroup, MaterialProperties, MaterialTable, Matched, Resolved,
    load_materials_csv,
};

use serde::Deserialize;

/// Similarity predictor thresholds.
///
/// These are the fixed policy knobs of the data-driven predictor; the
/// algorithmic weights (material/thickness/power/quality) are constants in
/// the core crate.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Predictor {
    /// Minimum qualifying pool records before community data is trusted.
    pub min_data_points: usize,
    /// Minimum per-process quality score (0-10) for a record to qualify.
    pub quality_threshold: f32,
    /// Source-vs-target laser wattage gap that triggers power rescaling.
    pub power_tolerance_w: f32,
    /// Re-check window for pool thickness around the requested thickness.
    pub thickness_tolerance_mm: f32,
}

impl Default for Predictor {
    fn default() -> Self {
        Self {
            min_data_points: 3,
            quality_threshold: 5.0,
            power_tolerance_w: 10.0,
            thickness_tolerance_mm: 2.0,
        }
    }
}

/// Outlier detection method for the training-data quality pipeline.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    #[default]
    Iqr,
    Zscore,
}

/// Class balancing strategy for the training-data quality pipeline.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BalanceMethod {
    #[default]
    Oversample,
    Undersample,
}

/// Training-data conditioning knobs.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Quality {
    pub outlier_method: OutlierMethod,
    /// IQR multiplier (typical 1.5-3.0) or Z-score cut-off.
    pub outlier_threshold: f32,
    /// Total samples per original after augmentation (1 disables).
    pub augmentation_factor: u32,
    pub balance_method: BalanceMethod,
}

impl Default for Quality {
    fn default() -> Self {
        Self {
            outlier_method: OutlierMethod::Iqr,
            outlier_threshold: 3.0,
            augmentation_factor: 2,
            balance_method: BalanceMethod::Oversample,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Material table source override.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Materials {
    /// Optional CSV replacing the built-in properties table.
    pub table_csv: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub predictor: Predictor,
    pub quality: Quality,
    pub logging: Logging,
    pub materials: Materials,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Predictor
        if self.predictor.min_data_points == 0 {
            eyre::bail!("predictor.min_data_points must be >= 1");
        }
        if !(0.0..=10.0).contains(&self.predictor.quality_threshold) {
            eyre::bail!("predictor.quality_threshold must be in [0.0, 10.0]");
        }
        if !self.predictor.power_tolerance_w.is_finite() || self.predictor.power_tolerance_w <= 0.0
        {
            eyre::bail!("predictor.power_tolerance_w must be > 0");
        }
        if self.predictor.power_tolerance_w > 40.0 {
            eyre::bail!("predictor.power_tolerance_w is unreasonably large (>40W)");
        }
        if !self.predictor.thickness_tolerance_mm.is_finite()
            || self.predictor.thickness_tolerance_mm <= 0.0
        {
            eyre::bail!("predictor.thickness_tolerance_mm must be > 0");
        }
        if self.predictor.thickness_tolerance_mm > 10.0 {
            eyre::bail!("predictor.thickness_tolerance_mm is unreasonably large (>10mm)");
        }

        // Quality
        if !self.quality.outlier_threshold.is_finite() || self.quality.outlier_threshold <= 0.0 {
            eyre::bail!("quality.outlier_threshold must be > 0");
        }
        if self.quality.augmentation_factor == 0 {
            eyre::bail!("quality.augmentation_factor must be >= 1");
        }
        if self.quality.augmentation_factor > 20 {
            eyre::bail!("quality.augmentation_factor is unreasonably large (>20)");
        }

        // Materials: path existence is checked at load time, not here.

        Ok(())
    }
}
