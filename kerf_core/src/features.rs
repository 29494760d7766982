//! Numeric feature encoding for the learned-model contract.
//!
//! Maps (material, thickness, power, process) to the fixed 9-float vector
//! the external model trains on, and decodes normalized model outputs back
//! to machine settings. Normalization divisors are fixed constants shared
//! with the training collaborator; changing them invalidates every trained
//! model.

use std::sync::Arc;

use kerf_config::{MaterialTable, Matched};

use crate::error::EncodingError;
use crate::record::{
    ProcessKind, ProcessParams, Provenance, clamp_passes, clamp_power_pct, clamp_speed,
};

pub use kerf_traits::FEATURE_DIM;

/// [density_n, thermal_n, melt, absorb, thickness_n, power_n,
///  is_cutting, is_engraving, is_scoring]
pub type FeatureVector = [f32; FEATURE_DIM];

/// Density divisor (max ~3.0 g/cm³).
pub const DENSITY_NORM: f32 = 3.0;
/// Thermal conductivity divisor (max ~2.5 W/mK).
pub const THERMAL_NORM: f32 = 2.5;
/// Thickness divisor (max 10mm).
pub const THICKNESS_NORM_MM: f32 = 10.0;
/// Laser wattage divisor (max 40W diode).
pub const LASER_NORM_W: f32 = 40.0;

/// Target normalization divisors (power %, speed, passes).
pub const TARGET_POWER_NORM: f32 = 100.0;
pub const TARGET_SPEED_NORM: f32 = 500.0;
pub const TARGET_PASSES_NORM: f32 = 20.0;

/// Flattened per-process training row, the shape the data-store collaborator
/// emits for model training (one row per process per record).
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub material_type: String,
    pub material_thickness: f32,
    pub laser_power: f32,
    pub process: ProcessKind,
    pub target: ProcessParams,
    /// Crowdsourced 0-10 rating of the target parameter set.
    pub quality: f32,
    pub data_source: Provenance,
}

/// Vectorized batch ready for the training collaborator.
///
/// Row `i` of `x` corresponds to `y_power[i]`, `y_speed[i]`, `y_passes[i]`
/// and `sample_weights[i]`; targets are normalized to [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBatch {
    pub x: Vec<FeatureVector>,
    pub y_power: Vec<f32>,
    pub y_speed: Vec<f32>,
    pub y_passes: Vec<f32>,
    /// `max(0.1, quality/10)`: low-rated samples still contribute, but less.
    pub sample_weights: Vec<f32>,
}

impl EncodedBatch {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Stateless encoder over a shared material table.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    table: Arc<MaterialTable>,
}

impl FeatureEncoder {
    pub fn new(table: Arc<MaterialTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &MaterialTable {
        &self.table
    }

    /// Encode one request into the model input vector.
    ///
    /// Unknown materials fall back to the documented default descriptor and
    /// log a warning; a containment match logs the table key that won.
    pub fn encode(
        &self,
        material: &str,
        thickness_mm: f32,
        laser_power_w: f32,
        process: ProcessKind,
    ) -> FeatureVector {
        let resolved = self.table.resolve(material);
        match &resolved.matched {
            Matched::Exact => {}
            Matched::Partial(key) => {
                tracing::info!(material, key = key.as_str(), "material matched by containment");
            }
            Matched::Fallback => {
                tracing::warn!(material, "unknown material, using default properties");
            }
        }
        let p = resolved.props;
        [
            p.density / DENSITY_NORM,
            p.thermal / THERMAL_NORM,
            p.melt,
            p.absorb,
            thickness_mm / THICKNESS_NORM_MM,
            laser_power_w / LASER_NORM_W,
            if process == ProcessKind::Cutting { 1.0 } else { 0.0 },
            if process == ProcessKind::Engraving { 1.0 } else { 0.0 },
            if process == ProcessKind::Scoring { 1.0 } else { 0.0 },
        ]
    }

    /// Vectorize a batch of training rows.
    ///
    /// Samples with non-finite or non-positive inputs are skipped with a
    /// warning; one malformed historical record must not abort a batch of
    /// hundreds. Errors only when nothing usable remains.
    pub fn encode_batch(
        &self,
        samples: &[TrainingSample],
    ) -> Result<EncodedBatch, EncodingError> {
        let mut batch = EncodedBatch {
            x: Vec::with_capacity(samples.len()),
            y_power: Vec::with_capacity(samples.len()),
            y_speed: Vec::with_capacity(samples.len()),
            y_passes: Vec::with_capacity(samples.len()),
            sample_weights: Vec::with_capacity(samples.len()),
        };
        let mut skipped = 0usize;

        for sample in samples {
            if !sample_usable(sample) {
                skipped += 1;
                tracing::warn!(
                    material = sample.material_type.as_str(),
                    thickness = sample.material_thickness,
                    laser_w = sample.laser_power,
                    "failed to encode sample, skipping"
                );
                continue;
            }
            batch.x.push(self.encode(
                &sample.material_type,
                sample.material_thickness,
                sample.laser_power,
                sample.process,
            ));
            batch.y_power.push(sample.target.power_pct / TARGET_POWER_NORM);
            batch.y_speed.push(sample.target.speed / TARGET_SPEED_NORM);
            batch
                .y_passes
                .push(sample.target.passes as f32 / TARGET_PASSES_NORM);
            batch
                .sample_weights
                .push((sample.quality / 10.0).max(0.1));
        }

        if batch.is_empty() {
            return Err(EncodingError::EmptyBatch { skipped });
        }
        if skipped > 0 {
            tracing::warn!(skipped, encoded = batch.len(), "batch encoded with skips");
        }
        Ok(batch)
    }

    /// De-normalize model outputs to machine settings, clamped to the emit
    /// ranges. Decoding values already in range returns them unchanged up to
    /// pass rounding.
    pub fn decode_predictions(
        &self,
        power_norm: f32,
        speed_norm: f32,
        passes_norm: f32,
    ) -> ProcessParams {
        // Non-finite model outputs quantize to 0 before scaling so the
        // clamps see a number, not a NaN.
        let sanitize = |v: f32| if v.is_finite() { v } else { 0.0 };
        ProcessParams {
            power_pct: clamp_power_pct(sanitize(power_norm) * TARGET_POWER_NORM),
            speed: clamp_speed(sanitize(speed_norm) * TARGET_SPEED_NORM),
            passes: clamp_passes(
                (sanitize(passes_norm) * TARGET_PASSES_NORM).round() as i64,
            ),
        }
    }
}

fn sample_usable(sample: &TrainingSample) -> bool {
    sample.material_thickness.is_finite()
        && sample.material_thickness > 0.0
        && sample.laser_power.is_finite()
        && sample.laser_power > 0.0
        && sample.target.power_pct.is_finite()
        && sample.target.speed.is_finite()
        && sample.quality.is_finite()
}
