#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Laser-cutting parameter prediction core (transport-agnostic).
//!
//! This crate provides the data-driven prediction engine. All I/O (fetching
//! candidate pools, persisting records, serving HTTP) lives with the
//! calling service layer; the trained model is reached only through
//! `kerf_traits::ParamModel`.
//!
//! ## Architecture
//!
//! - **Records**: experiment data model and domain ranges (`record` module)
//! - **Features**: 9-float encoding contract with the trained model
//!   (`features` module)
//! - **Quality**: outlier rejection, augmentation, balancing, validation
//!   (`quality` module)
//! - **Similarity**: the weighted transfer predictor (`similarity` module)
//! - **Fallback**: data-free static formulas (`fallback` module)
//! - **Engine**: explicit-DI escalation data → model → static (`engine`)
//! - **Evaluation**: deploy-gate metrics for the training side
//!   (`evaluation` module)
//!
//! ## Determinism
//!
//! Every component is a pure function of its explicit inputs; randomized
//! operations take a caller-supplied `rand::Rng` so tests can seed them.

pub mod engine;
pub mod error;
pub mod evaluation;
pub mod fallback;
pub mod features;
pub mod mocks;
pub mod quality;
pub mod record;
pub mod similarity;

pub use engine::{Prediction, PredictionEngine, PredictionRequest};
pub use error::{BuildError, EncodingError, Result};
pub use features::{EncodedBatch, FeatureEncoder, FeatureVector, TrainingSample};
pub use record::{ExperimentRecord, ProcessKind, ProcessParams, Provenance};
pub use similarity::{DataPrediction, PredictionResult, PredictionSource, SimilarityPredictor};

/// Similarity predictor thresholds.
///
/// Plain runtime twin of `kerf_config::Predictor`; the serde layer stays in
/// the config crate.
#[derive(Debug, Clone, Copy)]
pub struct PredictorCfg {
    /// Minimum qualifying pool records before community data is trusted.
    pub min_data_points: usize,
    /// Minimum per-process quality score (0-10) for a record to qualify.
    pub quality_threshold: f32,
    /// Source-vs-target laser wattage gap that triggers power rescaling.
    pub power_tolerance_w: f32,
    /// Re-check window for pool thickness around the requested thickness.
    pub thickness_tolerance_mm: f32,
}

impl Default for PredictorCfg {
    fn default() -> Self {
        Self {
            min_data_points: 3,
            quality_threshold: 5.0,
            power_tolerance_w: 10.0,
            thickness_tolerance_mm: 2.0,
        }
    }
}

impl From<kerf_config::Predictor> for PredictorCfg {
    fn from(p: kerf_config::Predictor) -> Self {
        Self {
            min_data_points: p.min_data_points,
            quality_threshold: p.quality_threshold,
            power_tolerance_w: p.power_tolerance_w,
            thickness_tolerance_mm: p.thickness_tolerance_mm,
        }
    }
}
