//! Explicit-DI composition of the prediction stages.
//!
//! Built once at process start and shared freely afterwards: every
//! `predict` call is a pure function over the request and the supplied
//! candidate pool, so concurrent callers need no synchronization. The
//! engine performs no I/O and no retrieval; the data-store collaborator
//! hands it the pool.

use std::collections::BTreeMap;
use std::sync::Arc;

use kerf_config::MaterialTable;
use kerf_traits::ParamModel;

use crate::PredictorCfg;
use crate::error::{BuildError, Result};
use crate::fallback::predict_static;
use crate::features::FeatureEncoder;
use crate::record::{ExperimentRecord, ProcessKind};
use crate::similarity::{
    DataPrediction, PredictionResult, PredictionSource, SimilarityPredictor,
};

/// What the caller wants parameters for. Shape validation (duplicate
/// processes, wattage bounds) is the API layer's job; the engine only
/// degrades gracefully on nonsense.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub machine_brand: String,
    pub laser_power_w: f32,
    pub material_type: String,
    pub material_thickness_mm: f32,
    pub processes: Vec<ProcessKind>,
}

/// Per-request aggregate over all requested processes.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub results: BTreeMap<ProcessKind, PredictionResult>,
    /// Mean of the per-process confidences.
    pub confidence: f32,
    /// Per-process notes, joined.
    pub notes: String,
    /// Largest per-process pool usage (processes share one candidate pool).
    pub data_points_used: usize,
}

/// Prediction pipeline: community data, then the learned model if one is
/// wired in, then the static formulas.
pub struct PredictionEngine {
    materials: Arc<MaterialTable>,
    cfg: PredictorCfg,
    encoder: FeatureEncoder,
    model: Option<Box<dyn ParamModel + Send + Sync>>,
}

impl std::fmt::Debug for PredictionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionEngine")
            .field("materials", &self.materials.len())
            .field("cfg", &self.cfg)
            .field("has_model", &self.model.is_some())
            .finish()
    }
}

impl PredictionEngine {
    /// Validate the configuration and build an engine without a model.
    pub fn new(materials: Arc<MaterialTable>, cfg: PredictorCfg) -> Result<Self> {
        if materials.is_empty() {
            return Err(eyre::Report::new(BuildError::EmptyMaterialTable));
        }
        if cfg.min_data_points == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "min_data_points must be >= 1",
            )));
        }
        if !(0.0..=10.0).contains(&cfg.quality_threshold) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "quality_threshold must be in [0, 10]",
            )));
        }
        if !cfg.power_tolerance_w.is_finite() || cfg.power_tolerance_w <= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "power_tolerance_w must be > 0",
            )));
        }
        if !cfg.thickness_tolerance_mm.is_finite() || cfg.thickness_tolerance_mm <= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "thickness_tolerance_mm must be > 0",
            )));
        }
        let encoder = FeatureEncoder::new(Arc::clone(&materials));
        Ok(Self {
            materials,
            cfg,
            encoder,
            model: None,
        })
    }

    /// Wire in the externally trained model.
    pub fn with_model(mut self, model: Box<dyn ParamModel + Send + Sync>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    /// Predict parameters for every requested process.
    ///
    /// The pool is expected to be pre-filtered to plausibly similar records
    /// (same material family, thickness window); the predictor re-checks the
    /// parts of that contract it depends on.
    pub fn predict(&self, request: &PredictionRequest, pool: &[ExperimentRecord]) -> Prediction {
        let mut results = BTreeMap::new();
        for &process in &request.processes {
            let result = self.predict_process(request, process, pool);
            results.insert(process, result);
        }

        let n = results.len().max(1) as f32;
        let confidence =
            (results.values().map(|r| r.confidence).sum::<f32>() / n * 100.0).round() / 100.0;
        let data_points_used = results
            .values()
            .map(|r| r.data_points_used)
            .max()
            .unwrap_or(0);
        let notes = results
            .iter()
            .map(|(process, r)| format!("{process}: {}", r.notes))
            .collect::<Vec<_>>()
            .join("\n");

        Prediction {
            results,
            confidence,
            notes,
            data_points_used,
        }
    }

    fn predict_process(
        &self,
        request: &PredictionRequest,
        process: ProcessKind,
        pool: &[ExperimentRecord],
    ) -> PredictionResult {
        let predictor = SimilarityPredictor::new(&self.materials, &self.cfg);
        let insufficient_notes = match predictor.predict(
            pool,
            process,
            &request.material_type,
            request.material_thickness_mm,
            request.laser_power_w,
        ) {
            DataPrediction::Predicted(result) => return result,
            DataPrediction::Insufficient { notes, .. } => notes,
        };

        if let Some(model) = &self.model {
            let features = self.encoder.encode(
                &request.material_type,
                request.material_thickness_mm,
                request.laser_power_w,
                process,
            );
            match model.infer(&features) {
                Ok([power_n, speed_n, passes_n]) => {
                    let params = self
                        .encoder
                        .decode_predictions(power_n, speed_n, passes_n);
                    tracing::info!(%process, "prediction from learned model");
                    return PredictionResult {
                        params,
                        // No community data points back this answer.
                        confidence: 0.50,
                        notes: format!("{insufficient_notes} | 🤖 Öğrenilmiş model tahmini"),
                        data_points_used: 0,
                        source: PredictionSource::LearnedModel,
                    };
                }
                Err(e) => {
                    tracing::warn!(%process, error = %e, "model inference failed, falling back");
                }
            }
        }

        let params = predict_static(&request.material_type, request.material_thickness_mm, process);
        tracing::info!(%process, "prediction from static algorithm");
        PredictionResult {
            params,
            confidence: 0.50,
            notes: format!(
                "{insufficient_notes} | ⚠️ Bu tahmin temel algoritmaya dayanıyor. \
                 Daha iyi sonuçlar için topluluk verisi eklenmeli."
            ),
            data_points_used: 0,
            source: PredictionSource::StaticAlgorithm,
        }
    }
}
