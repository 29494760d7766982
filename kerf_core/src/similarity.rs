//! Similarity-weighted transfer prediction over a pool of past experiments.
//!
//! Given candidate records (already pre-filtered to plausible similarity by
//! the data-store collaborator), each candidate gets a similarity score,
//! scores are softmax-normalized into convex weights, and the weighted
//! aggregate is rescaled when the pool's laser wattage does not match the
//! target machine. Pure function of its inputs plus the fixed thresholds in
//! `PredictorCfg`.

use kerf_config::MaterialTable;

use crate::PredictorCfg;
use crate::record::{
    ExperimentRecord, ProcessKind, ProcessParams, clamp_passes, clamp_power_pct, clamp_speed,
};

// Sub-score weights of the similarity kernel.
const W_MATERIAL: f32 = 0.35;
const W_THICKNESS: f32 = 0.30;
const W_POWER: f32 = 0.20;
const W_QUALITY: f32 = 0.15;

// Exponential decay lengths for the distance kernels.
const THICKNESS_DECAY_MM: f32 = 1.5;
const POWER_DECAY_W: f32 = 10.0;

// Material similarity: exact / same curated group / unrelated.
const SAME_GROUP_SIM: f32 = 0.6;
const UNRELATED_SIM: f32 = 0.3;

// Score multiplier for vetted researcher data.
const GOLD_BOOST: f32 = 1.5;

// Power rescaling exponents: a weaker laser needs a higher power
// percentage, a slower feed, and possibly an extra pass to deposit the
// same energy.
const RESCALE_POWER_EXP: f32 = 0.4;
const RESCALE_SPEED_EXP: f32 = 0.3;

/// Which stage of the escalation produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    CommunityData,
    LearnedModel,
    StaticAlgorithm,
}

/// Final per-process answer; immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub params: ProcessParams,
    /// Clamped to [0.55, 0.95] for data-backed predictions; crowdsourced
    /// measurements never justify full or near-zero confidence.
    pub confidence: f32,
    pub notes: String,
    pub data_points_used: usize,
    pub source: PredictionSource,
}

/// Outcome of a data-driven prediction attempt.
///
/// Insufficient data is a value, not an error: the caller's standard
/// recovery (static fallback) is a normal code path.
#[derive(Debug, Clone, PartialEq)]
pub enum DataPrediction {
    Predicted(PredictionResult),
    Insufficient { available: usize, notes: String },
}

#[derive(Debug, Clone, Copy)]
struct ScaleEvent {
    source_w: f32,
    target_w: f32,
    power_before: f32,
    power_after: f32,
}

struct Candidate<'p> {
    record: &'p ExperimentRecord,
    params: ProcessParams,
    quality: f32,
    /// Pre-boost combined sub-score in [0, 1]; feeds the confidence factor.
    base_score: f32,
    /// Base score after approval and gold-standard boosts; feeds softmax.
    boosted_score: f32,
}

/// Stateless predictor over a shared material table and fixed thresholds.
pub struct SimilarityPredictor<'a> {
    table: &'a MaterialTable,
    cfg: &'a PredictorCfg,
}

impl<'a> SimilarityPredictor<'a> {
    pub fn new(table: &'a MaterialTable, cfg: &'a PredictorCfg) -> Self {
        Self { table, cfg }
    }

    /// Predict parameters for one process from the candidate pool.
    pub fn predict(
        &self,
        pool: &[ExperimentRecord],
        process: ProcessKind,
        material: &str,
        thickness_mm: f32,
        target_power_w: f32,
    ) -> DataPrediction {
        let mut candidates = self.qualify(pool, process, thickness_mm);

        if candidates.len() < self.cfg.min_data_points {
            let available = candidates.len();
            tracing::debug!(
                available,
                needed = self.cfg.min_data_points,
                %process,
                "insufficient community data"
            );
            return DataPrediction::Insufficient {
                available,
                notes: format!("Yetersiz veri ({available} deney)"),
            };
        }

        let material_norm = material.trim().to_lowercase();
        let request_group = self.table.group_of(&material_norm);
        for candidate in &mut candidates {
            let base = self.base_score(
                candidate,
                &material_norm,
                request_group,
                thickness_mm,
                target_power_w,
            );
            let approve_boost =
                1.0 + (candidate.record.approve_count as f32 * 0.1).min(1.0);
            let gold = if candidate.record.is_gold_standard() {
                GOLD_BOOST
            } else {
                1.0
            };
            candidate.base_score = base;
            candidate.boosted_score = base * approve_boost * gold;
        }

        let weights = softmax(
            &candidates
                .iter()
                .map(|c| c.boosted_score)
                .collect::<Vec<_>>(),
        );

        // Convex aggregation; passes use a weighted median since pass count
        // is discrete and skew-sensitive.
        let mut power = 0.0f32;
        let mut speed = 0.0f32;
        let mut source_w = 0.0f32;
        for (candidate, &w) in candidates.iter().zip(&weights) {
            power += w * candidate.params.power_pct;
            speed += w * candidate.params.speed;
            source_w += w * candidate.record.laser_power;
        }
        let mut passes = weighted_median_passes(
            candidates
                .iter()
                .zip(&weights)
                .map(|(c, &w)| (c.params.passes, w))
                .collect(),
        );

        // Rescale when the pool's wattage does not match the target machine.
        let mut scale_event = None;
        let delta_w = target_power_w - source_w;
        if delta_w.abs() > self.cfg.power_tolerance_w && source_w > 0.0 {
            let ratio = target_power_w / source_w;
            let power_before = power;
            power /= ratio.powf(RESCALE_POWER_EXP);
            speed *= ratio.powf(RESCALE_SPEED_EXP);
            if ratio < 0.7 {
                passes += 1;
            } else if ratio > 1.3 {
                passes = passes.saturating_sub(1).max(1);
            }
            scale_event = Some(ScaleEvent {
                source_w,
                target_w: target_power_w,
                power_before,
                power_after: power,
            });
            tracing::debug!(
                source_w,
                target_w = target_power_w,
                ratio,
                "power rescaling applied"
            );
        }

        let params = ProcessParams {
            power_pct: (clamp_power_pct(power) * 10.0).round() / 10.0,
            speed: clamp_speed(speed).round(),
            passes: clamp_passes(passes as i64),
        };
        if let Some(event) = &mut scale_event {
            event.power_after = params.power_pct;
        }

        let n = candidates.len();
        let gold_count = candidates
            .iter()
            .filter(|c| c.record.is_gold_standard())
            .count();
        let mean_base =
            candidates.iter().map(|c| c.base_score).sum::<f32>() / n as f32;
        let mean_quality =
            candidates.iter().map(|c| c.quality).sum::<f32>() / n as f32;

        let confidence = confidence(n, mean_base, gold_count, delta_w, scale_event.is_some());
        let notes = notes(confidence, n, mean_quality, gold_count, scale_event);

        tracing::info!(
            %process,
            data_points = n,
            power = params.power_pct,
            speed = params.speed,
            passes = params.passes,
            confidence,
            "prediction from community data"
        );

        DataPrediction::Predicted(PredictionResult {
            params,
            confidence,
            notes,
            data_points_used: n,
            source: PredictionSource::CommunityData,
        })
    }

    /// Keep pool records that cover the process with an acceptable quality
    /// score and sit inside the thickness window the data-store collaborator
    /// was asked for (re-checked here rather than trusted).
    fn qualify<'p>(
        &self,
        pool: &'p [ExperimentRecord],
        process: ProcessKind,
        thickness_mm: f32,
    ) -> Vec<Candidate<'p>> {
        pool.iter()
            .filter_map(|record| {
                let params = *record.params_for(process)?;
                // Unrated parameter sets read as 0 here: an unknown result
                // must not qualify, even though downstream averaging treats
                // missing scores as neutral.
                let quality = record
                    .quality_scores
                    .get(&process)
                    .copied()
                    .unwrap_or(0.0);
                if quality < self.cfg.quality_threshold {
                    return None;
                }
                if (record.material_thickness - thickness_mm).abs()
                    > self.cfg.thickness_tolerance_mm
                {
                    return None;
                }
                Some(Candidate {
                    record,
                    params,
                    quality,
                    base_score: 0.0,
                    boosted_score: 0.0,
                })
            })
            .collect()
    }

    fn base_score(
        &self,
        candidate: &Candidate<'_>,
        material_norm: &str,
        request_group: Option<kerf_config::MaterialGroup>,
        thickness_mm: f32,
        target_power_w: f32,
    ) -> f32 {
        let candidate_norm = candidate.record.material_type.trim().to_lowercase();
        let material_sim = if candidate_norm == material_norm {
            1.0
        } else {
            let candidate_group = self.table.group_of(&candidate_norm);
            match (request_group, candidate_group) {
                (Some(a), Some(b)) if a == b => SAME_GROUP_SIM,
                _ => UNRELATED_SIM,
            }
        };

        let thickness_sim =
            (-(candidate.record.material_thickness - thickness_mm).abs() / THICKNESS_DECAY_MM)
                .exp();
        let power_sim =
            (-(candidate.record.laser_power - target_power_w).abs() / POWER_DECAY_W).exp();
        let quality_sim = candidate.quality / 10.0;

        W_MATERIAL * material_sim
            + W_THICKNESS * thickness_sim
            + W_POWER * power_sim
            + W_QUALITY * quality_sim
    }
}

/// Softmax with max-subtraction; weights sum to 1 for any nonempty input
/// regardless of absolute score magnitudes.
fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Sort by pass count, accumulate weight, take the first value where the
/// cumulative weight reaches half the total.
fn weighted_median_passes(mut items: Vec<(u32, f32)>) -> u32 {
    items.sort_by(|a, b| a.0.cmp(&b.0));
    let total: f32 = items.iter().map(|(_, w)| w).sum();
    let mut cumulative = 0.0f32;
    for (passes, weight) in &items {
        cumulative += weight;
        if cumulative >= total * 0.5 {
            return *passes;
        }
    }
    items.last().map_or(1, |(passes, _)| *passes)
}

/// Confidence from pool size, similarity, gold-standard share, and the
/// rescaling penalty, clamped to [0.55, 0.95] and rounded to 2 decimals.
fn confidence(
    data_points: usize,
    mean_base_score: f32,
    gold_count: usize,
    delta_w: f32,
    rescaled: bool,
) -> f32 {
    let base = match data_points {
        n if n >= 50 => 0.90,
        n if n >= 20 => 0.85,
        n if n >= 10 => 0.78,
        n if n >= 5 => 0.70,
        _ => 0.60,
    };
    let gold_ratio = gold_count as f32 / data_points as f32;
    let scale_penalty = if rescaled {
        match delta_w.abs() {
            d if d <= 15.0 => 0.95,
            d if d <= 25.0 => 0.85,
            _ => 0.75,
        }
    } else {
        1.0
    };

    let confidence = base * mean_base_score * (1.0 + 0.10 * gold_ratio) * scale_penalty;
    (confidence.clamp(0.55, 0.95) * 100.0).round() / 100.0
}

fn notes(
    confidence: f32,
    data_points: usize,
    mean_quality: f32,
    gold_count: usize,
    scale_event: Option<ScaleEvent>,
) -> String {
    let mut parts = Vec::with_capacity(5);

    parts.push(
        if confidence >= 0.80 {
            "✅ Yüksek güvenilirlik"
        } else if confidence >= 0.65 {
            "ℹ️ Orta güvenilirlik"
        } else {
            "⚠️ Düşük güvenilirlik"
        }
        .to_string(),
    );
    parts.push(format!("{data_points} benzer deney verisine dayanıyor"));
    if let Some(event) = scale_event {
        parts.push(format!(
            "⚡ Güç ölçekleme: {:.0}W → {:.0}W (güç %{:.0} → %{:.0})",
            event.source_w, event.target_w, event.power_before, event.power_after
        ));
    }
    parts.push(format!("Ortalama kalite: {mean_quality:.1}/10"));
    if gold_count > 0 {
        parts.push(format!("🌟 {gold_count} gold standard veri dahil"));
    }

    parts.join(" | ")
}
