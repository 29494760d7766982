//! Training-data conditioning: outlier rejection, synthetic augmentation,
//! class balancing, and record validation.
//!
//! Everything here is a pure function of its inputs; the only randomness is
//! the caller-supplied generator, so seeded runs are reproducible. These
//! operations condition training data only; inference never sees them.

use rand::Rng;
use rand::seq::index;
use std::collections::BTreeMap;

pub use kerf_config::{BalanceMethod, OutlierMethod};

use crate::record::{
    ExperimentRecord, LASER_POWER_W, PARAM_PASSES, PARAM_POWER_PCT, PARAM_SPEED, THICKNESS_MM,
};

/// Parse a free-form outlier method tag; unknown tags degrade to IQR with a
/// warning, never an error: crowdsourced job descriptions are noisy.
pub fn parse_outlier_method(s: &str) -> OutlierMethod {
    match s.trim().to_lowercase().as_str() {
        "iqr" => OutlierMethod::Iqr,
        "zscore" | "z-score" | "z_score" => OutlierMethod::Zscore,
        other => {
            tracing::warn!(method = other, "unknown outlier method, using IQR");
            OutlierMethod::Iqr
        }
    }
}

/// Parse a free-form balance method tag; unknown tags mean "leave the data
/// unchanged", signalled as `None` with a warning.
pub fn parse_balance_method(s: &str) -> Option<BalanceMethod> {
    match s.trim().to_lowercase().as_str() {
        "oversample" => Some(BalanceMethod::Oversample),
        "undersample" => Some(BalanceMethod::Undersample),
        other => {
            tracing::warn!(method = other, "unknown balancing method, not balancing");
            None
        }
    }
}

// One numeric row per (record, process): the dimensions outlier screening
// looks at.
const FEATURE_COLS: usize = 5;
type Row = [f32; FEATURE_COLS];

fn feature_rows(record: &ExperimentRecord) -> impl Iterator<Item = Row> + '_ {
    record.processes.values().map(|params| {
        [
            record.material_thickness,
            record.laser_power,
            params.power_pct,
            params.speed,
            params.passes as f32,
        ]
    })
}

/// Partition records into (clean, outliers).
///
/// A record is an outlier iff *any* of its per-process rows is flagged in
/// any feature dimension; records with zero processes are never outliers.
/// The two partitions are disjoint and together contain every input record.
pub fn detect_outliers(
    records: Vec<ExperimentRecord>,
    method: OutlierMethod,
    threshold: f32,
) -> (Vec<ExperimentRecord>, Vec<ExperimentRecord>) {
    if records.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let rows: Vec<Row> = records.iter().flat_map(feature_rows).collect();
    if rows.is_empty() {
        // Nothing to screen on; everything passes.
        return (records, Vec::new());
    }

    let row_flags = match method {
        OutlierMethod::Iqr => flag_rows_iqr(&rows, threshold),
        OutlierMethod::Zscore => flag_rows_zscore(&rows, threshold),
    };

    let mut clean = Vec::with_capacity(records.len());
    let mut outliers = Vec::new();
    let mut idx = 0usize;
    for record in records {
        let n = record.processes.len();
        let flagged = row_flags[idx..idx + n].iter().any(|&f| f);
        idx += n;
        if flagged {
            outliers.push(record);
        } else {
            clean.push(record);
        }
    }

    tracing::info!(
        clean = clean.len(),
        outliers = outliers.len(),
        ?method,
        threshold,
        "outlier detection complete"
    );
    (clean, outliers)
}

/// IQR method: a row is flagged if any dimension falls outside
/// [Q1 - k*IQR, Q3 + k*IQR].
fn flag_rows_iqr(rows: &[Row], multiplier: f32) -> Vec<bool> {
    let mut lower = [f32::NEG_INFINITY; FEATURE_COLS];
    let mut upper = [f32::INFINITY; FEATURE_COLS];
    let mut column = Vec::with_capacity(rows.len());
    for dim in 0..FEATURE_COLS {
        column.clear();
        column.extend(rows.iter().map(|r| r[dim]));
        column.sort_unstable_by(f32::total_cmp);
        let q1 = percentile(&column, 25.0);
        let q3 = percentile(&column, 75.0);
        let iqr = q3 - q1;
        lower[dim] = q1 - multiplier * iqr;
        upper[dim] = q3 + multiplier * iqr;
    }
    rows.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .any(|(dim, &v)| v < lower[dim] || v > upper[dim])
        })
        .collect()
}

/// Z-score method: a row is flagged if any dimension has
/// |value - mean| / std > threshold. The per-dimension std is floored at 1.0
/// to avoid division blow-ups on near-constant columns.
fn flag_rows_zscore(rows: &[Row], threshold: f32) -> Vec<bool> {
    let n = rows.len() as f32;
    let mut mean = [0.0f32; FEATURE_COLS];
    for row in rows {
        for (dim, &v) in row.iter().enumerate() {
            mean[dim] += v;
        }
    }
    for m in &mut mean {
        *m /= n;
    }
    let mut std = [0.0f32; FEATURE_COLS];
    for row in rows {
        for (dim, &v) in row.iter().enumerate() {
            let d = v - mean[dim];
            std[dim] += d * d;
        }
    }
    for s in &mut std {
        *s = (*s / n).sqrt().max(1.0);
    }
    rows.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .any(|(dim, &v)| ((v - mean[dim]) / std[dim]).abs() > threshold)
        })
        .collect()
}

/// Linear-interpolated percentile over a sorted slice.
fn percentile(sorted: &[f32], p: f32) -> f32 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Returns the originals plus `factor - 1` synthetic perturbations each.
///
/// A perturbation that cannot be generated (non-finite source values) is
/// dropped rather than retried, so the result can be shorter than
/// `records.len() * factor`; callers must tolerate the shortfall.
pub fn augment_data<R: Rng>(
    records: Vec<ExperimentRecord>,
    factor: u32,
    rng: &mut R,
) -> Vec<ExperimentRecord> {
    let originals = records.len();
    let mut out = records;
    for i in 0..originals {
        for _ in 1..factor {
            let original = &out[i];
            if let Some(synthetic) = perturb(original, rng) {
                out.push(synthetic);
            }
        }
    }
    tracing::info!(
        originals,
        augmented = out.len(),
        factor,
        "augmentation complete"
    );
    out
}

/// Perturb one record into a synthetic variant.
///
/// Thickness and source wattage scale by ±10% and clamp to their domains;
/// per-process power/speed scale, clamp, and then take additive Gaussian
/// noise (σ=2% / σ=10), matching the upstream pipeline where the noise is
/// applied after the clamp.
fn perturb<R: Rng>(original: &ExperimentRecord, rng: &mut R) -> Option<ExperimentRecord> {
    if !original.material_thickness.is_finite() || !original.laser_power.is_finite() {
        tracing::warn!(
            id = original.id.as_deref().unwrap_or("?"),
            "failed to create synthetic record, dropping"
        );
        return None;
    }
    let mut synthetic = original.clone();

    let thickness_scale = rng.random_range(0.9..=1.1f32);
    synthetic.material_thickness =
        (original.material_thickness * thickness_scale).clamp(0.5, 10.0);

    let power_scale = rng.random_range(0.9..=1.1f32);
    synthetic.laser_power = (original.laser_power * power_scale).clamp(2.0, 40.0);

    for params in synthetic.processes.values_mut() {
        params.power_pct =
            (params.power_pct * rng.random_range(0.95..=1.05f32)).clamp(10.0, 100.0);
        params.speed = (params.speed * rng.random_range(0.90..=1.10f32)).clamp(50.0, 500.0);
        params.power_pct += gaussian(rng, 2.0);
        params.speed += gaussian(rng, 10.0);
    }

    synthetic.id = None;
    synthetic.synthetic = true;
    Some(synthetic)
}

/// Standard Box-Muller draw scaled to the given σ.
fn gaussian<R: Rng>(rng: &mut R, sigma: f32) -> f32 {
    let u1: f32 = rng.random::<f32>().max(f32::MIN_POSITIVE);
    let u2: f32 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos() * sigma
}

/// Equalize class sizes under `key_fn`.
///
/// `Oversample` duplicates minority-class records at random (with
/// replacement) up to the majority count; `Undersample` samples majority
/// classes down (without replacement) to the minority count.
pub fn balance_classes<R, K, F>(
    records: Vec<ExperimentRecord>,
    key_fn: F,
    method: BalanceMethod,
    rng: &mut R,
) -> Vec<ExperimentRecord>
where
    R: Rng,
    K: Ord,
    F: Fn(&ExperimentRecord) -> K,
{
    if records.is_empty() {
        return records;
    }

    let mut classes: BTreeMap<K, Vec<ExperimentRecord>> = BTreeMap::new();
    for record in records {
        classes.entry(key_fn(&record)).or_default().push(record);
    }

    let counts: Vec<usize> = classes.values().map(Vec::len).collect();
    let max_count = counts.iter().copied().max().unwrap_or(0);
    let min_count = counts.iter().copied().min().unwrap_or(0);

    let mut balanced = Vec::new();
    match method {
        BalanceMethod::Oversample => {
            for class in classes.into_values() {
                let deficit = max_count - class.len();
                for _ in 0..deficit {
                    balanced.push(class[rng.random_range(0..class.len())].clone());
                }
                balanced.extend(class);
            }
        }
        BalanceMethod::Undersample => {
            for class in classes.into_values() {
                if class.len() > min_count {
                    for i in index::sample(rng, class.len(), min_count) {
                        balanced.push(class[i].clone());
                    }
                } else {
                    balanced.extend(class);
                }
            }
        }
    }

    tracing::info!(?method, total = balanced.len(), "class balancing complete");
    balanced
}

/// Validate one record against the documented domains.
///
/// Returns every violation, not just the first, with the wire-level field
/// name and the violated bound in each message.
pub fn validate_experiment(record: &ExperimentRecord) -> (bool, Vec<String>) {
    let mut errors = Vec::new();

    if record.material_type.trim().is_empty() {
        errors.push("Missing required field: materialType".to_string());
    }
    if record.processes.is_empty() {
        errors.push("Missing required field: processes".to_string());
    }

    let power = record.laser_power;
    if !power.is_finite() || !LASER_POWER_W.contains(&power) {
        errors.push(format!(
            "laserPower out of range: {power}W (expected 2-40W)"
        ));
    }

    let thickness = record.material_thickness;
    if !thickness.is_finite() || !THICKNESS_MM.contains(&thickness) {
        errors.push(format!(
            "materialThickness out of range: {thickness}mm (expected 0.1-10mm)"
        ));
    }

    for (process, params) in &record.processes {
        if !params.power_pct.is_finite() || !PARAM_POWER_PCT.contains(&params.power_pct) {
            errors.push(format!(
                "{process} power out of range: {}% (expected 5-100%)",
                params.power_pct
            ));
        }
        if !params.speed.is_finite() || !PARAM_SPEED.contains(&params.speed) {
            errors.push(format!(
                "{process} speed out of range: {} (expected 50-500)",
                params.speed
            ));
        }
        if !PARAM_PASSES.contains(&params.passes) {
            errors.push(format!(
                "{process} passes out of range: {} (expected 1-20)",
                params.passes
            ));
        }
    }

    let is_valid = errors.is_empty();
    if !is_valid {
        tracing::warn!(?errors, "invalid experiment record");
    }
    (is_valid, errors)
}

#[cfg(test)]
mod percentile_tests {
    use super::percentile;

    #[test]
    fn interpolates_between_ranks() {
        let v = [1.0, 2.0, 3.0, 4.0];
        // rank = 0.25 * 3 = 0.75 -> 1.0 + 0.75*(2.0-1.0)
        assert!((percentile(&v, 25.0) - 1.75).abs() < 1e-6);
        assert!((percentile(&v, 75.0) - 3.25).abs() < 1e-6);
        assert_eq!(percentile(&v, 0.0), 1.0);
        assert_eq!(percentile(&v, 100.0), 4.0);
    }

    #[test]
    fn single_element_is_its_own_percentile() {
        assert_eq!(percentile(&[7.0], 25.0), 7.0);
        assert_eq!(percentile(&[7.0], 75.0), 7.0);
    }
}

#[cfg(test)]
mod gaussian_tests {
    use super::gaussian;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn draws_are_finite_and_seed_stable() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let x = gaussian(&mut a, 2.0);
            assert!(x.is_finite());
            assert_eq!(x, gaussian(&mut b, 2.0));
        }
    }
}
