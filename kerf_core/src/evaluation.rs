//! Offline evaluation metrics for the training collaborator.
//!
//! Works on the same normalized triples the model emits; metrics are
//! reported in physical units (power %, speed, passes) so the numbers stay
//! interpretable when deciding whether to deploy or roll back a fine-tune.

use crate::features::{
    EncodedBatch, TARGET_PASSES_NORM, TARGET_POWER_NORM, TARGET_SPEED_NORM,
};

/// Normalized model outputs over a batch, parallel to `EncodedBatch`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutputs {
    pub power: Vec<f32>,
    pub speed: Vec<f32>,
    pub passes: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMetrics {
    pub mae: f32,
    pub mse: f32,
    pub rmse: f32,
    /// 1 - SS_res/SS_tot; 0.0 when the truth has no variance.
    pub r2: f32,
    pub mean_error: f32,
    pub std_error: f32,
}

/// Metrics for the discrete passes head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegerMetrics {
    pub exact_accuracy: f32,
    pub accuracy_within_1: f32,
    pub accuracy_within_2: f32,
    pub mae: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationReport {
    pub n_samples: usize,
    pub power: RegressionMetrics,
    pub speed: RegressionMetrics,
    pub passes: IntegerMetrics,
    /// Mean of the three per-head MSEs in normalized units, the scalar the
    /// deploy/rollback gate compares.
    pub overall_mse: f32,
}

/// Evaluate model outputs against the batch they were predicted for.
pub fn evaluate(truth: &EncodedBatch, pred: &ModelOutputs) -> crate::error::Result<EvaluationReport> {
    let n = truth.len();
    if n == 0 {
        eyre::bail!("cannot evaluate an empty batch");
    }
    if pred.power.len() != n || pred.speed.len() != n || pred.passes.len() != n {
        eyre::bail!(
            "prediction lengths ({}, {}, {}) do not match batch length {}",
            pred.power.len(),
            pred.speed.len(),
            pred.passes.len(),
            n
        );
    }

    let denorm = |values: &[f32], scale: f32| -> Vec<f32> {
        values.iter().map(|v| v * scale).collect()
    };
    let denorm_passes = |values: &[f32]| -> Vec<f32> {
        values.iter().map(|v| (v * TARGET_PASSES_NORM).round()).collect()
    };

    let power = regression_metrics(
        &denorm(&truth.y_power, TARGET_POWER_NORM),
        &denorm(&pred.power, TARGET_POWER_NORM),
    );
    let speed = regression_metrics(
        &denorm(&truth.y_speed, TARGET_SPEED_NORM),
        &denorm(&pred.speed, TARGET_SPEED_NORM),
    );
    let passes = integer_metrics(&denorm_passes(&truth.y_passes), &denorm_passes(&pred.passes));

    let overall_mse = (mse(&truth.y_power, &pred.power)
        + mse(&truth.y_speed, &pred.speed)
        + mse(&truth.y_passes, &pred.passes))
        / 3.0;

    let report = EvaluationReport {
        n_samples: n,
        power,
        speed,
        passes,
        overall_mse,
    };
    tracing::info!(
        n,
        power_mae = report.power.mae,
        speed_mae = report.speed.mae,
        passes_within_1 = report.passes.accuracy_within_1,
        overall_mse,
        "evaluation complete"
    );
    Ok(report)
}

fn mse(y_true: &[f32], y_pred: &[f32]) -> f32 {
    let n = y_true.len() as f32;
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p) * (t - p))
        .sum::<f32>()
        / n
}

fn regression_metrics(y_true: &[f32], y_pred: &[f32]) -> RegressionMetrics {
    let n = y_true.len() as f32;
    let mae = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum::<f32>()
        / n;
    let mse = mse(y_true, y_pred);
    let rmse = mse.sqrt();

    let mean_true = y_true.iter().sum::<f32>() / n;
    let ss_res: f32 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p) * (t - p))
        .sum();
    let ss_tot: f32 = y_true.iter().map(|t| (t - mean_true) * (t - mean_true)).sum();
    let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    let mean_error = y_pred
        .iter()
        .zip(y_true)
        .map(|(p, t)| p - t)
        .sum::<f32>()
        / n;
    let var_error = y_pred
        .iter()
        .zip(y_true)
        .map(|(p, t)| {
            let e = p - t - mean_error;
            e * e
        })
        .sum::<f32>()
        / n;

    RegressionMetrics {
        mae,
        mse,
        rmse,
        r2,
        mean_error,
        std_error: var_error.sqrt(),
    }
}

fn integer_metrics(y_true: &[f32], y_pred: &[f32]) -> IntegerMetrics {
    let n = y_true.len() as f32;
    let mut exact = 0usize;
    let mut within_1 = 0usize;
    let mut within_2 = 0usize;
    let mut abs_sum = 0.0f32;
    for (t, p) in y_true.iter().zip(y_pred) {
        let d = (t - p).abs();
        if d == 0.0 {
            exact += 1;
        }
        if d <= 1.0 {
            within_1 += 1;
        }
        if d <= 2.0 {
            within_2 += 1;
        }
        abs_sum += d;
    }
    IntegerMetrics {
        exact_accuracy: exact as f32 / n,
        accuracy_within_1: within_1 as f32 / n,
        accuracy_within_2: within_2 as f32 / n,
        mae: abs_sum / n,
    }
}
