use std::collections::BTreeMap;

use kerf_config::MaterialTable;
use kerf_core::record::{ExperimentRecord, ProcessKind, ProcessParams, Provenance};
use kerf_core::similarity::{DataPrediction, PredictionSource, SimilarityPredictor};
use kerf_core::PredictorCfg;

fn cutting_record(
    material: &str,
    thickness: f32,
    laser: f32,
    power: f32,
    speed: f32,
    passes: u32,
    quality: f32,
) -> ExperimentRecord {
    ExperimentRecord {
        id: None,
        material_type: material.to_string(),
        material_thickness: thickness,
        laser_power: laser,
        machine_brand: String::new(),
        processes: BTreeMap::from([(
            ProcessKind::Cutting,
            ProcessParams {
                power_pct: power,
                speed,
                passes,
            },
        )]),
        quality_scores: BTreeMap::from([(ProcessKind::Cutting, quality)]),
        approve_count: 0,
        reject_count: 0,
        data_source: Provenance::User,
        synthetic: false,
    }
}

/// Five qualifying cutting records, all at 20W source power, quality 8.
fn matched_pool() -> Vec<ExperimentRecord> {
    (0..5)
        .map(|_| cutting_record("ahşap", 3.0, 20.0, 60.0, 300.0, 2, 8.0))
        .collect()
}

fn predict(
    pool: &[ExperimentRecord],
    material: &str,
    thickness: f32,
    target_w: f32,
) -> DataPrediction {
    let table = MaterialTable::builtin();
    let cfg = PredictorCfg::default();
    SimilarityPredictor::new(&table, &cfg).predict(
        pool,
        ProcessKind::Cutting,
        material,
        thickness,
        target_w,
    )
}

#[test]
fn matched_pool_predicts_with_medium_confidence_and_no_rescaling() {
    let pool = matched_pool();
    let DataPrediction::Predicted(result) = predict(&pool, "ahşap", 3.0, 20.0) else {
        panic!("expected a prediction");
    };

    assert_eq!(result.data_points_used, 5);
    assert_eq!(result.source, PredictionSource::CommunityData);
    assert!(result.confidence >= 0.65, "confidence {}", result.confidence);
    assert!(result.notes.contains("ℹ️ Orta güvenilirlik"));
    assert!(result.notes.contains("5 benzer deney verisine dayanıyor"));
    assert!(result.notes.contains("Ortalama kalite: 8.0/10"));
    assert!(!result.notes.contains("Güç ölçekleme"));

    // Identical candidates: the convex combination is the common value.
    assert!((result.params.power_pct - 60.0).abs() < 0.11);
    assert!((result.params.speed - 300.0).abs() < 0.6);
    assert_eq!(result.params.passes, 2);
}

#[test]
fn weaker_target_laser_rescales_up_and_lowers_confidence() {
    let pool = matched_pool();
    let DataPrediction::Predicted(unscaled) = predict(&pool, "ahşap", 3.0, 20.0) else {
        panic!("expected a prediction");
    };
    // 5W target against a 20W pool: |Δ| = 15W exceeds the 10W tolerance.
    let DataPrediction::Predicted(scaled) = predict(&pool, "ahşap", 3.0, 5.0) else {
        panic!("expected a prediction");
    };

    assert!(
        scaled.params.power_pct > unscaled.params.power_pct,
        "weaker laser must be compensated with a higher power percentage"
    );
    assert!(scaled.params.speed < unscaled.params.speed);
    assert_eq!(scaled.params.passes, unscaled.params.passes + 1); // ratio 0.25 < 0.7
    assert!(scaled.notes.contains("Güç ölçekleme"));
    assert!(
        scaled.confidence < unscaled.confidence,
        "scaling must cost confidence: {} vs {}",
        scaled.confidence,
        unscaled.confidence
    );
}

#[test]
fn pool_below_minimum_is_insufficient_regardless_of_quality() {
    let pool: Vec<_> = matched_pool().into_iter().take(2).collect();
    match predict(&pool, "ahşap", 3.0, 20.0) {
        DataPrediction::Insufficient { available, notes } => {
            assert_eq!(available, 2);
            assert_eq!(notes, "Yetersiz veri (2 deney)");
        }
        other => panic!("expected insufficient data, got {other:?}"),
    }
}

#[test]
fn low_quality_records_do_not_qualify() {
    let pool: Vec<_> = (0..5)
        .map(|_| cutting_record("ahşap", 3.0, 20.0, 60.0, 300.0, 2, 4.0))
        .collect();
    assert!(matches!(
        predict(&pool, "ahşap", 3.0, 20.0),
        DataPrediction::Insufficient { available: 0, .. }
    ));
}

#[test]
fn records_without_the_process_do_not_qualify() {
    let mut pool = matched_pool();
    for rec in &mut pool {
        let params = rec.processes.remove(&ProcessKind::Cutting).unwrap();
        rec.processes.insert(ProcessKind::Engraving, params);
    }
    assert!(matches!(
        predict(&pool, "ahşap", 3.0, 20.0),
        DataPrediction::Insufficient { available: 0, .. }
    ));
}

#[test]
fn records_outside_the_thickness_window_do_not_qualify() {
    let pool: Vec<_> = (0..5)
        .map(|_| cutting_record("ahşap", 6.5, 20.0, 60.0, 300.0, 2, 8.0))
        .collect();
    // 6.5mm records against a 3mm request exceed the 2mm re-check window.
    assert!(matches!(
        predict(&pool, "ahşap", 3.0, 20.0),
        DataPrediction::Insufficient { available: 0, .. }
    ));
}

#[test]
fn gold_standard_records_pull_the_aggregate_and_raise_confidence() {
    let mut plain = vec![
        cutting_record("ahşap", 3.0, 20.0, 40.0, 300.0, 2, 5.0),
        cutting_record("ahşap", 3.0, 20.0, 40.0, 300.0, 2, 5.0),
        cutting_record("ahşap", 3.0, 20.0, 40.0, 300.0, 2, 5.0),
        cutting_record("ahşap", 3.0, 20.0, 80.0, 300.0, 2, 10.0),
    ];
    let DataPrediction::Predicted(all_user) = predict(&plain, "ahşap", 3.0, 20.0) else {
        panic!("expected a prediction");
    };

    plain[3].data_source = Provenance::Researcher;
    plain[3].approve_count = 10;
    let DataPrediction::Predicted(with_gold) = predict(&plain, "ahşap", 3.0, 20.0) else {
        panic!("expected a prediction");
    };

    assert!(
        with_gold.params.power_pct > all_user.params.power_pct,
        "boosted researcher record must pull the weighted power up"
    );
    assert!(with_gold.confidence > all_user.confidence);
    assert!(with_gold.notes.contains("🌟 1 gold standard veri dahil"));
}

#[test]
fn same_family_material_still_predicts_with_lower_confidence() {
    let pool = matched_pool(); // ahşap records
    let DataPrediction::Predicted(exact) = predict(&pool, "ahşap", 3.0, 20.0) else {
        panic!("expected a prediction");
    };
    // mdf is in the wood family: 0.6 material similarity instead of 1.0.
    let DataPrediction::Predicted(family) = predict(&pool, "mdf", 3.0, 20.0) else {
        panic!("expected a prediction");
    };
    assert!(family.confidence < exact.confidence);
}

#[test]
fn synthetic_researcher_copies_are_not_gold_standard() {
    let mut pool = matched_pool();
    for rec in &mut pool {
        rec.data_source = Provenance::Researcher;
        rec.synthetic = true;
    }
    let DataPrediction::Predicted(result) = predict(&pool, "ahşap", 3.0, 20.0) else {
        panic!("expected a prediction");
    };
    assert!(!result.notes.contains("gold standard"));
}

#[test]
fn outputs_are_always_inside_the_emit_ranges() {
    // Absurd stored values; the prediction must still come out clamped.
    let pool: Vec<_> = (0..5)
        .map(|_| cutting_record("ahşap", 3.0, 2.0, 100.0, 500.0, 20, 10.0))
        .collect();
    // 40W target vs 2W pool: ratio 20, massive down-scale of power.
    let DataPrediction::Predicted(result) = predict(&pool, "ahşap", 3.0, 40.0) else {
        panic!("expected a prediction");
    };
    assert!((10.0..=100.0).contains(&result.params.power_pct));
    assert!((50.0..=500.0).contains(&result.params.speed));
    assert!((1..=20).contains(&result.params.passes));
    assert!((0.55..=0.95).contains(&result.confidence));
}
