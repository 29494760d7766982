use std::collections::BTreeMap;
use std::sync::Arc;

use kerf_config::MaterialTable;
use kerf_core::engine::{PredictionEngine, PredictionRequest};
use kerf_core::mocks::{ConstModel, FailingModel};
use kerf_core::record::{ExperimentRecord, ProcessKind, ProcessParams, Provenance};
use kerf_core::similarity::PredictionSource;
use kerf_core::PredictorCfg;

fn engine() -> PredictionEngine {
    PredictionEngine::new(Arc::new(MaterialTable::builtin()), PredictorCfg::default())
        .expect("valid default config")
}

fn request(processes: Vec<ProcessKind>) -> PredictionRequest {
    PredictionRequest {
        machine_brand: "Atomstack A5".to_string(),
        laser_power_w: 20.0,
        material_type: "ahşap".to_string(),
        material_thickness_mm: 3.0,
        processes,
    }
}

fn cutting_pool(n: usize) -> Vec<ExperimentRecord> {
    (0..n)
        .map(|_| ExperimentRecord {
            id: None,
            material_type: "ahşap".to_string(),
            material_thickness: 3.0,
            laser_power: 20.0,
            machine_brand: String::new(),
            processes: BTreeMap::from([(
                ProcessKind::Cutting,
                ProcessParams {
                    power_pct: 60.0,
                    speed: 300.0,
                    passes: 2,
                },
            )]),
            quality_scores: BTreeMap::from([(ProcessKind::Cutting, 8.0)]),
            approve_count: 0,
            reject_count: 0,
            data_source: Provenance::User,
            synthetic: false,
        })
        .collect()
}

#[test]
fn community_data_wins_when_the_pool_qualifies() {
    let prediction = engine().predict(&request(vec![ProcessKind::Cutting]), &cutting_pool(5));
    let result = &prediction.results[&ProcessKind::Cutting];
    assert_eq!(result.source, PredictionSource::CommunityData);
    assert_eq!(result.data_points_used, 5);
    assert_eq!(prediction.data_points_used, 5);
}

#[test]
fn learned_model_covers_an_insufficient_pool() {
    let engine = engine().with_model(Box::new(ConstModel([0.5, 0.5, 0.25])));
    let prediction = engine.predict(&request(vec![ProcessKind::Cutting]), &[]);
    let result = &prediction.results[&ProcessKind::Cutting];

    assert_eq!(result.source, PredictionSource::LearnedModel);
    assert_eq!(result.params.power_pct, 50.0);
    assert_eq!(result.params.speed, 250.0);
    assert_eq!(result.params.passes, 5);
    assert_eq!(result.confidence, 0.50);
    assert_eq!(result.data_points_used, 0);
    assert!(result.notes.contains("Yetersiz veri (0 deney)"));
    assert!(result.notes.contains("model"));
}

#[test]
fn static_algorithm_is_the_last_resort() {
    let prediction = engine().predict(&request(vec![ProcessKind::Cutting]), &[]);
    let result = &prediction.results[&ProcessKind::Cutting];

    assert_eq!(result.source, PredictionSource::StaticAlgorithm);
    assert_eq!(result.params.power_pct, 74.0); // 65 + 3*3.0
    assert_eq!(result.params.speed, 266.0); // 320 - 3*18
    assert_eq!(result.params.passes, 1);
    assert_eq!(result.confidence, 0.50);
    assert!(result.notes.contains("temel algoritmaya dayanıyor"));
}

#[test]
fn failing_model_falls_through_to_static() {
    let engine = engine().with_model(Box::new(FailingModel));
    let prediction = engine.predict(&request(vec![ProcessKind::Cutting]), &[]);
    let result = &prediction.results[&ProcessKind::Cutting];
    assert_eq!(result.source, PredictionSource::StaticAlgorithm);
}

#[test]
fn request_aggregates_across_processes() {
    // Pool only covers cutting; engraving falls back to the static formula.
    let prediction = engine().predict(
        &request(vec![ProcessKind::Cutting, ProcessKind::Engraving]),
        &cutting_pool(5),
    );

    assert_eq!(prediction.results.len(), 2);
    let cutting = &prediction.results[&ProcessKind::Cutting];
    let engraving = &prediction.results[&ProcessKind::Engraving];
    assert_eq!(cutting.source, PredictionSource::CommunityData);
    assert_eq!(engraving.source, PredictionSource::StaticAlgorithm);

    let expected = ((cutting.confidence + engraving.confidence) / 2.0 * 100.0).round() / 100.0;
    assert_eq!(prediction.confidence, expected);
    assert_eq!(prediction.data_points_used, 5);
    assert!(prediction.notes.contains("cutting:"));
    assert!(prediction.notes.contains("engraving:"));
}

#[test]
fn engraving_static_formula() {
    let mut req = request(vec![ProcessKind::Engraving]);
    req.material_thickness_mm = 4.0;
    let prediction = engine().predict(&req, &[]);
    let result = &prediction.results[&ProcessKind::Engraving];
    assert_eq!(result.params.power_pct, 48.0); // 40 + 4*2
    assert_eq!(result.params.speed, 440.0); // 500 - 4*15
    assert_eq!(result.params.passes, 1);
}

#[test]
fn scoring_static_formula() {
    let mut req = request(vec![ProcessKind::Scoring]);
    req.material_thickness_mm = 4.0;
    let prediction = engine().predict(&req, &[]);
    let result = &prediction.results[&ProcessKind::Scoring];
    assert_eq!(result.params.power_pct, 65.0); // 55 + 4*2.5
    assert_eq!(result.params.speed, 328.0); // 400 - 4*18
    assert_eq!(result.params.passes, 1);
}

#[test]
fn engine_exposes_its_encoder_and_table() {
    let engine = engine();
    assert!(!engine.materials().is_empty());
    let v = engine
        .encoder()
        .encode("ahşap", 3.0, 20.0, ProcessKind::Cutting);
    assert_eq!(&v[6..9], &[1.0, 0.0, 0.0]);
}

#[test]
fn build_rejects_invalid_config() {
    let cfg = PredictorCfg {
        min_data_points: 0,
        ..PredictorCfg::default()
    };
    let err = PredictionEngine::new(Arc::new(MaterialTable::builtin()), cfg)
        .expect_err("min_data_points=0 must be rejected");
    assert!(format!("{err}").contains("min_data_points"));
}

#[test]
fn build_rejects_empty_material_table() {
    let empty = MaterialTable::from_entries(Vec::new());
    let err = PredictionEngine::new(Arc::new(empty), PredictorCfg::default())
        .expect_err("empty table must be rejected");
    assert!(format!("{err}").contains("empty material table"));
}
