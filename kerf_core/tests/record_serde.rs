use kerf_core::record::{ExperimentRecord, ProcessKind, Provenance};

#[test]
fn deserializes_store_documents_with_camel_case_names() {
    let doc = r#"{
        "id": "exp-001",
        "materialType": "Ahşap",
        "materialThickness": 3.0,
        "laserPower": 20.0,
        "machineBrand": "Atomstack A5",
        "processes": {
            "cutting": { "power": 60.0, "speed": 300.0, "passes": 2 },
            "engraving": { "power": 35.0, "speed": 450.0, "passes": 1 }
        },
        "qualityScores": { "cutting": 8.0 },
        "approveCount": 4,
        "rejectCount": 1,
        "dataSource": "researcher_import"
    }"#;

    let rec: ExperimentRecord = serde_json::from_str(doc).expect("deserialize");
    assert_eq!(rec.id.as_deref(), Some("exp-001"));
    assert_eq!(rec.material_type, "Ahşap");
    assert_eq!(rec.processes.len(), 2);
    assert_eq!(rec.processes[&ProcessKind::Cutting].power_pct, 60.0);
    assert_eq!(rec.quality_for(ProcessKind::Cutting), 8.0);
    // Unrated process reads as the neutral 5
    assert_eq!(rec.quality_for(ProcessKind::Engraving), 5.0);
    assert_eq!(rec.data_source, Provenance::ResearcherImport);
    assert!(rec.is_gold_standard());
    assert!(!rec.synthetic);
}

#[test]
fn minimal_document_fills_defaults() {
    let doc = r#"{
        "materialType": "mdf",
        "materialThickness": 4.0,
        "laserPower": 10.0
    }"#;
    let rec: ExperimentRecord = serde_json::from_str(doc).expect("deserialize");
    assert_eq!(rec.id, None);
    assert!(rec.processes.is_empty());
    assert_eq!(rec.approve_count, 0);
    assert_eq!(rec.data_source, Provenance::User);
    assert!(!rec.is_gold_standard());
}

#[test]
fn unknown_provenance_tags_do_not_fail_the_document() {
    let doc = r#"{
        "materialType": "mdf",
        "materialThickness": 4.0,
        "laserPower": 10.0,
        "dataSource": "legacy_import_v1"
    }"#;
    let rec: ExperimentRecord = serde_json::from_str(doc).expect("deserialize");
    assert_eq!(rec.data_source, Provenance::Unknown);
    assert!(!rec.is_gold_standard());
}

#[test]
fn serializes_back_with_wire_names() {
    let doc = r#"{
        "materialType": "mdf",
        "materialThickness": 4.0,
        "laserPower": 10.0,
        "processes": { "scoring": { "power": 55.0, "speed": 400.0, "passes": 1 } }
    }"#;
    let rec: ExperimentRecord = serde_json::from_str(doc).expect("deserialize");
    let json = serde_json::to_value(&rec).expect("serialize");
    assert_eq!(json["materialType"], "mdf");
    assert_eq!(json["laserPower"], 10.0);
    assert_eq!(json["processes"]["scoring"]["power"], 55.0);
    assert_eq!(json["dataSource"], "user");
}

#[test]
fn process_kinds_round_trip_through_their_wire_names() {
    for kind in ProcessKind::ALL {
        let json = serde_json::to_string(&kind).expect("serialize");
        assert_eq!(json, format!("\"{}\"", kind.as_str()));
        let back: ProcessKind = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, kind);
    }
}

#[test]
fn round_trip_preserves_the_record() {
    let doc = r#"{
        "materialType": "deri",
        "materialThickness": 2.0,
        "laserPower": 15.0,
        "processes": { "cutting": { "power": 45.0, "speed": 380.0, "passes": 1 } },
        "qualityScores": { "cutting": 9.0 },
        "dataSource": "researcher"
    }"#;
    let rec: ExperimentRecord = serde_json::from_str(doc).expect("deserialize");
    let json = serde_json::to_string(&rec).expect("serialize");
    let back: ExperimentRecord = serde_json::from_str(&json).expect("re-deserialize");
    assert_eq!(rec, back);
}
