use kerf_config::{BalanceMethod, OutlierMethod, load_toml};

#[test]
fn empty_toml_is_valid_defaults() {
    let cfg = load_toml("").expect("parse TOML");
    cfg.validate().expect("defaults must validate");
    assert_eq!(cfg.predictor.min_data_points, 3);
    assert_eq!(cfg.predictor.quality_threshold, 5.0);
    assert_eq!(cfg.predictor.power_tolerance_w, 10.0);
    assert_eq!(cfg.quality.outlier_method, OutlierMethod::Iqr);
    assert_eq!(cfg.quality.balance_method, BalanceMethod::Oversample);
    assert_eq!(cfg.quality.augmentation_factor, 2);
}

#[test]
fn accepts_full_config() {
    let toml = r#"
[predictor]
min_data_points = 5
quality_threshold = 6.0
power_tolerance_w = 15.0
thickness_tolerance_mm = 1.5

[quality]
outlier_method = "zscore"
outlier_threshold = 2.5
augmentation_factor = 3
balance_method = "undersample"

[logging]
level = "debug"

[materials]
table_csv = "materials.csv"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("should validate");
    assert_eq!(cfg.quality.outlier_method, OutlierMethod::Zscore);
    assert_eq!(cfg.quality.balance_method, BalanceMethod::Undersample);
    assert_eq!(cfg.materials.table_csv.as_deref(), Some("materials.csv"));
}

#[test]
fn rejects_zero_min_data_points() {
    let cfg = load_toml("[predictor]\nmin_data_points = 0\n").expect("parse TOML");
    let err = cfg.validate().expect_err("should reject min_data_points=0");
    assert!(format!("{err}").contains("min_data_points must be >= 1"));
}

#[test]
fn rejects_out_of_range_quality_threshold() {
    let cfg = load_toml("[predictor]\nquality_threshold = 11.0\n").expect("parse TOML");
    let err = cfg.validate().expect_err("should reject quality_threshold=11");
    assert!(format!("{err}").contains("quality_threshold"));
}

#[test]
fn rejects_zero_power_tolerance() {
    let cfg = load_toml("[predictor]\npower_tolerance_w = 0.0\n").expect("parse TOML");
    let err = cfg.validate().expect_err("should reject power_tolerance_w=0");
    assert!(format!("{err}").contains("power_tolerance_w must be > 0"));
}

#[test]
fn rejects_zero_augmentation_factor() {
    let cfg = load_toml("[quality]\naugmentation_factor = 0\n").expect("parse TOML");
    let err = cfg
        .validate()
        .expect_err("should reject augmentation_factor=0");
    assert!(format!("{err}").contains("augmentation_factor must be >= 1"));
}

#[test]
fn rejects_unknown_outlier_method_at_parse() {
    let err = load_toml("[quality]\noutlier_method = \"mahalanobis\"\n")
        .expect_err("unknown enum variant must fail to parse");
    let msg = format!("{err}").to_lowercase();
    assert!(msg.contains("unknown variant") || msg.contains("mahalanobis"));
}

#[test]
fn rejects_huge_thickness_tolerance() {
    let cfg = load_toml("[predictor]\nthickness_tolerance_mm = 50.0\n").expect("parse TOML");
    let err = cfg.validate().expect_err("should reject 50mm tolerance");
    assert!(format!("{err}").contains("thickness_tolerance_mm"));
}
