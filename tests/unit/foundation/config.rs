use super::*;

#[test]
fn defaults_match_documented_constants() {
    let cfg = StudioConfig::default();
    assert_eq!(cfg.autoframe.stride, 3);
    assert_eq!(cfg.autoframe.alpha_threshold, 8);
    assert_eq!(cfg.reveal.reveal_ms, 3800);
    assert_eq!(cfg.reveal.settle_ms, 260);
    assert!((cfg.win_chance - 0.02).abs() < f64::EPSILON);
    cfg.validate().unwrap();
}

#[test]
fn partial_json_fills_defaults() {
    let cfg: StudioConfig =
        serde_json::from_str(r#"{ "win_chance": 0.5, "reveal": { "settle_ms": 100 } }"#).unwrap();
    assert!((cfg.win_chance - 0.5).abs() < f64::EPSILON);
    assert_eq!(cfg.reveal.settle_ms, 100);
    assert_eq!(cfg.reveal.open_ms, 3600);
    assert_eq!(cfg.nose_boost, NoseBoost::default());
}

#[test]
fn validate_rejects_out_of_order_timings() {
    let mut cfg = StudioConfig::default();
    cfg.reveal.open_ms = 9000;
    assert!(cfg.validate().is_err());
}

#[test]
fn validate_rejects_out_of_range_chance() {
    let mut cfg = StudioConfig::default();
    cfg.win_chance = 1.5;
    assert!(cfg.validate().is_err());
}

#[test]
fn from_path_reads_json_file() {
    let dir = std::env::temp_dir().join(format!("bubu_config_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("studio.json");
    std::fs::write(&path, r#"{ "assets_root": "art", "win_chance": 0.25 }"#).unwrap();

    let cfg = StudioConfig::from_path(&path).unwrap();
    assert_eq!(cfg.assets_root, PathBuf::from("art"));
    assert!((cfg.win_chance - 0.25).abs() < f64::EPSILON);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn export_canvas_and_name_are_not_configurable() {
    for json in [
        r#"{ "export": { "size": 64 } }"#,
        r#"{ "export": { "file_name": "other.png" } }"#,
        r#"{ "export_size": 64 }"#,
    ] {
        assert!(serde_json::from_str::<StudioConfig>(json).is_err(), "{json}");
    }

    let dir = std::env::temp_dir().join(format!("bubu_config_export_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("studio.json");
    std::fs::write(&path, r#"{ "export": { "size": 64, "file_name": "other.png" } }"#).unwrap();
    assert!(StudioConfig::from_path(&path).is_err());
    std::fs::remove_dir_all(&dir).ok();
}
